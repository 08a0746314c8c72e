//! Prompt text for the analysis and generation stages
//!
//! Audience persona bodies are compiled in from `prompts/*.md`; swap those files to
//! retarget the personas.

use crate::model::{AnalysisResult, Audience, MediaKind};

const KIDS_PERSONA: &str = include_str!("../prompts/kids.md");
const MG_PERSONA: &str = include_str!("../prompts/mg.md");

const VIDEO_ANALYSIS_PROMPT: &str = r#"
You are a media content analyst for IRIS English, an English centre in Da Nang whose core philosophy is HANDS-ON PRACTICE: learners acquire English through real, active, effective experience.

This video belongs to IRIS English. Perform two actions:
1. Transcribe all spoken audio in the video. If there is no speech, write "No speech.". Pay attention to tone and to keywords about learning, education and especially the HANDS-ON PRACTICE approach.
2. Write a concise 3-5 sentence summary describing the main topic, the learning activities, how knowledge is delivered, the overall tone (energetic, friendly, professional), emphasising the HANDS-ON PRACTICE philosophy.

Return a single valid JSON object with exactly two keys: "transcript" and "description". Do not include any other text or markdown.
"#;

const IMAGE_ANALYSIS_PROMPT: &str = r#"
You are an image analyst for IRIS English, an English centre in Da Nang whose core philosophy is HANDS-ON PRACTICE: learners acquire English through real, active, effective experience.

This image relates to IRIS English, for example a learning activity, a course promotion or a learner experience. Perform two actions:
1. Describe the image in 3-5 sentences: main subject, setting, colours, overall mood, teaching style, emphasising the HANDS-ON PRACTICE philosophy.
2. Extract all visible text from the image. If there is none, write "No text.".

Return a single valid JSON object with exactly two keys: "description" and "textInImage". Do not include any other text or markdown.
"#;

pub fn analysis_prompt(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Video => VIDEO_ANALYSIS_PROMPT,
        MediaKind::Image => IMAGE_ANALYSIS_PROMPT,
    }
}

pub fn persona(audience: Audience) -> &'static str {
    match audience {
        Audience::Kids => KIDS_PERSONA,
        Audience::Mg => MG_PERSONA,
    }
}

/// Analysis context block shared by every generation prompt
pub fn analysis_context(analysis: &AnalysisResult) -> String {
    let mut context = format!(
        "Here is the summary and analysis of a media file:\n- File type: {}\n- Description: {}\n",
        analysis.kind().as_str(),
        analysis.description()
    );
    match analysis {
        AnalysisResult::Video { transcript, .. } => {
            context.push_str(&format!("- Transcript: {}\n", transcript));
        }
        AnalysisResult::Image { text_in_image, .. } => {
            context.push_str(&format!("- Text in image: {}\n", text_in_image));
        }
    }
    context
}

/// Full generation prompt; this exact text is what gets recorded as `prompt_sent`
pub fn content_prompt(analysis: &AnalysisResult, audience: Audience, instruction: &str) -> String {
    let feedback_block = if instruction.trim().is_empty() {
        String::new()
    } else {
        format!(
            "\nIMPORTANT: Below is the user's feedback and rating on the previous version of the content. Analyse it carefully and use it to produce a new, improved version:\n---\n{}\n---\n",
            instruction
        )
    };

    format!(
        "Based on the following media analysis:\n\n{}\n\n{}Carry out the following task:\n\n{}\n\nImportant: return only a single valid JSON object following the specified schema. Do not add any text, notes or markdown outside the JSON object.",
        analysis_context(analysis),
        feedback_block,
        persona(audience).trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> AnalysisResult {
        AnalysisResult::Image {
            description: "Children painting letters".to_string(),
            text_in_image: "ABC".to_string(),
        }
    }

    #[test]
    fn test_analysis_prompt_names_schema_keys() {
        assert!(analysis_prompt(MediaKind::Video).contains("\"transcript\""));
        assert!(analysis_prompt(MediaKind::Image).contains("\"textInImage\""));
    }

    #[test]
    fn test_content_prompt_embeds_analysis() {
        let prompt = content_prompt(&image(), Audience::Kids, "");
        assert!(prompt.contains("Children painting letters"));
        assert!(prompt.contains("Text in image: ABC"));
        assert!(prompt.contains(KIDS_PERSONA.trim()));
        assert!(!prompt.contains("IMPORTANT: Below is the user's feedback"));
    }

    #[test]
    fn test_content_prompt_includes_feedback_block() {
        let prompt = content_prompt(&image(), Audience::Mg, "The user rated the previous version 3/10.");
        assert!(prompt.contains("---\nThe user rated the previous version 3/10.\n---"));
        assert!(prompt.contains(MG_PERSONA.trim()));
    }

    #[test]
    fn test_video_context_has_transcript() {
        let video = AnalysisResult::Video {
            transcript: "Hello class".to_string(),
            description: "A lesson".to_string(),
        };
        let context = analysis_context(&video);
        assert!(context.contains("File type: video"));
        assert!(context.contains("Transcript: Hello class"));
    }

    #[test]
    fn test_personas_differ() {
        assert_ne!(persona(Audience::Kids), persona(Audience::Mg));
    }
}
