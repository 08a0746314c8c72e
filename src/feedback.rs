//! Feedback composition
//!
//! Folds a prior rating, the critique saved with it and a new free-text request into the
//! single instruction passed to the content generator.

use crate::model::{ContentSlot, Rating};

/// Compose the regeneration instruction. An empty string means "no feedback".
pub fn compose(prior_rating: Option<Rating>, prior_feedback: Option<&str>, new_request: &str) -> String {
    let mut text = String::new();

    if let Some(rating) = prior_rating {
        text.push_str(&format!("The user rated the previous version {}/10. ", rating));
        if let Some(critique) = prior_feedback.filter(|c| !c.trim().is_empty()) {
            text.push_str(&format!("Their feedback was: \"{}\".\n", critique));
        }
    }

    let request = new_request.trim();
    if !request.is_empty() {
        text.push_str(&format!("Now they ask for this further improvement: \"{}\"", request));
    } else if !text.is_empty() {
        text.push_str("Please produce another version based on that rating.");
    }

    text.trim().to_string()
}

/// Compose from whatever rating and critique are saved on the slot
pub fn compose_for_slot(slot: &ContentSlot, new_request: &str) -> String {
    compose(slot.rating, slot.feedback_text.as_deref(), new_request)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(n: u8) -> Option<Rating> {
        Some(Rating::new(n).unwrap())
    }

    #[test]
    fn test_no_feedback_is_empty() {
        assert_eq!(compose(None, None, ""), "");
        assert_eq!(compose(None, None, "   "), "");
    }

    #[test]
    fn test_rating_only_asks_for_another_version() {
        let text = compose(rating(8), None, "");
        assert!(!text.is_empty());
        assert!(text.contains("8/10"));
        assert!(text.contains("another version"));
    }

    #[test]
    fn test_rating_and_critique_verbatim() {
        let text = compose(rating(3), Some("too long"), "");
        assert!(text.contains("3/10"));
        assert!(text.contains("\"too long\""));
        assert!(text.ends_with("another version based on that rating."));
    }

    #[test]
    fn test_new_request_replaces_generic_instruction() {
        let text = compose(rating(6), Some("bland"), "  add a call to action  ");
        assert!(text.contains("6/10"));
        assert!(text.contains("bland"));
        assert!(text.contains("\"add a call to action\""));
        assert!(!text.contains("another version"));
    }

    #[test]
    fn test_new_request_without_rating() {
        let text = compose(None, None, "use more emoji");
        assert_eq!(text, "Now they ask for this further improvement: \"use more emoji\"");
    }

    #[test]
    fn test_critique_without_rating_is_ignored() {
        assert_eq!(compose(None, Some("orphan critique"), ""), "");
    }

    #[test]
    fn test_compose_for_slot_reads_saved_feedback() {
        let slot = ContentSlot {
            rating: rating(4),
            feedback_text: Some("needs a hook".to_string()),
            ..ContentSlot::default()
        };
        let text = compose_for_slot(&slot, "");
        assert!(text.contains("4/10"));
        assert!(text.contains("needs a hook"));
    }
}
