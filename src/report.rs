//! Developer-mode report
//!
//! Plain-text dump of every item: file facts, the analysis JSON (or status/error) and, per
//! audience, the prompt sent, the result JSON, the saved rating and any error.

use crate::model::{Audience, SlotStatus, SlotView};
use crate::store::ItemView;
use std::fmt::Write;

pub fn render(items: &[ItemView]) -> String {
    if items.is_empty() {
        return "Developer Mode\nNo files have been uploaded yet.\n".to_string();
    }

    let mut out = String::from("Developer Mode\n==============\n");
    for item in items {
        render_item(&mut out, item);
    }
    out
}

fn render_item(out: &mut String, item: &ItemView) {
    let _ = writeln!(out, "\n{} [{}]", item.name, item.id);
    let _ = writeln!(
        out,
        "  {} {} - {:.2} MB",
        item.kind.as_str(),
        item.mime_type,
        item.size as f64 / 1024.0 / 1024.0
    );
    let _ = writeln!(out, "  Preview: {}", item.preview);

    let _ = writeln!(out, "  Initial analysis:");
    match (&item.result, &item.error) {
        (Some(result), _) => {
            let json = serde_json::to_string_pretty(result).unwrap_or_default();
            push_indented(out, &json, 4);
        }
        (None, Some(error)) => {
            let _ = writeln!(out, "    Error: {}", error);
        }
        (None, None) => {
            let _ = writeln!(out, "    Status: {:?}", item.status);
        }
    }

    for audience in Audience::ALL {
        let slot = match audience {
            Audience::Kids => &item.content.kids,
            Audience::Mg => &item.content.mg,
        };
        render_slot(out, audience, slot);
    }
}

fn render_slot(out: &mut String, audience: Audience, slot: &SlotView) {
    if slot.status == SlotStatus::Idle {
        return;
    }

    let _ = writeln!(out, "  Content ({}): {:?}", audience, slot.status);
    if let Some(prompt) = &slot.prompt_sent {
        let _ = writeln!(out, "    Prompt sent:");
        push_indented(out, prompt, 6);
    }
    if let Some(result) = &slot.result {
        let _ = writeln!(out, "    Result JSON:");
        let json = serde_json::to_string_pretty(result).unwrap_or_default();
        push_indented(out, &json, 6);
    }
    if let Some(rating) = slot.rating {
        let _ = writeln!(out, "    Rating: {}/10", rating);
    }
    if let Some(text) = &slot.feedback_text {
        let _ = writeln!(out, "    Feedback: \"{}\"", text);
    }
    if let Some(error) = &slot.error {
        let _ = writeln!(out, "    Error: {}", error);
    }
}

fn push_indented(out: &mut String, text: &str, indent: usize) {
    for line in text.lines() {
        let _ = writeln!(out, "{:indent$}{}", "", line, indent = indent);
    }
}
