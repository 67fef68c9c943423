//! Small HTML building helpers shared by renderers.

use std::fmt::Write;

use super::ButtonState;
use crate::definition::{ButtonLayout, ButtonSpec, WizardDefinition};
use crate::validation::ValidatorResponseItem;

/// Escape text for use in element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// ` name="value"` with the value escaped.
pub fn attr(name: &str, value: &str) -> String {
    format!(" {name}=\"{}\"", escape(value))
}

/// A bare boolean attribute when `on`.
pub fn flag_attr(name: &str, on: bool) -> String {
    if on { format!(" {name}") } else { String::new() }
}

/// Markup for one validation message.
pub fn validation_message(item: &ValidatorResponseItem) -> String {
    let mut out = format!("<div class=\"{}\">", item.severity.css_class());
    if let Some(icon) = item.severity.icon_class() {
        let _ = write!(out, "<span class=\"icon {icon}\"></span>");
    }
    out.push_str(&item.content);
    out.push_str("</div>");
    out
}

fn button(out: &mut String, id: &str, onclick: &str, spec: &ButtonSpec, default: &str, enabled: bool) {
    if spec.hidden {
        return;
    }
    let _ = write!(
        out,
        "<button type=\"button\" class=\"btn btn-secondary\" id=\"{id}\" onclick=\"{onclick}\"{}>{}</button>",
        flag_attr("disabled", !enabled),
        escape(spec.label_or(default)),
    );
}

/// The Back/Next/Finish bar.
pub fn controls(layout: &ButtonLayout, state: ButtonState) -> String {
    let mut out = String::from("<div class=\"wizard-controls\">");
    button(&mut out, "back", "backPressed()", &layout.back, "Back", state.back);
    button(&mut out, "next", "nextPressed()", &layout.next, "Next", state.next);
    button(&mut out, "finish", "finishPressed()", &layout.finish, "Finish", state.finish);
    out.push_str("</div>");
    out
}

/// The wizard-level header: title, description and banner.
pub fn header(definition: &WizardDefinition) -> String {
    if definition.hide_wizard_header {
        return String::new();
    }
    let mut out = String::from("<header class=\"wizard-header\">");
    if let Some(banner) = &definition.banner {
        let _ = write!(out, "<img class=\"wizard-banner\"{} alt=\"\"/>", attr("src", banner));
    }
    let _ = write!(out, "<h1>{}</h1>", escape(&definition.title));
    if let Some(description) = &definition.description {
        let _ = write!(out, "<p>{}</p>", escape(description));
    }
    out.push_str("</header>");
    out
}
