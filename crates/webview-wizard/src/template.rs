//! Finish templates and `{{name}}` interpolation.
//!
//! A template is either inline content or a path (`contentUrl`) resolved
//! against the session's resource root. Its text is interpolated against the
//! finish response's return object:
//!
//! - `{{path.to.value}}` inserts the value HTML-escaped,
//! - `{{{path.to.value}}}` inserts it verbatim.
//!
//! Missing paths insert nothing. No other template syntax is supported.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use webview_wizard_core::{Result, WizardError};

use crate::parameters::value_text;
use crate::render::html::escape;
use crate::response::Fragment;

static PLACEHOLDER_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\{\{\{\s*([\w.\-]+)\s*\}\}\}|\{\{\s*([\w.\-]+)\s*\}\}").ok()
});

/// A fragment produced after finishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Target element id, or `UPDATE_TITLE`.
    pub id: String,
    /// Inline template text.
    #[serde(default)]
    pub content: Option<String>,
    /// Template file, relative to the resource root.
    #[serde(default)]
    pub content_url: Option<PathBuf>,
}

impl Template {
    /// A template with inline content.
    pub fn inline(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: Some(content.into()),
            content_url: None,
        }
    }

    /// A template loaded from a file.
    pub fn from_file(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            content: None,
            content_url: Some(path.into()),
        }
    }

    /// Load (if needed) and interpolate into a fragment.
    ///
    /// Inline content wins over `contentUrl`. A template with neither yields
    /// an empty body.
    pub fn render(&self, context: &Value, resource_root: Option<&Path>) -> Result<Fragment> {
        let text = match (&self.content, &self.content_url) {
            (Some(content), _) => content.clone(),
            (None, Some(url)) => {
                let path = match resource_root {
                    Some(root) => root.join(url),
                    None => url.clone(),
                };
                std::fs::read_to_string(&path)
                    .map_err(|e| WizardError::template(&self.id, path, e))?
            }
            (None, None) => String::new(),
        };
        Ok(Fragment::new(self.id.clone(), interpolate(&text, context)))
    }
}

/// Replace `{{path}}` and `{{{path}}}` placeholders with values from `context`.
pub fn interpolate(text: &str, context: &Value) -> String {
    let Some(re) = PLACEHOLDER_RE.as_ref() else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &Captures<'_>| {
        if let Some(raw) = caps.get(1) {
            lookup(context, raw.as_str()).map(value_text).unwrap_or_default()
        } else if let Some(escaped) = caps.get(2) {
            lookup(context, escaped.as_str())
                .map(|value| escape(&value_text(value)))
                .unwrap_or_default()
        } else {
            String::new()
        }
    })
    .into_owned()
}

fn lookup<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    if path == "this" {
        return Some(context);
    }
    path.split('.').try_fold(context, |value, key| match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}
