//! Validator responses and the validation engine.
//!
//! A page may carry a synchronous validator, an asynchronous validator, or
//! both. Each returns [`ValidatorResponse`]s: severity-tagged messages aimed
//! at field message slots, plus optional [`FieldStateDelta`]s that enable,
//! disable, show or hide fields.
//!
//! Only [`Severity::Error`] makes a page incomplete. Lower severities are
//! displayed but never block navigation.
//!
//! # Example
//!
//! ```
//! use webview_wizard::validation::{Severity, ValidatorResponse};
//!
//! let response = ValidatorResponse::new()
//!     .with_item(Severity::Warn, "username", "Fred is a common name")
//!     .with_item(Severity::Error, "favcolor", "Please pick a color");
//! assert!(response.has_error());
//! ```

mod engine;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::parameters::ParameterMap;

pub use engine::{
    field_slot_id, placeholder_fragments, validation_slot_id, PassOutput, ValidationPass,
    FIELD_SLOT_SUFFIX, PLACEHOLDER, VALIDATION_SLOT_SUFFIX,
};

/// Message severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Plain message without an icon.
    Other,
    /// Informational message.
    Info,
    /// Warning; does not block navigation.
    Warn,
    /// Error; marks the page incomplete.
    Error,
}

impl Severity {
    /// CSS class of the message container.
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Error => "error-message",
            Self::Warn => "warn-message",
            Self::Info | Self::Other => "info-message",
        }
    }

    /// CSS class of the message icon, if the severity has one.
    pub fn icon_class(self) -> Option<&'static str> {
        match self {
            Self::Error => Some("icon__error"),
            Self::Warn => Some("icon__warn"),
            Self::Info => Some("icon__info"),
            Self::Other => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Other => "OTHER",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// One message aimed at a field's message slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorResponseItem {
    /// Severity of the message.
    pub severity: Severity,
    /// Target field id, or the message slot id itself.
    #[serde(rename = "template")]
    pub target: String,
    /// Message HTML.
    pub content: String,
}

impl ValidatorResponseItem {
    /// Create an item.
    pub fn new(severity: Severity, target: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            severity,
            target: target.into(),
            content: content.into(),
        }
    }

    /// The DOM id of the slot this item is shown in.
    pub fn slot_id(&self) -> String {
        validation_slot_id(&self.target)
    }
}

/// A requested change to a field's enabled/visible state.
///
/// Flags left as `None` keep their cached value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldStateDelta {
    /// New enabled flag.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// New visible flag.
    #[serde(default)]
    pub visible: Option<bool>,
    /// Re-render the field even if nothing changed.
    #[serde(default)]
    pub force_refresh: bool,
}

impl FieldStateDelta {
    /// A delta that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the enabled flag.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Set the visible flag.
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    /// Force a re-render.
    pub fn force_refresh(mut self) -> Self {
        self.force_refresh = true;
        self
    }
}

/// The result of running one validator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorResponse {
    /// Messages, emitted in order.
    #[serde(default)]
    pub items: Vec<ValidatorResponseItem>,
    /// Field state changes keyed by field id.
    #[serde(default)]
    pub field_refresh: BTreeMap<String, FieldStateDelta>,
}

impl ValidatorResponse {
    /// An empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message.
    pub fn with_item(
        mut self,
        severity: Severity,
        target: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.items
            .push(ValidatorResponseItem::new(severity, target, content));
        self
    }

    /// Request a field state change.
    pub fn with_refresh(mut self, field: impl Into<String>, delta: FieldStateDelta) -> Self {
        self.field_refresh.insert(field.into(), delta);
        self
    }

    /// Append a message in place.
    pub fn push(&mut self, item: ValidatorResponseItem) {
        self.items.push(item);
    }

    /// Whether any item is an error.
    pub fn has_error(&self) -> bool {
        self.items.iter().any(|item| item.severity == Severity::Error)
    }

    /// The most severe item, if any.
    pub fn max_severity(&self) -> Option<Severity> {
        self.items.iter().map(|item| item.severity).max()
    }

    /// Whether the response carries neither messages nor refreshes.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.field_refresh.is_empty()
    }
}

/// What a validator sees: the current snapshot and the one from the
/// previous round.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Field values of this round.
    pub parameters: &'a ParameterMap,
    /// Field values of the previous round.
    pub previous: &'a ParameterMap,
}

impl<'a> ValidationContext<'a> {
    /// Create a context.
    pub fn new(parameters: &'a ParameterMap, previous: &'a ParameterMap) -> Self {
        Self {
            parameters,
            previous,
        }
    }

    /// Whether `field` changed since the previous round.
    pub fn changed(&self, field: &str) -> bool {
        self.parameters.differs(self.previous, field)
    }
}

/// A future resolving to one asynchronous validator response.
pub type ValidationFuture = BoxFuture<'static, ValidatorResponse>;

/// A synchronous page validator.
#[derive(Clone)]
pub struct SyncValidator(Arc<dyn Fn(&ValidationContext<'_>) -> ValidatorResponse + Send + Sync>);

impl SyncValidator {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ValidationContext<'_>) -> ValidatorResponse + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Run the validator.
    pub fn validate(&self, ctx: &ValidationContext<'_>) -> ValidatorResponse {
        (self.0)(ctx)
    }
}

impl fmt::Debug for SyncValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SyncValidator")
    }
}

/// An asynchronous page validator.
///
/// Called once per round; returns any number of futures, each resolving to
/// its own response. Futures must own what they need.
#[derive(Clone)]
pub struct AsyncValidator(
    Arc<dyn Fn(&ValidationContext<'_>) -> Vec<ValidationFuture> + Send + Sync>,
);

impl AsyncValidator {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ValidationContext<'_>) -> Vec<ValidationFuture> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Start the validator's futures.
    pub fn start(&self, ctx: &ValidationContext<'_>) -> Vec<ValidationFuture> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for AsyncValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AsyncValidator")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Other < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn test_severity_classes() {
        assert_eq!(Severity::Error.css_class(), "error-message");
        assert_eq!(Severity::Error.icon_class(), Some("icon__error"));
        assert_eq!(Severity::Warn.css_class(), "warn-message");
        assert_eq!(Severity::Warn.icon_class(), Some("icon__warn"));
        assert_eq!(Severity::Info.css_class(), "info-message");
        assert_eq!(Severity::Info.icon_class(), Some("icon__info"));
        assert_eq!(Severity::Other.css_class(), "info-message");
        assert_eq!(Severity::Other.icon_class(), None);
    }

    #[test]
    fn test_only_error_counts() {
        let warn_only = ValidatorResponse::new()
            .with_item(Severity::Warn, "a", "w")
            .with_item(Severity::Info, "b", "i");
        assert!(!warn_only.has_error());
        assert_eq!(warn_only.max_severity(), Some(Severity::Warn));

        let with_error = warn_only.with_item(Severity::Error, "c", "e");
        assert!(with_error.has_error());
    }

    #[test]
    fn test_slot_id_suffix() {
        let item = ValidatorResponseItem::new(Severity::Info, "username", "hi");
        assert_eq!(item.slot_id(), "usernameValidation");

        let item = ValidatorResponseItem::new(Severity::Info, "usernameValidation", "hi");
        assert_eq!(item.slot_id(), "usernameValidation");
    }

    #[test]
    fn test_response_deserializes() {
        let response: ValidatorResponse = serde_json::from_value(json!({
            "items": [{"severity": "ERROR", "template": "age", "content": "Too young"}],
            "fieldRefresh": {"actualAge": {"enabled": false}}
        }))
        .unwrap();

        assert!(response.has_error());
        assert_eq!(
            response.field_refresh["actualAge"],
            FieldStateDelta::new().enabled(false)
        );
    }

    #[test]
    fn test_context_changed() {
        let previous = ParameterMap::new().with("age", "17");
        let current = ParameterMap::new().with("age", "18").with("name", "x");
        let ctx = ValidationContext::new(&current, &previous);
        assert!(ctx.changed("age"));
        assert!(ctx.changed("name"));
        assert!(!ctx.changed("missing"));
    }
}
