//! Page definitions.

use serde::Deserialize;

use super::field::{FieldDefinition, PageItem, SectionDefinition};
use crate::validation::{
    AsyncValidator, SyncValidator, ValidationContext, ValidationFuture, ValidatorResponse,
};

/// One page of a wizard.
///
/// # Example
///
/// ```
/// use webview_wizard::definition::{FieldDefinition, PageDefinition};
/// use webview_wizard::validation::{Severity, ValidatorResponse};
///
/// let page = PageDefinition::new("page1")
///     .with_title("Account")
///     .with_field(FieldDefinition::textbox("username", "User name"))
///     .with_validator(|ctx| {
///         let mut response = ValidatorResponse::new();
///         if ctx.parameters.text("username").is_empty() {
///             response = response.with_item(Severity::Error, "username", "Required");
///         }
///         response
///     });
/// assert_eq!(page.fields().count(), 1);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDefinition {
    /// Unique page id.
    pub id: String,
    /// Page heading.
    #[serde(default)]
    pub title: Option<String>,
    /// Text under the heading.
    #[serde(default)]
    pub description: Option<String>,
    /// Suppress the heading and description.
    #[serde(default)]
    pub hide_header: bool,
    /// Fields and sections, in display order.
    #[serde(default)]
    pub fields: Vec<PageItem>,
    /// Runs on every round, before any asynchronous validation.
    #[serde(skip)]
    pub validator: Option<SyncValidator>,
    /// Starts asynchronous checks on every round.
    #[serde(skip)]
    pub async_validator: Option<AsyncValidator>,
}

impl PageDefinition {
    /// Create an empty page.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
            hide_header: false,
            fields: Vec::new(),
            validator: None,
            async_validator: None,
        }
    }

    /// Set the heading.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Hide heading and description.
    pub fn hide_header(mut self) -> Self {
        self.hide_header = true;
        self
    }

    /// Append a field.
    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(PageItem::Field(field));
        self
    }

    /// Append a section.
    pub fn with_section(mut self, section: SectionDefinition) -> Self {
        self.fields.push(PageItem::Section(section));
        self
    }

    /// Set the synchronous validator.
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&ValidationContext<'_>) -> ValidatorResponse + Send + Sync + 'static,
    {
        self.validator = Some(SyncValidator::new(validator));
        self
    }

    /// Set the asynchronous validator.
    pub fn with_async_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&ValidationContext<'_>) -> Vec<ValidationFuture> + Send + Sync + 'static,
    {
        self.async_validator = Some(AsyncValidator::new(validator));
        self
    }

    /// Every field on the page, sections flattened, in display order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().flat_map(PageItem::fields)
    }

    /// Look up a field by id.
    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields().find(|field| field.id == id)
    }

    /// The field that takes focus: the flagged one, else the first.
    pub fn focused_field(&self) -> Option<&FieldDefinition> {
        self.fields()
            .find(|field| field.focus)
            .or_else(|| self.fields().next())
    }

    /// Whether the page has any validator.
    pub fn has_validator(&self) -> bool {
        self.validator.is_some() || self.async_validator.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::FieldType;

    fn page() -> PageDefinition {
        PageDefinition::new("settings")
            .with_field(FieldDefinition::textbox("name", "Name"))
            .with_section(
                SectionDefinition::new("advanced", "Advanced")
                    .with_field(FieldDefinition::new("verbose", FieldType::Checkbox, "Verbose"))
                    .with_field(FieldDefinition::new("level", FieldType::Number, "Level")),
            )
    }

    #[test]
    fn test_fields_flatten_sections() {
        let ids: Vec<_> = page().fields().map(|f| f.id.clone()).collect();
        assert_eq!(ids, vec!["name", "verbose", "level"]);
        assert!(page().field("level").is_some());
        assert!(page().field("advanced").is_none());
    }

    #[test]
    fn test_focus_defaults_to_first_field() {
        assert_eq!(page().focused_field().unwrap().id, "name");

        let focused = PageDefinition::new("p")
            .with_field(FieldDefinition::textbox("a", "A"))
            .with_field(FieldDefinition::textbox("b", "B").with_focus());
        assert_eq!(focused.focused_field().unwrap().id, "b");

        assert!(PageDefinition::new("empty").focused_field().is_none());
    }

    #[test]
    fn test_has_validator() {
        assert!(!page().has_validator());
        assert!(page().with_validator(|_| ValidatorResponse::new()).has_validator());
        assert!(page().with_async_validator(|_| Vec::new()).has_validator());
    }
}
