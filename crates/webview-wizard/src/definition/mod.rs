//! The declarative wizard schema.
//!
//! A [`WizardDefinition`] is built either in code with builder methods or
//! loaded from JSON/TOML. Loaded definitions carry no behavior; validators,
//! option providers, the workflow manager and a custom renderer are attached
//! afterwards in code.
//!
//! ```
//! use webview_wizard::definition::WizardDefinition;
//!
//! let json = r#"{
//!     "title": "New Project",
//!     "pages": [
//!         {"id": "page1", "title": "Name", "fields": [
//!             {"id": "name", "type": "textbox", "label": "Project name"}
//!         ]}
//!     ]
//! }"#;
//! let definition = WizardDefinition::from_json_str(json).unwrap();
//! assert_eq!(definition.pages[0].id, "page1");
//! ```

mod field;
mod page;

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use webview_wizard_core::logging::targets;
use webview_wizard_core::DefinitionError;

pub use field::{
    FieldDefinition, FieldDefinitionState, FieldOption, FieldProperties, FieldType,
    OptionProvider, PageItem, SectionDefinition,
};
pub use page::PageDefinition;

use crate::parameters::ParameterMap;
use crate::render::Renderer;
use crate::validation::{ValidationContext, ValidationFuture, ValidatorResponse};
use crate::workflow::WorkflowManager;

/// Label and visibility of one navigation button.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonSpec {
    /// Custom label; the standard one when `None`.
    pub label: Option<String>,
    /// Leave the button out of the button bar.
    pub hidden: bool,
}

impl ButtonSpec {
    /// The label to show, falling back to `default`.
    pub fn label_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.label.as_deref().unwrap_or(default)
    }
}

/// Customization of the Back/Next/Finish bar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonLayout {
    /// The Back button.
    pub back: ButtonSpec,
    /// The Next button.
    pub next: ButtonSpec,
    /// The Finish button.
    pub finish: ButtonSpec,
}

impl ButtonLayout {
    /// Relabel the Finish button.
    pub fn with_finish_label(mut self, label: impl Into<String>) -> Self {
        self.finish.label = Some(label.into());
        self
    }

    /// Hide Back and Next, for single-page forms.
    pub fn finish_only(mut self) -> Self {
        self.back.hidden = true;
        self.next.hidden = true;
        self
    }
}

/// A complete wizard: chrome, pages and optional behavior.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardDefinition {
    /// Wizard and panel title.
    pub title: String,
    /// Text under the wizard title.
    #[serde(default)]
    pub description: Option<String>,
    /// URI of a banner image.
    #[serde(default)]
    pub banner: Option<String>,
    /// Suppress the wizard-level header.
    #[serde(default)]
    pub hide_wizard_header: bool,
    /// Pages in linear order.
    #[serde(default)]
    pub pages: Vec<PageDefinition>,
    /// Button customization.
    #[serde(default)]
    pub buttons: ButtonLayout,
    /// Prefix the panel title with `* ` once the user edits something.
    #[serde(default)]
    pub show_dirty_state: bool,
    /// Navigation and finish behavior.
    #[serde(skip)]
    pub workflow_manager: Option<Arc<dyn WorkflowManager>>,
    /// Replaces the standard renderer.
    #[serde(skip)]
    pub renderer: Option<Arc<dyn Renderer>>,
}

impl fmt::Debug for WizardDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WizardDefinition")
            .field("title", &self.title)
            .field("description", &self.description)
            .field("banner", &self.banner)
            .field("hide_wizard_header", &self.hide_wizard_header)
            .field("pages", &self.pages)
            .field("buttons", &self.buttons)
            .field("show_dirty_state", &self.show_dirty_state)
            .field("workflow_manager", &self.workflow_manager.is_some())
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}

impl WizardDefinition {
    /// Create a definition with no pages.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            banner: None,
            hide_wizard_header: false,
            pages: Vec::new(),
            buttons: ButtonLayout::default(),
            show_dirty_state: false,
            workflow_manager: None,
            renderer: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the banner image.
    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = Some(banner.into());
        self
    }

    /// Hide the wizard-level header.
    pub fn hide_wizard_header(mut self) -> Self {
        self.hide_wizard_header = true;
        self
    }

    /// Append a page.
    pub fn with_page(mut self, page: PageDefinition) -> Self {
        self.pages.push(page);
        self
    }

    /// Set the button layout.
    pub fn with_buttons(mut self, buttons: ButtonLayout) -> Self {
        self.buttons = buttons;
        self
    }

    /// Track unsaved edits in the panel title.
    pub fn with_dirty_state(mut self) -> Self {
        self.show_dirty_state = true;
        self
    }

    /// Attach a workflow manager.
    pub fn with_workflow_manager(mut self, manager: impl WorkflowManager + 'static) -> Self {
        self.workflow_manager = Some(Arc::new(manager));
        self
    }

    /// Attach a custom renderer.
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Look up a page by id.
    pub fn page(&self, id: &str) -> Option<&PageDefinition> {
        self.pages.iter().find(|page| page.id == id)
    }

    /// Look up a page by id for modification.
    pub fn page_mut(&mut self, id: &str) -> Option<&mut PageDefinition> {
        self.pages.iter_mut().find(|page| page.id == id)
    }

    /// Attach a synchronous validator to a loaded page.
    pub fn set_validator<F>(&mut self, page_id: &str, validator: F) -> Result<(), DefinitionError>
    where
        F: Fn(&ValidationContext<'_>) -> ValidatorResponse + Send + Sync + 'static,
    {
        let page = self
            .page_mut(page_id)
            .ok_or_else(|| DefinitionError::UnknownPage(page_id.to_string()))?;
        page.validator = Some(crate::validation::SyncValidator::new(validator));
        Ok(())
    }

    /// Attach an asynchronous validator to a loaded page.
    pub fn set_async_validator<F>(
        &mut self,
        page_id: &str,
        validator: F,
    ) -> Result<(), DefinitionError>
    where
        F: Fn(&ValidationContext<'_>) -> Vec<ValidationFuture> + Send + Sync + 'static,
    {
        let page = self
            .page_mut(page_id)
            .ok_or_else(|| DefinitionError::UnknownPage(page_id.to_string()))?;
        page.async_validator = Some(crate::validation::AsyncValidator::new(validator));
        Ok(())
    }

    /// Union of every field's initial value, overlaid by `data`.
    pub fn initial_data(&self, data: &ParameterMap) -> ParameterMap {
        let mut initial: ParameterMap = self
            .pages
            .iter()
            .flat_map(PageDefinition::fields)
            .filter_map(|field| {
                field
                    .initial_value
                    .clone()
                    .map(|value| (field.id.clone(), value))
            })
            .collect();
        initial.overlay(data);
        initial
    }

    /// Check id uniqueness and non-emptiness.
    pub fn check(&self) -> Result<(), DefinitionError> {
        if self.pages.is_empty() {
            return Err(DefinitionError::NoPages(self.title.clone()));
        }

        let mut page_ids = HashSet::new();
        for page in &self.pages {
            if page.id.is_empty() {
                return Err(DefinitionError::EmptyId {
                    kind: "page",
                    page: page.title.clone().unwrap_or_default(),
                });
            }
            if !page_ids.insert(page.id.as_str()) {
                return Err(DefinitionError::DuplicatePage(page.id.clone()));
            }

            let mut field_ids = HashSet::new();
            for field in page.fields() {
                if field.id.is_empty() {
                    return Err(DefinitionError::EmptyId {
                        kind: "field",
                        page: page.id.clone(),
                    });
                }
                if !field_ids.insert(field.id.as_str()) {
                    return Err(DefinitionError::DuplicateField {
                        page: page.id.clone(),
                        field: field.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Parse and check a JSON definition.
    pub fn from_json_str(text: &str) -> Result<Self, DefinitionError> {
        let definition: Self =
            serde_json::from_str(text).map_err(|e| DefinitionError::parse("JSON", e.to_string()))?;
        definition.check()?;
        Ok(definition)
    }

    /// Parse and check a TOML definition.
    pub fn from_toml_str(text: &str) -> Result<Self, DefinitionError> {
        let definition: Self =
            toml::from_str(text).map_err(|e| DefinitionError::parse("TOML", e.to_string()))?;
        definition.check()?;
        Ok(definition)
    }

    /// Load a definition file, choosing the format by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DefinitionError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let text = std::fs::read_to_string(path).map_err(|e| DefinitionError::io(path, e))?;
        tracing::debug!(target: targets::DEFINITION, path = %path.display(), "loading wizard definition");

        match extension.as_str() {
            "json" => Self::from_json_str(&text),
            "toml" => Self::from_toml_str(&text),
            other => Err(DefinitionError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn two_pages() -> WizardDefinition {
        WizardDefinition::new("Test")
            .with_page(
                PageDefinition::new("page1")
                    .with_field(FieldDefinition::textbox("name", "Name").with_initial_value("anon")),
            )
            .with_page(
                PageDefinition::new("page2").with_field(
                    FieldDefinition::new("agree", FieldType::Checkbox, "Agree")
                        .with_initial_value(false),
                ),
            )
    }

    #[test]
    fn test_check_accepts_valid() {
        assert!(two_pages().check().is_ok());
    }

    #[test]
    fn test_check_rejects_duplicates() {
        let dup_page = two_pages().with_page(PageDefinition::new("page1"));
        assert!(matches!(
            dup_page.check(),
            Err(DefinitionError::DuplicatePage(id)) if id == "page1"
        ));

        let dup_field = WizardDefinition::new("T").with_page(
            PageDefinition::new("p")
                .with_field(FieldDefinition::textbox("a", "A"))
                .with_section(
                    SectionDefinition::new("s", "S").with_field(FieldDefinition::textbox("a", "A")),
                ),
        );
        assert!(matches!(
            dup_field.check(),
            Err(DefinitionError::DuplicateField { field, .. }) if field == "a"
        ));
    }

    #[test]
    fn test_check_rejects_empty() {
        assert!(matches!(
            WizardDefinition::new("Empty").check(),
            Err(DefinitionError::NoPages(_))
        ));
        let empty_field = WizardDefinition::new("T")
            .with_page(PageDefinition::new("p").with_field(FieldDefinition::textbox("", "A")));
        assert!(matches!(
            empty_field.check(),
            Err(DefinitionError::EmptyId { kind: "field", .. })
        ));
    }

    #[test]
    fn test_initial_data_overlay() {
        let caller = ParameterMap::new().with("name", "Fred").with("extra", 1);
        let data = two_pages().initial_data(&caller);
        assert_eq!(data.text("name"), "Fred");
        assert_eq!(data.get("agree"), Some(&json!(false)));
        assert_eq!(data.get("extra"), Some(&json!(1)));
    }

    #[test]
    fn test_set_validator_unknown_page() {
        let mut definition = two_pages();
        assert!(definition.set_validator("page1", |_| ValidatorResponse::new()).is_ok());
        assert!(definition.pages[0].validator.is_some());
        assert!(matches!(
            definition.set_validator("nope", |_| ValidatorResponse::new()),
            Err(DefinitionError::UnknownPage(_))
        ));
    }

    #[test]
    fn test_from_toml() {
        let text = r#"
            title = "Deploy"
            showDirtyState = true

            [buttons.finish]
            label = "Deploy"

            [[pages]]
            id = "target"
            title = "Target"

            [[pages.fields]]
            id = "region"
            type = "select"
            label = "Region"
            options = ["eu", "us"]
        "#;
        let definition = WizardDefinition::from_toml_str(text).unwrap();
        assert!(definition.show_dirty_state);
        assert_eq!(definition.buttons.finish.label_or("Finish"), "Deploy");
        assert_eq!(definition.buttons.next.label_or("Next"), "Next");
        let field = definition.pages[0].field("region").unwrap();
        assert_eq!(field.field_type, FieldType::Select);
        assert_eq!(field.options.len(), 2);
    }

    #[test]
    fn test_parse_error() {
        let err = WizardDefinition::from_json_str("{\"title\": 3}").unwrap_err();
        assert!(matches!(err, DefinitionError::Parse { format: "JSON", .. }));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("wizard.json");
        let mut file = std::fs::File::create(&json_path).unwrap();
        write!(
            file,
            "{}",
            json!({"title": "T", "pages": [{"id": "p", "fields": []}]})
        )
        .unwrap();
        assert_eq!(WizardDefinition::load(&json_path).unwrap().title, "T");

        let yaml_path = dir.path().join("wizard.yaml");
        std::fs::write(&yaml_path, "title: T").unwrap();
        assert!(matches!(
            WizardDefinition::load(&yaml_path),
            Err(DefinitionError::UnsupportedFormat(ext)) if ext == "yaml"
        ));

        assert!(matches!(
            WizardDefinition::load(dir.path().join("missing.json")),
            Err(DefinitionError::Io { .. })
        ));
    }
}
