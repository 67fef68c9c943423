//! Field and section definitions.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::host::FileDialogOptions;
use crate::parameters::ParameterMap;
use crate::validation::FieldStateDelta;

/// The kind of input a field renders as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    /// Single-line text input.
    #[default]
    Textbox,
    /// Numeric input.
    Number,
    /// Masked text input.
    Password,
    /// Multi-line text input.
    Textarea,
    /// Boolean checkbox.
    Checkbox,
    /// One-of-many radio group.
    Radio,
    /// Drop-down list.
    Select,
    /// Multiple-choice list.
    Multiselect,
    /// Text input with suggestions.
    Combo,
    /// Path input with a browse button.
    FilePicker,
}

impl FieldType {
    /// Whether the field draws its choices from an option list.
    pub fn has_options(self) -> bool {
        matches!(
            self,
            Self::Radio | Self::Select | Self::Multiselect | Self::Combo
        )
    }
}

/// Transient enabled/visible state of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDefinitionState {
    /// Whether the input accepts edits.
    pub enabled: bool,
    /// Whether the field is drawn at all.
    pub visible: bool,
}

impl Default for FieldDefinitionState {
    fn default() -> Self {
        Self {
            enabled: true,
            visible: true,
        }
    }
}

impl FieldDefinitionState {
    /// Apply a delta, returning whether any flag changed.
    pub fn apply(&mut self, delta: &FieldStateDelta) -> bool {
        let before = *self;
        if let Some(enabled) = delta.enabled {
            self.enabled = enabled;
        }
        if let Some(visible) = delta.visible {
            self.visible = visible;
        }
        before != *self
    }
}

/// One choice of a radio, select or combo field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OptionSpec")]
pub struct FieldOption {
    /// Displayed text.
    pub label: String,
    /// Submitted value.
    pub value: String,
}

impl FieldOption {
    /// An option with distinct label and value.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// An option whose label is its value.
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OptionSpec {
    Plain(String),
    Pair { label: String, value: String },
}

impl From<OptionSpec> for FieldOption {
    fn from(spec: OptionSpec) -> Self {
        match spec {
            OptionSpec::Plain(value) => FieldOption::plain(value),
            OptionSpec::Pair { label, value } => FieldOption { label, value },
        }
    }
}

/// Computes a field's options from the current values.
#[derive(Clone)]
pub struct OptionProvider(Arc<dyn Fn(&ParameterMap) -> Vec<FieldOption> + Send + Sync>);

impl OptionProvider {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ParameterMap) -> Vec<FieldOption> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Compute options.
    pub fn options(&self, data: &ParameterMap) -> Vec<FieldOption> {
        (self.0)(data)
    }
}

impl fmt::Debug for OptionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OptionProvider")
    }
}

/// Free-form rendering hints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldProperties {
    /// Textarea rows.
    pub rows: Option<u32>,
    /// Textarea columns.
    pub columns: Option<u32>,
    /// Options for the file-picker's dialog.
    pub dialog_options: Option<FileDialogOptions>,
}

/// A single input on a page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Unique within the page; also the parameter key and DOM id.
    pub id: String,
    /// Input kind.
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Label text.
    #[serde(default)]
    pub label: String,
    /// Hint shown under the input.
    #[serde(default)]
    pub description: Option<String>,
    /// Placeholder text.
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Value used when the caller supplies none.
    #[serde(default)]
    pub initial_value: Option<Value>,
    /// Enabled/visible state when the page is built.
    #[serde(default)]
    pub initial_state: FieldDefinitionState,
    /// Static choices.
    #[serde(default)]
    pub options: Vec<FieldOption>,
    /// Dynamic choices; overrides `options`.
    #[serde(skip)]
    pub option_provider: Option<OptionProvider>,
    /// Script run by the client instead of the default change handler.
    #[serde(default)]
    pub on_change: Option<String>,
    /// Whether the field takes focus when its page is shown.
    #[serde(default)]
    pub focus: bool,
    /// Rendering hints.
    #[serde(default)]
    pub properties: FieldProperties,
}

impl FieldDefinition {
    /// Create a field.
    pub fn new(id: impl Into<String>, field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field_type,
            label: label.into(),
            description: None,
            placeholder: None,
            initial_value: None,
            initial_state: FieldDefinitionState::default(),
            options: Vec::new(),
            option_provider: None,
            on_change: None,
            focus: false,
            properties: FieldProperties::default(),
        }
    }

    /// Shorthand for a textbox.
    pub fn textbox(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, FieldType::Textbox, label)
    }

    /// Set the hint text.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the placeholder.
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Set the initial value.
    pub fn with_initial_value(mut self, value: impl Into<Value>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    /// Set the initial enabled/visible state.
    pub fn with_initial_state(mut self, state: FieldDefinitionState) -> Self {
        self.initial_state = state;
        self
    }

    /// Start disabled.
    pub fn disabled(mut self) -> Self {
        self.initial_state.enabled = false;
        self
    }

    /// Start hidden.
    pub fn hidden(mut self) -> Self {
        self.initial_state.visible = false;
        self
    }

    /// Set static options.
    pub fn with_options<I, O>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<FieldOption>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Compute options from the current values.
    pub fn with_option_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn(&ParameterMap) -> Vec<FieldOption> + Send + Sync + 'static,
    {
        self.option_provider = Some(OptionProvider::new(provider));
        self
    }

    /// Override the client change handler.
    pub fn with_on_change(mut self, script: impl Into<String>) -> Self {
        self.on_change = Some(script.into());
        self
    }

    /// Take focus when the page is shown.
    pub fn with_focus(mut self) -> Self {
        self.focus = true;
        self
    }

    /// Set textarea dimensions.
    pub fn with_size(mut self, rows: u32, columns: u32) -> Self {
        self.properties.rows = Some(rows);
        self.properties.columns = Some(columns);
        self
    }

    /// Set file-picker dialog options.
    pub fn with_dialog_options(mut self, options: FileDialogOptions) -> Self {
        self.properties.dialog_options = Some(options);
        self
    }

    /// The options to show for the given values.
    pub fn resolve_options(&self, data: &ParameterMap) -> Vec<FieldOption> {
        match &self.option_provider {
            Some(provider) => provider.options(data),
            None => self.options.clone(),
        }
    }
}

impl From<&str> for FieldOption {
    fn from(value: &str) -> Self {
        FieldOption::plain(value)
    }
}

impl From<String> for FieldOption {
    fn from(value: String) -> Self {
        FieldOption::plain(value)
    }
}

impl<L: Into<String>, V: Into<String>> From<(L, V)> for FieldOption {
    fn from((label, value): (L, V)) -> Self {
        FieldOption::new(label, value)
    }
}

/// A collapsible group of fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDefinition {
    /// Section id.
    pub id: String,
    /// Heading text.
    #[serde(default)]
    pub label: String,
    /// Text under the heading.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the section starts collapsed.
    #[serde(default)]
    pub collapsed: bool,
    /// The grouped fields.
    pub child_fields: Vec<FieldDefinition>,
}

impl SectionDefinition {
    /// Create an empty section.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            collapsed: false,
            child_fields: Vec::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Start collapsed.
    pub fn collapsed(mut self) -> Self {
        self.collapsed = true;
        self
    }

    /// Append a field.
    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.child_fields.push(field);
        self
    }
}

/// An entry of a page's item list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PageItem {
    /// A group of fields. Tried first: only sections carry `childFields`.
    Section(SectionDefinition),
    /// A single field.
    Field(FieldDefinition),
}

impl PageItem {
    /// The fields this item contributes, in order.
    pub fn fields(&self) -> &[FieldDefinition] {
        match self {
            Self::Field(field) => std::slice::from_ref(field),
            Self::Section(section) => &section.child_fields,
        }
    }
}

impl From<FieldDefinition> for PageItem {
    fn from(field: FieldDefinition) -> Self {
        Self::Field(field)
    }
}

impl From<SectionDefinition> for PageItem {
    fn from(section: SectionDefinition) -> Self {
        Self::Section(section)
    }
}
