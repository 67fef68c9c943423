use std::fmt::Write;

use serde_json::Value;

use super::html::{attr, escape, flag_attr};
use super::Renderer;
use crate::definition::{
    FieldDefinition, FieldDefinitionState, FieldType, PageDefinition, PageItem, SectionDefinition,
};
use crate::page::FieldStateCache;
use crate::parameters::{value_flag, value_text, ParameterMap};
use crate::validation::{field_slot_id, validation_slot_id, PLACEHOLDER};

/// The built-in renderer.
///
/// Emits the `setting` / `setting__input` / `setting__hint` markup the
/// bundled stylesheet expects. Values, labels and descriptions are
/// HTML-escaped.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardRenderer;

impl StandardRenderer {
    /// Create the renderer.
    pub fn new() -> Self {
        Self
    }

    fn field_slot(&self, field: &FieldDefinition, data: &ParameterMap, states: &FieldStateCache) -> String {
        format!(
            "<div class=\"setting\"{}>{}</div>",
            attr("id", &field_slot_id(&field.id)),
            self.field(field, data, states.get(&field.id)),
        )
    }

    fn section(&self, section: &SectionDefinition, data: &ParameterMap, states: &FieldStateCache) -> String {
        let mut out = format!(
            "<section{} class=\"section--settings section--collapsible{}\">",
            attr("id", &section.id),
            if section.collapsed { " collapsed" } else { "" },
        );
        let _ = write!(
            out,
            "<div class=\"section__header\" onclick=\"document.getElementById('{}').classList.toggle('collapsed');\"><h2>{}</h2>",
            escape(&section.id),
            escape(&section.label),
        );
        if let Some(description) = &section.description {
            let _ = write!(out, "<p class=\"section__header-hint\">{}</p>", escape(description));
        }
        out.push_str("</div><div class=\"section__collapsible\"><div class=\"section__content\">");
        for field in &section.child_fields {
            out.push_str(&self.field_slot(field, data, states));
        }
        out.push_str("</div></div></section>");
        out
    }

    fn handler(field: &FieldDefinition, default: String) -> String {
        field.on_change.clone().unwrap_or(default)
    }

    fn label(field: &FieldDefinition) -> String {
        format!("<label{}>{}</label>", attr("for", &field.id), escape(&field.label))
    }

    fn wrap(field: &FieldDefinition, input: &str, label_after: bool) -> String {
        let label = Self::label(field);
        let (first, second) = if label_after {
            (input, label.as_str())
        } else {
            (label.as_str(), input)
        };
        format!(
            "<div class=\"setting__input\">{first}{second}<div class=\"validation\"{}>{PLACEHOLDER}</div></div><p class=\"setting__hint\">{}</p>",
            attr("id", &validation_slot_id(&field.id)),
            field.description.as_deref().map(escape).unwrap_or_default(),
        )
    }

    fn input(field: &FieldDefinition, data: &ParameterMap, state: FieldDefinitionState, input_type: &str) -> String {
        let value = current_value(field, data).map(|v| value_text(&v)).unwrap_or_default();
        let mut input = format!("<input type=\"{input_type}\"{}{}", attr("id", &field.id), attr("name", &field.id));
        if !value.is_empty() {
            input.push_str(&attr("value", &value));
        }
        if field.initial_value.is_none()
            && let Some(placeholder) = &field.placeholder
        {
            input.push_str(&attr("placeholder", placeholder));
        }
        input.push_str(&flag_attr("disabled", !state.enabled));
        let handler = Self::handler(field, format!("fieldChanged('{}')", field.id));
        input.push_str(&attr("oninput", &handler));
        input.push_str(" data-setting>");
        input
    }

    fn textarea(field: &FieldDefinition, data: &ParameterMap, state: FieldDefinitionState) -> String {
        let value = current_value(field, data).map(|v| value_text(&v)).unwrap_or_default();
        let mut out = format!("<textarea{}{}", attr("id", &field.id), attr("name", &field.id));
        if let Some(rows) = field.properties.rows {
            let _ = write!(out, " rows=\"{rows}\"");
        }
        if let Some(columns) = field.properties.columns {
            let _ = write!(out, " cols=\"{columns}\"");
        }
        if field.initial_value.is_none()
            && let Some(placeholder) = &field.placeholder
        {
            out.push_str(&attr("placeholder", placeholder));
        }
        out.push_str(&flag_attr("disabled", !state.enabled));
        let handler = Self::handler(field, format!("fieldChanged('{}')", field.id));
        let _ = write!(out, "{} data-setting>{}</textarea>", attr("oninput", &handler), escape(&value));
        out
    }

    fn checkbox(field: &FieldDefinition, data: &ParameterMap, state: FieldDefinitionState) -> String {
        let checked = current_value(field, data).is_some_and(|v| value_flag(&v));
        let handler = Self::handler(field, format!("fieldChangedWithVal('{}', this.checked)", field.id));
        format!(
            "<input type=\"checkbox\"{}{}{}{}{} data-setting>",
            attr("id", &field.id),
            attr("name", &field.id),
            flag_attr("checked", checked),
            flag_attr("disabled", !state.enabled),
            attr("oninput", &handler),
        )
    }

    fn radio(field: &FieldDefinition, data: &ParameterMap, state: FieldDefinitionState) -> String {
        let value = current_value(field, data).map(|v| value_text(&v)).unwrap_or_default();
        let mut out = String::from("<div class=\"select-container\">");
        for (index, option) in field.resolve_options(data).iter().enumerate() {
            let option_id = format!("{}_{index}", field.id);
            let handler = Self::handler(
                field,
                format!("fieldChangedWithVal('{}', '{}')", field.id, option.value),
            );
            let _ = write!(
                out,
                "<input type=\"radio\"{}{}{}{}{}{}><label{}>{}</label>",
                attr("id", &option_id),
                attr("name", &field.id),
                attr("value", &option.value),
                flag_attr("checked", option.value == value),
                flag_attr("disabled", !state.enabled),
                attr("oninput", &handler),
                attr("for", &option_id),
                escape(&option.label),
            );
        }
        out.push_str("</div>");
        out
    }

    fn select(field: &FieldDefinition, data: &ParameterMap, state: FieldDefinitionState, multiple: bool) -> String {
        let current = current_value(field, data);
        let is_selected = |candidate: &str| match &current {
            Some(Value::Array(items)) => items.iter().any(|item| value_text(item) == candidate),
            Some(other) => value_text(other) == candidate,
            None => false,
        };
        let default_handler = if multiple {
            format!(
                "fieldChangedWithVal('{}', Array.from(this.selectedOptions, o => o.value))",
                field.id
            )
        } else {
            format!("fieldChanged('{}')", field.id)
        };
        let handler = Self::handler(field, default_handler);

        let mut out = format!(
            "<div class=\"select-container\"><select{}{}{}{}{} data-setting>",
            attr("id", &field.id),
            attr("name", &field.id),
            flag_attr("multiple", multiple),
            flag_attr("disabled", !state.enabled),
            attr("oninput", &handler),
        );
        for option in field.resolve_options(data) {
            let _ = write!(
                out,
                "<option{}{}>{}</option>",
                attr("value", &option.value),
                flag_attr("selected", is_selected(&option.value)),
                escape(&option.label),
            );
        }
        out.push_str("</select></div>");
        out
    }

    fn combo(field: &FieldDefinition, data: &ParameterMap, state: FieldDefinitionState) -> String {
        let options = field.resolve_options(data);
        let mut input = Self::input(field, data, state, "text");
        if options.is_empty() {
            return input;
        }
        let list_id = format!("{}InternalList", field.id);
        // Attach the datalist to the input.
        input = input.replacen("<input", &format!("<input{}", attr("list", &list_id)), 1);
        let _ = write!(input, "<datalist{}>", attr("id", &list_id));
        for option in options {
            let _ = write!(input, "<option{}>{}</option>", attr("value", &option.value), escape(&option.label));
        }
        input.push_str("</datalist>");
        input
    }

    fn file_picker(field: &FieldDefinition, data: &ParameterMap, state: FieldDefinitionState) -> String {
        let mut out = Self::input(field, data, state, "text");
        let options = field
            .properties
            .dialog_options
            .as_ref()
            .and_then(|options| serde_json::to_string(options).ok())
            .unwrap_or_else(|| "{}".to_string());
        let _ = write!(
            out,
            "<button type=\"button\" class=\"btn btn-secondary\"{}{}>Browse...</button>",
            attr("onclick", &format!("openFileDialog('{}', {options})", field.id)),
            flag_attr("disabled", !state.enabled),
        );
        out
    }
}

/// The caller's value for a field, else its initial value.
fn current_value(field: &FieldDefinition, data: &ParameterMap) -> Option<Value> {
    match data.get(&field.id) {
        Some(Value::Null) | None => field.initial_value.clone(),
        Some(value) => Some(value.clone()),
    }
}

impl Renderer for StandardRenderer {
    fn page_content(&self, page: &PageDefinition, data: &ParameterMap, states: &FieldStateCache) -> String {
        let _span = webview_wizard_core::PerfSpan::new(webview_wizard_core::logging::span_names::RENDER);
        let mut out = String::new();
        for item in &page.fields {
            match item {
                PageItem::Field(field) => out.push_str(&self.field_slot(field, data, states)),
                PageItem::Section(section) => out.push_str(&self.section(section, data, states)),
            }
        }
        out
    }

    fn field(&self, field: &FieldDefinition, data: &ParameterMap, state: FieldDefinitionState) -> String {
        if !state.visible {
            return String::new();
        }
        match field.field_type {
            FieldType::Textbox => Self::wrap(field, &Self::input(field, data, state, "text"), false),
            FieldType::Number => Self::wrap(field, &Self::input(field, data, state, "number"), false),
            FieldType::Password => Self::wrap(field, &Self::input(field, data, state, "password"), false),
            FieldType::Textarea => Self::wrap(field, &Self::textarea(field, data, state), false),
            FieldType::Checkbox => Self::wrap(field, &Self::checkbox(field, data, state), true),
            FieldType::Radio => Self::wrap(field, &Self::radio(field, data, state), false),
            FieldType::Select => Self::wrap(field, &Self::select(field, data, state, false), false),
            FieldType::Multiselect => Self::wrap(field, &Self::select(field, data, state, true), false),
            FieldType::Combo => Self::wrap(field, &Self::combo(field, data, state), false),
            FieldType::FilePicker => Self::wrap(field, &Self::file_picker(field, data, state), false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::FieldOption;
    use crate::host::FileDialogOptions;
    use serde_json::json;

    fn render(field: FieldDefinition, data: &ParameterMap) -> String {
        StandardRenderer.field(&field, data, field.initial_state)
    }

    #[test]
    fn test_textbox_value_and_slots() {
        let data = ParameterMap::new().with("name", "<Fred>");
        let html = render(FieldDefinition::textbox("name", "Name").with_description("Your name"), &data);

        assert!(html.contains("type=\"text\" id=\"name\" name=\"name\" value=\"&lt;Fred&gt;\""));
        assert!(html.contains("oninput=\"fieldChanged(&#39;name&#39;)\""));
        assert!(html.contains("id=\"nameValidation\">&nbsp;</div>"));
        assert!(html.contains("<p class=\"setting__hint\">Your name</p>"));
        assert!(!html.contains(" disabled"));
    }

    #[test]
    fn test_initial_value_and_placeholder() {
        let html = render(
            FieldDefinition::textbox("a", "A").with_placeholder("type here"),
            &ParameterMap::new(),
        );
        assert!(html.contains("placeholder=\"type here\""));

        let html = render(
            FieldDefinition::textbox("a", "A")
                .with_placeholder("type here")
                .with_initial_value("x"),
            &ParameterMap::new(),
        );
        assert!(html.contains("value=\"x\""));
        assert!(!html.contains("placeholder"));
    }

    #[test]
    fn test_disabled_and_hidden() {
        let html = render(FieldDefinition::textbox("a", "A").disabled(), &ParameterMap::new());
        assert!(html.contains(" disabled"));

        let html = render(FieldDefinition::textbox("a", "A").hidden(), &ParameterMap::new());
        assert!(html.is_empty());
    }

    #[test]
    fn test_checkbox() {
        let data = ParameterMap::new().with("agree", true);
        let html = render(FieldDefinition::new("agree", FieldType::Checkbox, "Agree"), &data);
        assert!(html.contains(" checked"));
        assert!(html.contains("fieldChangedWithVal(&#39;agree&#39;, this.checked)"));
        // Label follows the box.
        assert!(html.find("<input").unwrap() < html.find("<label").unwrap());
    }

    #[test]
    fn test_radio_and_select() {
        let data = ParameterMap::new().with("size", "m");
        let radio = render(
            FieldDefinition::new("size", FieldType::Radio, "Size").with_options([
                ("Small", "s"),
                ("Medium", "m"),
            ]),
            &data,
        );
        assert!(radio.contains("id=\"size_1\" name=\"size\" value=\"m\" checked"));
        assert!(!radio.contains("value=\"s\" checked"));

        let select = render(
            FieldDefinition::new("size", FieldType::Select, "Size").with_options(["s", "m"]),
            &data,
        );
        assert!(select.contains("<option value=\"m\" selected>m</option>"));
        assert!(select.contains("<option value=\"s\">s</option>"));
    }

    #[test]
    fn test_multiselect() {
        let data = ParameterMap::new().with("tags", json!(["a", "c"]));
        let html = render(
            FieldDefinition::new("tags", FieldType::Multiselect, "Tags").with_options(["a", "b", "c"]),
            &data,
        );
        assert!(html.contains(" multiple"));
        assert!(html.contains("<option value=\"a\" selected>"));
        assert!(html.contains("<option value=\"b\">"));
        assert!(html.contains("<option value=\"c\" selected>"));
    }

    #[test]
    fn test_combo_with_provider() {
        let field = FieldDefinition::new("city", FieldType::Combo, "City").with_option_provider(|data| {
            vec![FieldOption::plain(format!("{} City", data.text("country")))]
        });
        let html = render(field, &ParameterMap::new().with("country", "Kansas"));
        assert!(html.contains("list=\"cityInternalList\""));
        assert!(html.contains("<datalist id=\"cityInternalList\"><option value=\"Kansas City\">"));

        let plain = render(FieldDefinition::new("city", FieldType::Combo, "City"), &ParameterMap::new());
        assert!(!plain.contains("datalist"));
    }

    #[test]
    fn test_textarea_size() {
        let html = render(
            FieldDefinition::new("notes", FieldType::Textarea, "Notes").with_size(4, 40),
            &ParameterMap::new().with("notes", "a & b"),
        );
        assert!(html.contains(" rows=\"4\" cols=\"40\""));
        assert!(html.contains(">a &amp; b</textarea>"));
    }

    #[test]
    fn test_file_picker_button() {
        let options = FileDialogOptions {
            can_select_folders: Some(true),
            ..Default::default()
        };
        let html = render(
            FieldDefinition::new("dir", FieldType::FilePicker, "Folder").with_dialog_options(options),
            &ParameterMap::new(),
        );
        assert!(html.contains("openFileDialog(&#39;dir&#39;, {&quot;"));
        assert!(html.contains("canSelectFolders&quot;:true"));
    }

    #[test]
    fn test_custom_on_change() {
        let html = render(
            FieldDefinition::textbox("a", "A").with_on_change("myHandler(this)"),
            &ParameterMap::new(),
        );
        assert!(html.contains("oninput=\"myHandler(this)\""));
    }

    #[test]
    fn test_page_content_wraps_each_field() {
        let page = PageDefinition::new("p")
            .with_field(FieldDefinition::textbox("a", "A"))
            .with_section(
                SectionDefinition::new("more", "More")
                    .collapsed()
                    .with_field(FieldDefinition::textbox("b", "B").hidden()),
            );
        let states = FieldStateCache::from_page(&page);
        let html = StandardRenderer.page_content(&page, &ParameterMap::new(), &states);

        assert!(html.contains("<div class=\"setting\" id=\"aField\"><div class=\"setting__input\">"));
        assert!(html.contains("<section id=\"more\" class=\"section--settings section--collapsible collapsed\">"));
        // Hidden fields keep an empty slot so they can be shown later.
        assert!(html.contains("<div class=\"setting\" id=\"bField\"></div>"));
    }
}
