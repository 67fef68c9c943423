//! Applying validator responses to a page.

use std::collections::BTreeSet;

use webview_wizard_core::logging::targets;

use crate::definition::PageDefinition;
use crate::page::WizardPage;
use crate::parameters::ParameterMap;
use crate::render::Renderer;
use crate::response::Fragment;

use super::ValidatorResponse;

/// Suffix of a field's message slot id.
pub const VALIDATION_SLOT_SUFFIX: &str = "Validation";
/// Suffix of a field's refresh slot id.
pub const FIELD_SLOT_SUFFIX: &str = "Field";
/// Body of an empty message slot.
pub const PLACEHOLDER: &str = "&nbsp;";

/// The message slot id for a field id (or an id already naming the slot).
pub fn validation_slot_id(target: &str) -> String {
    if target.ends_with(VALIDATION_SLOT_SUFFIX) {
        target.to_string()
    } else {
        format!("{target}{VALIDATION_SLOT_SUFFIX}")
    }
}

/// The refresh slot id for a field id.
pub fn field_slot_id(field_id: &str) -> String {
    format!("{field_id}{FIELD_SLOT_SUFFIX}")
}

/// What applying one response produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassOutput {
    /// Refresh fragments, then message fragments.
    pub fragments: Vec<Fragment>,
    /// Message slot ids that received a message.
    pub messaged: BTreeSet<String>,
    /// Whether any message was an error.
    pub has_error: bool,
}

/// Applies responses to a page using one renderer and one value snapshot.
pub struct ValidationPass<'a> {
    renderer: &'a dyn Renderer,
    data: &'a ParameterMap,
}

impl<'a> ValidationPass<'a> {
    /// Create a pass.
    pub fn new(renderer: &'a dyn Renderer, data: &'a ParameterMap) -> Self {
        Self { renderer, data }
    }

    /// Apply one response: update the field state cache, then render
    /// refresh fragments followed by message fragments.
    ///
    /// Refreshes come first because a re-rendered field slot contains an
    /// empty message slot.
    pub fn apply(&self, page: &mut WizardPage, response: &ValidatorResponse) -> PassOutput {
        let mut output = PassOutput::default();

        for (field_id, delta) in &response.field_refresh {
            match page.states_mut().apply(field_id, delta) {
                None => {
                    tracing::debug!(
                        target: targets::VALIDATION,
                        page = page.id(),
                        field = %field_id,
                        "ignoring refresh for unknown field"
                    );
                }
                Some(false) => {}
                Some(true) => {
                    let Some(field) = page.definition().field(field_id) else {
                        continue;
                    };
                    let body = self.renderer.field(field, self.data, page.states().get(field_id));
                    output.fragments.push(Fragment::new(field_slot_id(field_id), body));
                }
            }
        }

        for item in &response.items {
            let slot = item.slot_id();
            output
                .fragments
                .push(Fragment::new(slot.clone(), self.renderer.validation_message(item)));
            output.messaged.insert(slot);
        }
        output.has_error = response.has_error();
        output
    }
}

/// Blank message slots for every field without a message.
pub fn placeholder_fragments(page: &PageDefinition, messaged: &BTreeSet<String>) -> Vec<Fragment> {
    page.fields()
        .map(|field| validation_slot_id(&field.id))
        .filter(|slot| !messaged.contains(slot))
        .map(|slot| Fragment::new(slot, PLACEHOLDER))
        .collect()
}
