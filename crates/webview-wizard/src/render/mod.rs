//! Turning definitions and state into HTML fragments.
//!
//! A [`Renderer`] produces two kinds of markup: the full content of a page,
//! and the inner markup of a single field slot for incremental refreshes.
//! Both must agree on the slot contract: every visible or hidden field sits in
//! an element with id `{field}Field` (see [`field_slot_id`]) containing a
//! message element with id `{field}Validation`.
//!
//! [`StandardRenderer`] implements the contract for every [`FieldType`].
//!
//! [`field_slot_id`]: crate::validation::field_slot_id
//! [`FieldType`]: crate::definition::FieldType

pub mod html;
mod standard;

use serde::Serialize;

pub use standard::StandardRenderer;

use crate::definition::{
    ButtonLayout, FieldDefinition, FieldDefinitionState, PageDefinition, WizardDefinition,
};
use crate::page::FieldStateCache;
use crate::parameters::ParameterMap;
use crate::validation::ValidatorResponseItem;

/// Well-known fragment ids of the wizard chrome.
pub mod fragment_ids {
    /// Wizard-level header.
    pub const HEADER: &str = "wizardHeader";
    /// Page title.
    pub const TITLE: &str = "title";
    /// Page description.
    pub const DESCRIPTION: &str = "description";
    /// Page body.
    pub const CONTENT: &str = "content";
    /// Button bar.
    pub const CONTROLS: &str = "wizardControls";
    /// Reserved id: the body becomes the panel title.
    pub const UPDATE_TITLE: &str = "UPDATE_TITLE";
}

/// Enablement of the navigation buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ButtonState {
    /// Back is enabled.
    pub back: bool,
    /// Next is enabled.
    pub next: bool,
    /// Finish is enabled.
    pub finish: bool,
}

/// Produces the HTML shown in the webview.
pub trait Renderer: Send + Sync {
    /// Full body of a page, one slot per field.
    fn page_content(
        &self,
        page: &PageDefinition,
        data: &ParameterMap,
        states: &FieldStateCache,
    ) -> String;

    /// Inner markup of one field slot.
    fn field(
        &self,
        field: &FieldDefinition,
        data: &ParameterMap,
        state: FieldDefinitionState,
    ) -> String;

    /// The button bar.
    fn controls(&self, layout: &ButtonLayout, state: ButtonState) -> String {
        html::controls(layout, state)
    }

    /// One validation message.
    fn validation_message(&self, item: &ValidatorResponseItem) -> String {
        html::validation_message(item)
    }

    /// The wizard-level header.
    fn header(&self, definition: &WizardDefinition) -> String {
        html::header(definition)
    }
}
