//! Prelude module for webview-wizard.
//!
//! ```ignore
//! use webview_wizard::prelude::*;
//! ```

// ============================================================================
// Core
// ============================================================================

pub use crate::{ConnectionId, DefinitionError, Signal, WizardError, WorkflowError};

// ============================================================================
// Definitions
// ============================================================================

pub use crate::definition::{
    ButtonLayout, FieldDefinition, FieldOption, FieldType, PageDefinition, SectionDefinition,
    WizardDefinition,
};
pub use crate::parameters::ParameterMap;

// ============================================================================
// Validation and Workflow
// ============================================================================

pub use crate::validation::{
    FieldStateDelta, Severity, ValidationContext, ValidationFuture, ValidatorResponse,
};
pub use crate::workflow::{FinishResponse, PageResolver, Workflow, WorkflowManager};
pub use crate::template::Template;

// ============================================================================
// Runtime
// ============================================================================

pub use crate::command::{ClientMessage, Command};
pub use crate::config::{PanelOptions, SessionConfig};
pub use crate::controller::{ControllerState, WizardController, WizardOutcome};
pub use crate::manager::{OpenOutcome, PanelHost, WizardManager};
pub use crate::response::{BatchPhase, Fragment, ResponseBatch, RoundId};
pub use crate::session::{SessionEnd, SessionHandle, WizardSession};
pub use crate::transport::{ChannelWebview, ServerMessage, Webview};

pub use crate::samples;
