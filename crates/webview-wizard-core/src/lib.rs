//! Core systems for webview-wizard.
//!
//! This crate provides the foundational pieces shared by the wizard toolkit:
//!
//! - **Signal/Slot System**: Notifications from the wizard controller to
//!   webview bridges, recorders and host UI
//! - **Errors**: The [`WizardError`] family returned across the toolkit
//! - **Logging**: `tracing` targets, span names and the `wizard_info!` macro
//!
//! # Signal/Slot Example
//!
//! ```
//! use webview_wizard_core::Signal;
//!
//! let dirty_changed = Signal::<bool>::new();
//!
//! let conn_id = dirty_changed.connect(|dirty| {
//!     println!("Wizard is dirty: {}", dirty);
//! });
//!
//! dirty_changed.emit(true);
//! dirty_changed.disconnect(conn_id);
//! ```

mod error;
pub mod logging;
pub mod signal;

pub use error::{DefinitionError, Result, WizardError, WorkflowError};
pub use logging::PerfSpan;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
