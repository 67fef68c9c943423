//! webview-wizard - multi-page form wizards rendered in a webview.
//!
//! A wizard is declared as a [`WizardDefinition`](definition::WizardDefinition):
//! pages of fields, optional per-page validators, and an optional
//! [`WorkflowManager`](workflow::WorkflowManager) deciding navigation and
//! what finishing does. A [`WizardController`](controller::WizardController)
//! runs the state machine and publishes HTML fragment batches; a
//! [`WizardSession`](session::WizardSession) wires it to a webview, and a
//! [`WizardManager`](manager::WizardManager) keeps track of open panels.
//!
//! # Example
//!
//! ```
//! use webview_wizard::prelude::*;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut controller = WizardController::new(
//!     "sample",
//!     samples::linear_wizard(),
//!     &samples::linear_wizard_data(),
//! )?;
//! controller.batch_ready.connect(|batch| {
//!     println!("{} -> {:?}", batch.command, batch.ids());
//! });
//!
//! controller.dispatch(Command::Ready, ParameterMap::new()).await?;
//! assert_eq!(controller.current_page_id(), Some("page1"));
//! # Ok::<(), WizardError>(())
//! # }).unwrap();
//! ```

pub use webview_wizard_core::*;

pub mod command;
pub mod config;
pub mod controller;
pub mod definition;
pub mod host;
pub mod manager;
pub mod page;
pub mod parameters;
pub mod prelude;
pub mod render;
pub mod response;
pub mod samples;
pub mod session;
pub mod template;
pub mod transport;
pub mod validation;
pub mod workflow;
