//! Messages sent to the webview, and the bridge that forwards controller
//! batches to it.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use webview_wizard_core::logging::targets;
use webview_wizard_core::{ConnectionId, Result, WizardError};

use crate::controller::WizardController;
use crate::parameters::ParameterMap;
use crate::render::fragment_ids;
use crate::response::{Fragment, ResponseBatch, RoundId};

/// Command name of the initial-data message.
pub const INITIALIZE_DATA: &str = "initializeData";

/// A message posted to the webview.
///
/// Responses are named after the command that caused them
/// (`validateResponse`, `nextPressedResponse`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    /// `<command>Response`, or [`INITIALIZE_DATA`].
    pub command: String,
    /// Fragments to apply in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<Fragment>,
    /// Free-form result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Element to focus after applying `contents`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focused_field: Option<String>,
    /// Round of the batch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<RoundId>,
}

impl ServerMessage {
    /// The initial field values, sent once before any command.
    pub fn initialize_data(data: &ParameterMap) -> Self {
        Self {
            command: INITIALIZE_DATA.to_string(),
            contents: Vec::new(),
            result: Some(data.to_value()),
            focused_field: None,
            round: None,
        }
    }

    /// Encode to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| WizardError::transport(e.to_string()))
    }
}

impl From<ResponseBatch> for ServerMessage {
    fn from(batch: ResponseBatch) -> Self {
        Self {
            command: batch.command.response_name(),
            contents: batch.contents,
            result: batch.result,
            focused_field: batch.focused_field,
            round: Some(batch.round),
        }
    }
}

/// The host side of a webview panel.
pub trait Webview: Send + Sync {
    /// Post a message to the client script.
    fn post_message(&self, message: &ServerMessage) -> Result<()>;

    /// Change the panel title.
    fn set_title(&self, title: &str);

    /// Bring the panel to the front.
    fn reveal(&self) {}

    /// Show an error notification to the user.
    fn show_error(&self, message: &str) {
        tracing::error!(target: targets::TRANSPORT, "{message}");
    }
}

/// A [`Webview`] that writes encoded messages to a channel.
///
/// Used by tests and by hosts that ship messages over their own IPC.
#[derive(Debug)]
pub struct ChannelWebview {
    sender: mpsc::UnboundedSender<String>,
    title: Mutex<String>,
    reveals: Mutex<usize>,
    errors: Mutex<Vec<String>>,
}

impl ChannelWebview {
    /// Create a webview and the receiving end of its message channel.
    pub fn new(title: impl Into<String>) -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let webview = Arc::new(Self {
            sender,
            title: Mutex::new(title.into()),
            reveals: Mutex::new(0),
            errors: Mutex::new(Vec::new()),
        });
        (webview, receiver)
    }

    /// The current panel title.
    pub fn title(&self) -> String {
        self.title.lock().clone()
    }

    /// How often the panel was revealed.
    pub fn reveal_count(&self) -> usize {
        *self.reveals.lock()
    }

    /// Error notifications shown so far.
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

impl Webview for ChannelWebview {
    fn post_message(&self, message: &ServerMessage) -> Result<()> {
        let json = message.to_json()?;
        self.sender
            .send(json)
            .map_err(|_| WizardError::transport("webview channel closed"))
    }

    fn set_title(&self, title: &str) {
        *self.title.lock() = title.to_string();
    }

    fn reveal(&self) {
        *self.reveals.lock() += 1;
    }

    fn show_error(&self, message: &str) {
        tracing::error!(target: targets::TRANSPORT, "{message}");
        self.errors.lock().push(message.to_string());
    }
}

/// Forwards a controller's batches to a webview.
pub struct PanelBridge;

impl PanelBridge {
    /// Connect `controller`'s `batch_ready` signal to `webview`.
    ///
    /// `UPDATE_TITLE` fragments become `set_title` calls and are removed
    /// from the posted message. A batch left with nothing to post is
    /// dropped.
    pub fn connect(controller: &WizardController, webview: Arc<dyn Webview>) -> ConnectionId {
        controller.batch_ready.connect(move |batch: &ResponseBatch| {
            let mut batch = batch.clone();
            batch.contents.retain(|fragment| {
                if fragment.id == fragment_ids::UPDATE_TITLE {
                    webview.set_title(&fragment.body);
                    false
                } else {
                    true
                }
            });
            if batch.is_empty() && batch.focused_field.is_none() {
                return;
            }

            let message = ServerMessage::from(batch);
            if let Err(e) = webview.post_message(&message) {
                tracing::warn!(
                    target: targets::TRANSPORT,
                    command = %message.command,
                    error = %e,
                    "failed to post message"
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::response::BatchPhase;
    use serde_json::json;

    #[test]
    fn test_response_message_shape() {
        let mut batch = ResponseBatch::new(Command::Validate, RoundId::default().next(), BatchPhase::Validation);
        batch.push("nameValidation", "&nbsp;");
        let message = ServerMessage::from(batch);

        let value: Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "command": "validateResponse",
                "contents": [{"id": "nameValidation", "body": "&nbsp;"}],
                "round": 1
            })
        );
    }

    #[test]
    fn test_initialize_data() {
        let data = ParameterMap::new().with("username", "bob");
        let value: Value =
            serde_json::from_str(&ServerMessage::initialize_data(&data).to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"command": "initializeData", "result": {"username": "bob"}}));
    }

    #[test]
    fn test_channel_webview() {
        let (webview, mut receiver) = ChannelWebview::new("Wizard");
        webview.set_title("* Wizard");
        webview.reveal();
        webview
            .post_message(&ServerMessage::initialize_data(&ParameterMap::new()))
            .unwrap();

        assert_eq!(webview.title(), "* Wizard");
        assert_eq!(webview.reveal_count(), 1);
        assert!(receiver.try_recv().unwrap().contains("initializeData"));

        drop(receiver);
        assert!(matches!(
            webview.post_message(&ServerMessage::initialize_data(&ParameterMap::new())),
            Err(WizardError::Transport(_))
        ));
    }
}
