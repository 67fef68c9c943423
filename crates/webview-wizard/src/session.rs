//! The event loop driving one open wizard.
//!
//! A [`WizardSession`] owns a [`WizardController`] and processes one input at
//! a time: a client message, or the next resolved asynchronous validator of
//! the current round. Inputs arrive through a [`SessionHandle`].

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::Instrument;
use webview_wizard_core::logging::targets;
use webview_wizard_core::{Result, WizardError};

use crate::command::ClientMessage;
use crate::config::SessionConfig;
use crate::controller::{AsyncSettlement, WizardController, WizardOutcome};
use crate::transport::{PanelBridge, ServerMessage, Webview};

/// Input to a session.
#[derive(Debug)]
pub enum SessionInput {
    /// A message from the client script.
    Client(ClientMessage),
    /// The panel was closed by the user or the host.
    Dispose,
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEnd {
    /// The wizard finished and closed itself.
    Closed(WizardOutcome),
    /// The panel was disposed; the wizard was cancelled.
    Disposed,
    /// Every handle was dropped; the wizard was cancelled.
    Disconnected,
}

/// Sends input to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionInput>,
}

impl SessionHandle {
    /// Queue a client message, waiting while the queue is full.
    pub async fn send(&self, message: ClientMessage) -> Result<()> {
        self.sender
            .send(SessionInput::Client(message))
            .await
            .map_err(|_| WizardError::transport("session has ended"))
    }

    /// Ask the session to cancel and stop. Returns `false` if the input
    /// could not be queued.
    pub fn dispose(&self) -> bool {
        self.sender.try_send(SessionInput::Dispose).is_ok()
    }

    /// Whether the session has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

enum Event {
    Input(Option<SessionInput>),
    Settled(AsyncSettlement),
}

/// Drives one controller against one webview.
pub struct WizardSession {
    controller: WizardController,
    webview: Arc<dyn Webview>,
    inbound: mpsc::Receiver<SessionInput>,
    outcome: Arc<Mutex<Option<WizardOutcome>>>,
}

impl WizardSession {
    /// Wire `controller` to `webview` and create the input handle.
    pub fn new(
        controller: WizardController,
        webview: Arc<dyn Webview>,
        config: &SessionConfig,
    ) -> (Self, SessionHandle) {
        let controller = match &config.resource_root {
            Some(root) => controller.with_resource_root(root.clone()),
            None => controller,
        };
        PanelBridge::connect(&controller, Arc::clone(&webview));

        let outcome = Arc::new(Mutex::new(None));
        let outcome_clone = outcome.clone();
        controller.closed.connect(move |result: &WizardOutcome| {
            *outcome_clone.lock() = Some(result.clone());
        });

        let (sender, inbound) = mpsc::channel(config.inbound_capacity.max(1));
        let session = Self {
            controller,
            webview,
            inbound,
            outcome,
        };
        (session, SessionHandle { sender })
    }

    /// The controller.
    pub fn controller(&self) -> &WizardController {
        &self.controller
    }

    /// Post the initial data, then process input until the wizard closes.
    ///
    /// A failing finish hook ends the session with its error. Other command
    /// errors are shown to the user and the session continues.
    pub async fn run(mut self) -> Result<SessionEnd> {
        let span = tracing::info_span!(target: targets::SESSION, "session", wizard = %self.controller.id());
        async move {
            self.webview
                .post_message(&ServerMessage::initialize_data(self.controller.parameters()))?;
            tracing::debug!(target: targets::SESSION, "session started");

            loop {
                let closed = self.outcome.lock().take();
                if let Some(outcome) = closed {
                    tracing::info!(target: targets::SESSION, finished = outcome.finished, "session closed");
                    return Ok(SessionEnd::Closed(outcome));
                }

                let pending = self.controller.has_pending_validation();
                let event = tokio::select! {
                    input = self.inbound.recv() => Event::Input(input),
                    Some(settlement) = self.controller.next_settlement(), if pending => Event::Settled(settlement),
                };

                match event {
                    Event::Input(Some(SessionInput::Client(message))) => self.handle(message).await?,
                    Event::Input(Some(SessionInput::Dispose)) => {
                        self.controller.cancel();
                        tracing::info!(target: targets::SESSION, "session disposed");
                        return Ok(SessionEnd::Disposed);
                    }
                    Event::Input(None) => {
                        self.controller.cancel();
                        tracing::debug!(target: targets::SESSION, "all handles dropped");
                        return Ok(SessionEnd::Disconnected);
                    }
                    Event::Settled(settlement) => self.controller.apply_settlement(settlement),
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn handle(&mut self, message: ClientMessage) -> Result<()> {
        match self.controller.handle(message).await {
            Ok(()) => Ok(()),
            Err(e @ WizardError::Finish(_)) => Err(e),
            Err(e) => {
                tracing::warn!(target: targets::SESSION, error = %e, "command failed");
                self.webview.show_error(&e.to_string());
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for WizardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardSession")
            .field("controller", &self.controller)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;
    use crate::definition::{FieldDefinition, PageDefinition, WizardDefinition};
    use crate::parameters::ParameterMap;
    use crate::transport::ChannelWebview;

    fn controller() -> WizardController {
        let definition = WizardDefinition::new("Session")
            .with_page(PageDefinition::new("only").with_field(FieldDefinition::textbox("name", "Name")));
        WizardController::new("session", definition, &ParameterMap::new()).unwrap()
    }

    #[tokio::test]
    async fn test_session_finishes() {
        let (webview, mut receiver) = ChannelWebview::new("Session");
        let (session, handle) = WizardSession::new(controller(), webview, &SessionConfig::default());
        let task = tokio::spawn(session.run());

        handle.send(ClientMessage::new(Command::Ready, ParameterMap::new())).await.unwrap();
        handle
            .send(ClientMessage::new(Command::FinishPressed, ParameterMap::new()))
            .await
            .unwrap();

        let end = task.await.unwrap().unwrap();
        assert!(matches!(end, SessionEnd::Closed(WizardOutcome { finished: true, .. })));

        let first = receiver.recv().await.unwrap();
        assert!(first.contains("initializeData"));
        let second = receiver.recv().await.unwrap();
        assert!(second.contains("readyResponse"));
    }

    #[tokio::test]
    async fn test_unknown_command_shows_error() {
        let (webview, _receiver) = ChannelWebview::new("Session");
        let (session, handle) =
            WizardSession::new(controller(), webview.clone(), &SessionConfig::default());
        let task = tokio::spawn(session.run());

        handle
            .send(ClientMessage {
                command: "explode".into(),
                parameters: ParameterMap::new(),
            })
            .await
            .unwrap();
        assert!(handle.dispose());

        assert_eq!(task.await.unwrap().unwrap(), SessionEnd::Disposed);
        assert_eq!(webview.errors(), vec!["Can not find a handler for explode".to_string()]);
    }

    #[tokio::test]
    async fn test_dropped_handle_cancels() {
        let (webview, _receiver) = ChannelWebview::new("Session");
        let (session, handle) = WizardSession::new(controller(), webview, &SessionConfig::default());
        drop(handle);
        assert_eq!(session.run().await.unwrap(), SessionEnd::Disconnected);
    }
}
