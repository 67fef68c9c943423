//! Registry of open wizard panels.
//!
//! Panels are keyed by name. Opening a name that is already live reveals the
//! existing panel instead of creating a second one. Each panel runs its
//! [`WizardSession`] on a Tokio task, which removes the registry entry when
//! the session ends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use webview_wizard_core::logging::targets;
use webview_wizard_core::{Result, Signal, WizardError};

use crate::command::ClientMessage;
use crate::config::{PanelOptions, SessionConfig};
use crate::controller::WizardController;
use crate::definition::WizardDefinition;
use crate::host::{FileDialogHost, NoFileDialog};
use crate::parameters::ParameterMap;
use crate::session::{SessionEnd, SessionHandle, WizardSession};
use crate::transport::Webview;

/// Creates webview panels.
pub trait PanelHost: Send + Sync {
    /// Create a panel named `name`.
    fn create_panel(&self, name: &str, options: &PanelOptions) -> Result<Arc<dyn Webview>>;
}

/// What [`WizardManager::open`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// A new panel and session were created.
    Created,
    /// The live panel with that name was brought to the front.
    Revealed,
}

/// A session that stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelClosed {
    /// Panel name.
    pub name: String,
    /// How the session ended, or the error that ended it.
    pub end: std::result::Result<SessionEnd, String>,
}

struct PanelEntry {
    generation: u64,
    webview: Arc<dyn Webview>,
    handle: SessionHandle,
}

/// Owns every open wizard panel.
pub struct WizardManager {
    host: Arc<dyn PanelHost>,
    config: SessionConfig,
    file_dialog: Arc<dyn FileDialogHost>,
    panels: Arc<Mutex<HashMap<String, PanelEntry>>>,
    generation: AtomicU64,
    session_ended: Arc<Signal<PanelClosed>>,
}

impl WizardManager {
    /// Create a manager opening panels through `host`.
    pub fn new(host: Arc<dyn PanelHost>, config: SessionConfig) -> Self {
        Self {
            host,
            config,
            file_dialog: Arc::new(NoFileDialog),
            panels: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
            session_ended: Arc::new(Signal::new()),
        }
    }

    /// Answer `openFileDialog` with `dialog`.
    pub fn with_file_dialog(mut self, dialog: Arc<dyn FileDialogHost>) -> Self {
        self.file_dialog = dialog;
        self
    }

    /// Signal emitted when a panel's session ends.
    pub fn session_ended(&self) -> &Signal<PanelClosed> {
        &self.session_ended
    }

    /// Open `definition` in the panel `name`, or reveal that panel if it is
    /// already open.
    ///
    /// Must be called within a Tokio runtime.
    pub fn open(
        &self,
        name: &str,
        definition: WizardDefinition,
        data: &ParameterMap,
    ) -> Result<OpenOutcome> {
        let mut panels = self.panels.lock();
        if let Some(entry) = panels.get(name)
            && !entry.handle.is_closed()
        {
            tracing::debug!(target: targets::MANAGER, panel = name, "revealing open panel");
            entry.webview.reveal();
            return Ok(OpenOutcome::Revealed);
        }

        let controller = WizardController::new(name, definition, data)?
            .with_file_dialog(Arc::clone(&self.file_dialog));
        let mut options = self.config.panel.clone();
        if options.title.is_empty() {
            options.title = controller.panel_title();
        }
        let webview = self.host.create_panel(name, &options)?;
        webview.set_title(&options.title);

        let (session, handle) = WizardSession::new(controller, Arc::clone(&webview), &self.config);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst);
        panels.insert(
            name.to_string(),
            PanelEntry {
                generation,
                webview,
                handle,
            },
        );
        drop(panels);

        let registry = Arc::clone(&self.panels);
        let ended = Arc::clone(&self.session_ended);
        let name = name.to_string();
        tracing::info!(target: targets::MANAGER, panel = %name, "opened wizard panel");
        tokio::spawn(async move {
            let end = session.run().await;
            match &end {
                Ok(end) => tracing::debug!(target: targets::MANAGER, panel = %name, ?end, "session ended"),
                Err(e) => tracing::error!(target: targets::MANAGER, panel = %name, error = %e, "session failed"),
            }
            {
                let mut panels = registry.lock();
                if panels.get(&name).is_some_and(|entry| entry.generation == generation) {
                    panels.remove(&name);
                }
            }
            ended.emit(PanelClosed {
                name,
                end: end.map_err(|e| e.to_string()),
            });
        });

        Ok(OpenOutcome::Created)
    }

    /// Route a client message to the panel `name`.
    pub async fn deliver(&self, name: &str, message: ClientMessage) -> Result<()> {
        let handle = self
            .panels
            .lock()
            .get(name)
            .map(|entry| entry.handle.clone())
            .ok_or_else(|| WizardError::UnknownPanel(name.to_string()))?;
        handle.send(message).await
    }

    /// Decode a JSON client message and route it to the panel `name`.
    pub async fn deliver_json(&self, name: &str, text: &str) -> Result<()> {
        let message = ClientMessage::from_json(text)?;
        self.deliver(name, message).await
    }

    /// Close the panel `name`, cancelling its wizard.
    ///
    /// Returns `false` if no such panel is open.
    pub fn dispose(&self, name: &str) -> bool {
        let Some(entry) = self.panels.lock().remove(name) else {
            return false;
        };
        if !entry.handle.dispose() {
            tracing::debug!(target: targets::MANAGER, panel = name, "dispose not queued; dropping handle");
        }
        tracing::info!(target: targets::MANAGER, panel = name, "disposed wizard panel");
        true
    }

    /// Whether the panel `name` is open.
    pub fn is_open(&self, name: &str) -> bool {
        self.panels.lock().contains_key(name)
    }

    /// Number of open panels.
    pub fn len(&self) -> usize {
        self.panels.lock().len()
    }

    /// Whether no panel is open.
    pub fn is_empty(&self) -> bool {
        self.panels.lock().is_empty()
    }

    /// Names of the open panels, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.panels.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for WizardManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardManager")
            .field("panels", &self.names())
            .field("config", &self.config)
            .finish()
    }
}
