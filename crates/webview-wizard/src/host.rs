//! Host-provided services: the native file dialog.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Options passed to the host's open-file dialog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileDialogOptions {
    /// Allow selecting files.
    pub can_select_files: Option<bool>,
    /// Allow selecting folders.
    pub can_select_folders: Option<bool>,
    /// Allow selecting several entries.
    pub can_select_many: Option<bool>,
    /// Initial location.
    pub default_uri: Option<String>,
    /// Filter name to extensions, e.g. `"Images" -> ["png", "jpg"]`.
    pub filters: BTreeMap<String, Vec<String>>,
    /// Label of the confirm button.
    pub open_label: Option<String>,
    /// Dialog title.
    pub title: Option<String>,
}

/// Asks the user for a path.
#[async_trait]
pub trait FileDialogHost: Send + Sync {
    /// Show the dialog; `None` when the user cancels.
    async fn open_file(&self, options: &FileDialogOptions) -> Option<PathBuf>;
}

/// A host without a file dialog; every request is treated as cancelled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFileDialog;

#[async_trait]
impl FileDialogHost for NoFileDialog {
    async fn open_file(&self, _options: &FileDialogOptions) -> Option<PathBuf> {
        None
    }
}

/// A dialog that answers from a queue of prepared results.
///
/// Used by tests and headless hosts. An empty queue answers `None`.
#[derive(Debug, Default)]
pub struct ScriptedFileDialog {
    answers: Mutex<Vec<Option<PathBuf>>>,
    requests: Mutex<Vec<FileDialogOptions>>,
}

impl ScriptedFileDialog {
    /// Create a dialog with answers given in order.
    pub fn new<I>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<PathBuf>>,
    {
        let mut answers: Vec<_> = answers.into_iter().collect();
        answers.reverse();
        Self {
            answers: Mutex::new(answers),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Options of every request received so far.
    pub fn requests(&self) -> Vec<FileDialogOptions> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl FileDialogHost for ScriptedFileDialog {
    async fn open_file(&self, options: &FileDialogOptions) -> Option<PathBuf> {
        self.requests.lock().push(options.clone());
        self.answers.lock().pop().flatten()
    }
}
