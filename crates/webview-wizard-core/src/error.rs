//! Error types for webview-wizard.

use std::path::PathBuf;

/// Result type alias for wizard operations.
pub type Result<T> = std::result::Result<T, WizardError>;

/// The main error type for wizard operations.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    /// The webview sent a command no handler exists for.
    #[error("Can not find a handler for {0}")]
    UnknownCommand(String),

    /// The wizard (or its panel) has already been closed.
    #[error("Wizard '{0}' has been closed")]
    Closed(String),

    /// An operation needed a current page but none is shown.
    #[error("No page is currently shown")]
    NoCurrentPage,

    /// The workflow's finish hook failed.
    #[error("Finish failed: {0}")]
    Finish(#[source] WorkflowError),

    /// The webview message could not be decoded.
    #[error("Malformed message from webview: {0}")]
    Message(String),

    /// Posting to the webview failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The wizard definition is invalid.
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// A result template could not be loaded.
    #[error("Failed to load template '{id}' from '{path}': {source}")]
    Template {
        id: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No panel is registered under the given name.
    #[error("No wizard panel named '{0}'")]
    UnknownPanel(String),
}

impl WizardError {
    /// Create a message decoding error.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a template loading error.
    pub fn template(id: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Template {
            id: id.into(),
            path: path.into(),
            source,
        }
    }
}

/// Errors found while loading or checking a wizard definition.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    /// The definition has no pages.
    #[error("Wizard '{0}' has no pages")]
    NoPages(String),

    /// A page or field id is empty.
    #[error("Empty {kind} id in page '{page}'")]
    EmptyId { kind: &'static str, page: String },

    /// Two pages share an id.
    #[error("Duplicate page id '{0}'")]
    DuplicatePage(String),

    /// Two fields in one page share an id.
    #[error("Duplicate field id '{field}' in page '{page}'")]
    DuplicateField { page: String, field: String },

    /// A validator was attached to a page that does not exist.
    #[error("No page with id '{0}'")]
    UnknownPage(String),

    /// The definition text could not be parsed.
    #[error("Failed to parse {format} definition: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    /// The definition file has an extension no loader exists for.
    #[error("Unsupported definition format '{0}'")]
    UnsupportedFormat(String),

    /// The definition file could not be read.
    #[error("Failed to read definition '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DefinitionError {
    /// Create a parse error.
    pub fn parse(format: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            format,
            message: message.into(),
        }
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// An error raised by a host workflow hook (page resolution or finish).
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct WorkflowError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl WorkflowError {
    /// Create an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}
