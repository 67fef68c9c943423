//! Session and panel configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use webview_wizard_core::DefinitionError;

/// Options for the webview panel hosting a wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelOptions {
    /// Identifies the panel type to the host.
    pub view_type: String,
    /// Initial panel title. Empty means the wizard title.
    pub title: String,
    /// Keep the webview alive while hidden.
    pub retain_context_when_hidden: bool,
    /// Allow scripts in the webview.
    pub enable_scripts: bool,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            view_type: "webview-wizard".to_string(),
            title: String::new(),
            retain_context_when_hidden: true,
            enable_scripts: true,
        }
    }
}

impl PanelOptions {
    /// Set the view type.
    pub fn with_view_type(mut self, view_type: impl Into<String>) -> Self {
        self.view_type = view_type.into();
        self
    }

    /// Set the initial title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Drop the webview's state while it is hidden.
    pub fn discard_when_hidden(mut self) -> Self {
        self.retain_context_when_hidden = false;
        self
    }
}

/// Configuration for a wizard session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionConfig {
    /// Client messages buffered before senders wait.
    pub inbound_capacity: usize,
    /// Directory `contentUrl` templates are resolved against.
    pub resource_root: Option<PathBuf>,
    /// Panel options.
    pub panel: PanelOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inbound_capacity: 64,
            resource_root: None,
            panel: PanelOptions::default(),
        }
    }
}

impl SessionConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inbound queue capacity. Zero is raised to one.
    pub fn with_inbound_capacity(mut self, capacity: usize) -> Self {
        self.inbound_capacity = capacity.max(1);
        self
    }

    /// Set the template resource root.
    pub fn with_resource_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.resource_root = Some(root.into());
        self
    }

    /// Set the panel options.
    pub fn with_panel(mut self, panel: PanelOptions) -> Self {
        self.panel = panel;
        self
    }

    /// Parse a TOML configuration. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, DefinitionError> {
        let config: Self = toml::from_str(text).map_err(|e| DefinitionError::parse("TOML", e.to_string()))?;
        let capacity = config.inbound_capacity;
        Ok(config.with_inbound_capacity(capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.inbound_capacity, 64);
        assert!(config.resource_root.is_none());
        assert!(config.panel.enable_scripts);
        assert!(config.panel.retain_context_when_hidden);
    }

    #[test]
    fn test_builders() {
        let config = SessionConfig::new()
            .with_inbound_capacity(0)
            .with_resource_root("/ext")
            .with_panel(PanelOptions::default().with_title("Setup").discard_when_hidden());
        assert_eq!(config.inbound_capacity, 1);
        assert_eq!(config.resource_root, Some(PathBuf::from("/ext")));
        assert_eq!(config.panel.title, "Setup");
        assert!(!config.panel.retain_context_when_hidden);
    }

    #[test]
    fn test_from_toml() {
        let config = SessionConfig::from_toml_str(
            r#"
            inboundCapacity = 8
            resourceRoot = "assets"

            [panel]
            viewType = "project-wizard"
            "#,
        )
        .unwrap();
        assert_eq!(config.inbound_capacity, 8);
        assert_eq!(config.resource_root, Some(PathBuf::from("assets")));
        assert_eq!(config.panel.view_type, "project-wizard");
        assert!(config.panel.enable_scripts);

        assert!(matches!(
            SessionConfig::from_toml_str("inboundCapacity = \"many\""),
            Err(DefinitionError::Parse { format: "TOML", .. })
        ));
    }

    #[test]
    fn test_from_toml_raises_zero_capacity() {
        let config = SessionConfig::from_toml_str("inboundCapacity = 0").unwrap();
        assert_eq!(config.inbound_capacity, 1);
    }
}
