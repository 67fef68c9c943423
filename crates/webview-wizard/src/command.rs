//! Commands sent by the webview client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use webview_wizard_core::{Result, WizardError};

use crate::parameters::ParameterMap;

/// A command the controller knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// The client script finished loading.
    Ready,
    /// A field changed.
    Validate,
    /// Next was clicked.
    NextPressed,
    /// Back was clicked.
    BackPressed,
    /// Finish was clicked.
    FinishPressed,
    /// A file-picker's browse button was clicked.
    OpenFileDialog,
}

impl Command {
    /// Every command.
    pub const ALL: [Command; 6] = [
        Self::Ready,
        Self::Validate,
        Self::NextPressed,
        Self::BackPressed,
        Self::FinishPressed,
        Self::OpenFileDialog,
    ];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Validate => "validate",
            Self::NextPressed => "nextPressed",
            Self::BackPressed => "backPressed",
            Self::FinishPressed => "finishPressed",
            Self::OpenFileDialog => "openFileDialog",
        }
    }

    /// Wire name of the reply, e.g. `validateResponse`.
    pub fn response_name(self) -> String {
        format!("{}Response", self.as_str())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|command| command.as_str() == s)
            .ok_or_else(|| WizardError::UnknownCommand(s.to_string()))
    }
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A raw message from the webview.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    /// Command name.
    pub command: String,
    /// Field values, or command arguments for `openFileDialog`.
    #[serde(default)]
    pub parameters: ParameterMap,
}

impl ClientMessage {
    /// Create a message.
    pub fn new(command: Command, parameters: ParameterMap) -> Self {
        Self {
            command: command.as_str().to_string(),
            parameters,
        }
    }

    /// Decode a JSON message.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| WizardError::message(e.to_string()))
    }

    /// The parsed command.
    pub fn command(&self) -> Result<Command> {
        self.command.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for command in Command::ALL {
            assert_eq!(command.as_str().parse::<Command>().unwrap(), command);
        }
        assert_eq!(Command::NextPressed.response_name(), "nextPressedResponse");
    }

    #[test]
    fn test_unknown_command() {
        let err = "explode".parse::<Command>().unwrap_err();
        assert_eq!(err.to_string(), "Can not find a handler for explode");
    }

    #[test]
    fn test_decode_message() {
        let message =
            ClientMessage::from_json(r#"{"command":"validate","parameters":{"username":"bob"}}"#)
                .unwrap();
        assert_eq!(message.command().unwrap(), Command::Validate);
        assert_eq!(message.parameters.get_str("username"), Some("bob"));

        let bare = ClientMessage::from_json(r#"{"command":"ready"}"#).unwrap();
        assert!(bare.parameters.is_empty());

        assert!(matches!(
            ClientMessage::from_json("not json"),
            Err(WizardError::Message(_))
        ));
    }
}
