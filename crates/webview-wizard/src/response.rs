//! Fragment batches pushed from the controller to the webview.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::command::Command;

/// Logical timestamp of one command's work.
///
/// Ids increase monotonically per controller; batches from a superseded
/// round are never emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RoundId(u64);

impl RoundId {
    /// The id after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Replacement markup for one DOM element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    /// Target element id.
    pub id: String,
    /// New inner HTML.
    pub body: String,
}

impl Fragment {
    /// Create a fragment.
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
        }
    }
}

/// Why a batch was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchPhase {
    /// Full page refresh after a page change.
    Chrome,
    /// Synchronous validation results.
    Validation,
    /// One asynchronous validator's results.
    AsyncValidation,
    /// Placeholders after every asynchronous validator settled.
    Settled,
    /// Button bar only; navigation went nowhere.
    Controls,
    /// Finish templates.
    Finish,
    /// File dialog answer.
    FileDialog,
}

/// An ordered set of fragments plus optional result data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBatch {
    /// The command whose work produced the batch.
    pub command: Command,
    /// Round the batch belongs to.
    pub round: RoundId,
    /// Why the batch was produced.
    pub phase: BatchPhase,
    /// Fragments, applied by the client in order.
    pub contents: Vec<Fragment>,
    /// Field the client should focus.
    pub focused_field: Option<String>,
    /// Free-form result (finish return object, dialog answer).
    pub result: Option<Value>,
}

impl ResponseBatch {
    /// An empty batch.
    pub fn new(command: Command, round: RoundId, phase: BatchPhase) -> Self {
        Self {
            command,
            round,
            phase,
            contents: Vec::new(),
            focused_field: None,
            result: None,
        }
    }

    /// Append a fragment.
    pub fn push(&mut self, id: impl Into<String>, body: impl Into<String>) {
        self.contents.push(Fragment::new(id, body));
    }

    /// The last fragment for `id`, the one the client ends up showing.
    pub fn fragment(&self, id: &str) -> Option<&Fragment> {
        self.contents.iter().rev().find(|fragment| fragment.id == id)
    }

    /// Every fragment for `id`, in order.
    pub fn fragments_for<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Fragment> + 'a {
        self.contents.iter().filter(move |fragment| fragment.id == id)
    }

    /// Fragment ids in order.
    pub fn ids(&self) -> Vec<&str> {
        self.contents.iter().map(|fragment| fragment.id.as_str()).collect()
    }

    /// Whether the batch has no fragments and no result.
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty() && self.result.is_none()
    }
}
