//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use webview_wizard::prelude::*;

/// Install a test-writer subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Collects every batch a controller emits.
#[derive(Clone, Default)]
pub struct Recorder {
    batches: Arc<Mutex<Vec<ResponseBatch>>>,
}

impl Recorder {
    pub fn attach(controller: &WizardController) -> Self {
        let recorder = Self::default();
        let batches = recorder.batches.clone();
        controller
            .batch_ready
            .connect(move |batch| batches.lock().push(batch.clone()));
        recorder
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<ResponseBatch> {
        std::mem::take(&mut *self.batches.lock())
    }

    pub fn len(&self) -> usize {
        self.batches.lock().len()
    }
}

pub fn params<const N: usize>(pairs: [(&str, &str); N]) -> ParameterMap {
    pairs.into_iter().collect()
}

/// The last batch carrying a fragment for `id`, and that fragment's body.
pub fn last_body(batches: &[ResponseBatch], id: &str) -> Option<String> {
    batches
        .iter()
        .rev()
        .find_map(|batch| batch.fragment(id))
        .map(|fragment| fragment.body.clone())
}
