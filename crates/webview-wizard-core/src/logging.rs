//! Logging facilities for webview-wizard.
//!
//! Every subsystem logs through the `tracing` crate under a fixed target so
//! hosts can filter wizard traffic independently of their own logs:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("webview_wizard::validation=debug,webview_wizard=info")
//!     .init();
//! ```
//!
//! [`wizard_info!`](crate::wizard_info) pins the crate-level target for
//! lifecycle events; subsystem code uses the [`targets`] constants directly.

/// Span names used for tracing.
pub mod span_names {
    /// One inbound command from the webview.
    pub const DISPATCH: &str = "webview_wizard::dispatch";
    /// One validation round for a page.
    pub const VALIDATION_ROUND: &str = "webview_wizard::validation_round";
    /// Rendering a page or field fragment.
    pub const RENDER: &str = "webview_wizard::render";
    /// Running the workflow finish hook.
    pub const FINISH: &str = "webview_wizard::finish";
}

/// Target names for log filtering.
pub mod targets {
    /// Crate-level target.
    pub const WIZARD: &str = "webview_wizard";
    /// Core crate target.
    pub const CORE: &str = "webview_wizard_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "webview_wizard_core::signal";
    /// Definition loading and checking.
    pub const DEFINITION: &str = "webview_wizard::definition";
    /// Controller command dispatch.
    pub const CONTROLLER: &str = "webview_wizard::controller";
    /// Validation rounds and their settlements.
    pub const VALIDATION: &str = "webview_wizard::validation";
    /// Page navigation.
    pub const NAVIGATION: &str = "webview_wizard::navigation";
    /// Webview message transport.
    pub const TRANSPORT: &str = "webview_wizard::transport";
    /// Session event loop.
    pub const SESSION: &str = "webview_wizard::session";
    /// Panel registry.
    pub const MANAGER: &str = "webview_wizard::manager";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Used to time dispatch, validation rounds and rendering.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "webview_wizard::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Info-level event under the `webview_wizard` target.
#[macro_export]
macro_rules! wizard_info {
    ($($arg:tt)*) => {
        tracing::info!(target: "webview_wizard", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new(span_names::VALIDATION_ROUND);
    }

    #[test]
    fn test_targets_are_nested_under_crate() {
        for target in [
            targets::DEFINITION,
            targets::CONTROLLER,
            targets::VALIDATION,
            targets::NAVIGATION,
            targets::TRANSPORT,
            targets::SESSION,
            targets::MANAGER,
        ] {
            assert!(target.starts_with(targets::WIZARD));
        }
        assert!(targets::SIGNAL.starts_with(targets::CORE));
    }

    #[test]
    fn test_info_macro_expands() {
        crate::wizard_info!(wizard = "setup", "info {}", 1);
    }
}
