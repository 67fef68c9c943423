//! Host hooks for navigation and finishing.
//!
//! A [`WorkflowManager`] decides when the wizard may finish and what
//! finishing does. It may also replace linear navigation by exposing
//! [`PageResolver`]s; when it does not, the [`PageModel`] order is used.
//!
//! [`Workflow`] builds a manager from closures:
//!
//! ```
//! use webview_wizard::workflow::{FinishResponse, Workflow};
//!
//! let workflow = Workflow::new(
//!     |wizard, _params| wizard.can_finish(),
//!     |_wizard, params| {
//!         let name = params.text("name");
//!         Box::pin(async move { Ok(Some(FinishResponse::closing(name))) })
//!     },
//! )
//! .with_next_page(|page, _wizard, params| {
//!     Ok(match page.id() {
//!         "page1" if params.number("age") >= Some(18.0) => Some("page2adult".to_string()),
//!         "page1" => Some("page2child".to_string()),
//!         _ => None,
//!     })
//! });
//! ```

use std::fmt;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use webview_wizard_core::WorkflowError;

use crate::page::{PageModel, WizardPage};
use crate::parameters::ParameterMap;
use crate::template::Template;

/// What finishing produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishResponse {
    /// Close the panel.
    pub close: bool,
    /// Data handed to templates and to the host.
    #[serde(default)]
    pub return_object: Value,
    /// Extra fragments, interpolated against `return_object`.
    #[serde(default)]
    pub templates: Vec<Template>,
    /// Whether the work succeeded; success clears the dirty flag.
    pub success: bool,
}

impl Default for FinishResponse {
    fn default() -> Self {
        Self {
            close: true,
            return_object: Value::Null,
            templates: Vec::new(),
            success: true,
        }
    }
}

impl FinishResponse {
    /// A successful response that closes the wizard.
    pub fn closing(return_object: impl Into<Value>) -> Self {
        Self {
            return_object: return_object.into(),
            ..Self::default()
        }
    }

    /// A response that keeps the wizard open.
    pub fn staying_open(success: bool) -> Self {
        Self {
            close: false,
            success,
            ..Self::default()
        }
    }

    /// Append a template.
    pub fn with_template(mut self, template: Template) -> Self {
        self.templates.push(template);
        self
    }
}

/// Picks the page to move to from `page`.
///
/// `Ok(None)` is a boundary. An error, or an id naming no page, is treated
/// as a boundary by the controller.
pub trait PageResolver: Send + Sync {
    /// Resolve the target page id.
    fn resolve(
        &self,
        page: &WizardPage,
        wizard: &PageModel,
        params: &ParameterMap,
    ) -> Result<Option<String>, WorkflowError>;
}

impl<F> PageResolver for F
where
    F: Fn(&WizardPage, &PageModel, &ParameterMap) -> Result<Option<String>, WorkflowError>
        + Send
        + Sync,
{
    fn resolve(
        &self,
        page: &WizardPage,
        wizard: &PageModel,
        params: &ParameterMap,
    ) -> Result<Option<String>, WorkflowError> {
        self(page, wizard, params)
    }
}

/// Host-provided finishing and navigation behavior.
#[async_trait]
pub trait WorkflowManager: Send + Sync {
    /// Whether Finish may be enabled.
    fn can_finish(&self, wizard: &PageModel, params: &ParameterMap) -> bool;

    /// Do the work. `None` closes the wizard with no result.
    async fn perform_finish(
        &self,
        wizard: &PageModel,
        params: &ParameterMap,
    ) -> Result<Option<FinishResponse>, WorkflowError>;

    /// Replacement for linear Next.
    fn next_page_resolver(&self) -> Option<&dyn PageResolver> {
        None
    }

    /// Replacement for linear Back.
    fn previous_page_resolver(&self) -> Option<&dyn PageResolver> {
        None
    }

    /// Called when the wizard is closed without finishing.
    fn perform_cancel(&self) {}
}

type CanFinishFn = Box<dyn Fn(&PageModel, &ParameterMap) -> bool + Send + Sync>;
type FinishFn = Box<
    dyn Fn(&PageModel, &ParameterMap) -> BoxFuture<'static, Result<Option<FinishResponse>, WorkflowError>>
        + Send
        + Sync,
>;
type CancelFn = Box<dyn Fn() + Send + Sync>;

/// A [`WorkflowManager`] assembled from closures.
pub struct Workflow {
    can_finish: CanFinishFn,
    finish: FinishFn,
    next: Option<Box<dyn PageResolver>>,
    previous: Option<Box<dyn PageResolver>>,
    cancel: Option<CancelFn>,
}

impl Workflow {
    /// Create a workflow from its two required hooks.
    ///
    /// The finish future must own what it needs from the parameters.
    pub fn new<C, F>(can_finish: C, finish: F) -> Self
    where
        C: Fn(&PageModel, &ParameterMap) -> bool + Send + Sync + 'static,
        F: Fn(&PageModel, &ParameterMap) -> BoxFuture<'static, Result<Option<FinishResponse>, WorkflowError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            can_finish: Box::new(can_finish),
            finish: Box::new(finish),
            next: None,
            previous: None,
            cancel: None,
        }
    }

    /// Override Next.
    pub fn with_next_page<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&WizardPage, &PageModel, &ParameterMap) -> Result<Option<String>, WorkflowError>
            + Send
            + Sync
            + 'static,
    {
        self.next = Some(Box::new(resolver));
        self
    }

    /// Override Back.
    pub fn with_previous_page<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&WizardPage, &PageModel, &ParameterMap) -> Result<Option<String>, WorkflowError>
            + Send
            + Sync
            + 'static,
    {
        self.previous = Some(Box::new(resolver));
        self
    }

    /// Run `f` when the wizard is dismissed.
    pub fn on_cancel<F: Fn() + Send + Sync + 'static>(mut self, f: F) -> Self {
        self.cancel = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("next", &self.next.is_some())
            .field("previous", &self.previous.is_some())
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

#[async_trait]
impl WorkflowManager for Workflow {
    fn can_finish(&self, wizard: &PageModel, params: &ParameterMap) -> bool {
        (self.can_finish)(wizard, params)
    }

    async fn perform_finish(
        &self,
        wizard: &PageModel,
        params: &ParameterMap,
    ) -> Result<Option<FinishResponse>, WorkflowError> {
        (self.finish)(wizard, params).await
    }

    fn next_page_resolver(&self) -> Option<&dyn PageResolver> {
        self.next.as_deref()
    }

    fn previous_page_resolver(&self) -> Option<&dyn PageResolver> {
        self.previous.as_deref()
    }

    fn perform_cancel(&self) {
        if let Some(cancel) = &self.cancel {
            cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::PageDefinition;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn model() -> PageModel {
        ["page1", "page2adult", "page2child"]
            .into_iter()
            .map(PageDefinition::new)
            .collect()
    }

    fn workflow() -> Workflow {
        Workflow::new(
            |wizard, _| wizard.can_finish(),
            |_, params| {
                let age = params.text("age");
                Box::pin(async move { Ok(Some(FinishResponse::closing(json!({ "age": age })))) })
            },
        )
    }

    #[test]
    fn test_default_hooks_absent() {
        let workflow = workflow();
        assert!(workflow.next_page_resolver().is_none());
        assert!(workflow.previous_page_resolver().is_none());
        workflow.perform_cancel();
    }

    #[test]
    fn test_resolver_closure() {
        let workflow = workflow().with_next_page(|page, _, params| {
            if page.id() != "page1" {
                return Ok(None);
            }
            match params.number("age") {
                Some(age) if age >= 18.0 => Ok(Some("page2adult".to_string())),
                Some(_) => Ok(Some("page2child".to_string())),
                None => Err(WorkflowError::new("age is not a number")),
            }
        });

        let model = model();
        let page1 = model.page("page1").unwrap();
        let resolver = workflow.next_page_resolver().unwrap();

        let adult = ParameterMap::new().with("age", "30");
        assert_eq!(resolver.resolve(page1, &model, &adult).unwrap().as_deref(), Some("page2adult"));
        let child = ParameterMap::new().with("age", "9");
        assert_eq!(resolver.resolve(page1, &model, &child).unwrap().as_deref(), Some("page2child"));
        assert!(resolver.resolve(page1, &model, &ParameterMap::new()).is_err());
    }

    #[tokio::test]
    async fn test_perform_finish() {
        let workflow = workflow();
        let params = ParameterMap::new().with("age", "42");
        let response = workflow.perform_finish(&model(), &params).await.unwrap().unwrap();
        assert!(response.close);
        assert!(response.success);
        assert_eq!(response.return_object, json!({"age": "42"}));
    }

    #[test]
    fn test_cancel_hook() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let workflow = workflow().on_cancel(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        workflow.perform_cancel();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_finish_response_defaults() {
        let response: FinishResponse =
            serde_json::from_value(json!({"close": false, "success": false})).unwrap();
        assert_eq!(response, FinishResponse::staying_open(false));
    }
}
