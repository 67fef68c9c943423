//! The wizard state machine.
//!
//! A [`WizardController`] owns the pages, the current-page pointer, the
//! field-value snapshot and the dirty flag. It consumes client commands and
//! publishes its output as [`ResponseBatch`]es on the
//! [`batch_ready`](WizardController::batch_ready) signal.
//!
//! # Rounds
//!
//! Every command that validates (`ready`, `validate`, `nextPressed`,
//! `backPressed`) starts a new round. A round emits, in order:
//!
//! 1. for page changes, a chrome batch (header, title, description, content,
//!    controls),
//! 2. the synchronous validation batch,
//! 3. one batch per asynchronous validator as it resolves,
//! 4. once all asynchronous validators settled, a batch of blank
//!    placeholders for fields that got no message, plus controls.
//!
//! Without asynchronous validators, steps 3 and 4 fold into step 2.
//! Starting a round drops the previous round's outstanding futures, and any
//! result carrying an older round id is suppressed.
//!
//! Asynchronous results are not polled by the controller itself: the owner
//! drives [`next_settlement`](WizardController::next_settlement) and feeds
//! each result to [`apply_settlement`](WizardController::apply_settlement),
//! or awaits [`settle`](WizardController::settle).

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use futures_util::FutureExt;
use serde_json::{json, Value};
use tracing::Instrument;
use webview_wizard_core::logging::{span_names, targets};
use webview_wizard_core::{PerfSpan, Result, Signal, WizardError};

use crate::command::{ClientMessage, Command};
use crate::definition::WizardDefinition;
use crate::host::{FileDialogHost, FileDialogOptions, NoFileDialog};
use crate::page::{PageModel, WizardPage};
use crate::parameters::ParameterMap;
use crate::render::html::escape;
use crate::render::{fragment_ids, ButtonState, Renderer, StandardRenderer};
use crate::response::{BatchPhase, Fragment, ResponseBatch, RoundId};
use crate::validation::{
    field_slot_id, placeholder_fragments, ValidationContext, ValidationPass, ValidatorResponse,
};
use crate::workflow::FinishResponse;

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerState {
    /// Waiting for `ready`.
    NoPageShown,
    /// A page is shown.
    PageShown(String),
    /// Finished or cancelled; no further commands are accepted.
    Closed,
}

/// How a wizard ended.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardOutcome {
    /// `true` after a successful finish, `false` when cancelled.
    pub finished: bool,
    /// The finish response's return object.
    pub return_object: Value,
}

impl WizardOutcome {
    /// The outcome of a dismissed wizard.
    pub fn cancelled() -> Self {
        Self {
            finished: false,
            return_object: Value::Null,
        }
    }
}

/// One resolved asynchronous validator.
#[derive(Debug)]
pub struct AsyncSettlement {
    round: RoundId,
    page_id: String,
    response: ValidatorResponse,
}

impl AsyncSettlement {
    /// The round that started the validator.
    pub fn round(&self) -> RoundId {
        self.round
    }

    /// The page the validator belongs to.
    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    /// The validator's response.
    pub fn response(&self) -> &ValidatorResponse {
        &self.response
    }
}

type PendingValidations = FuturesUnordered<BoxFuture<'static, AsyncSettlement>>;

#[derive(Debug)]
struct RoundProgress {
    id: RoundId,
    command: Command,
    page_id: String,
    outstanding: usize,
    messaged: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Next,
    Back,
}

/// Drives one open wizard.
pub struct WizardController {
    id: String,
    definition: WizardDefinition,
    renderer: Arc<dyn Renderer>,
    pages: PageModel,
    state: ControllerState,
    parameters: ParameterMap,
    previous: ParameterMap,
    dirty: bool,
    round: RoundId,
    progress: Option<RoundProgress>,
    pending: PendingValidations,
    file_dialog: Arc<dyn FileDialogHost>,
    resource_root: Option<PathBuf>,

    // Signals
    /// Signal emitted for every batch of fragments bound for the client.
    pub batch_ready: Signal<ResponseBatch>,
    /// Signal emitted with the new page id when the current page changes.
    pub current_page_changed: Signal<String>,
    /// Signal emitted when the dirty flag flips.
    pub dirty_changed: Signal<bool>,
    /// Signal emitted once when the wizard closes.
    pub closed: Signal<WizardOutcome>,
}

impl std::fmt::Debug for WizardController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardController")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("round", &self.round)
            .field("dirty", &self.dirty)
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl WizardController {
    /// Build a controller for `definition`, seeded with the caller's values.
    ///
    /// Every page's completion is seeded by running its synchronous
    /// validator against the initial values.
    pub fn new(
        id: impl Into<String>,
        definition: WizardDefinition,
        data: &ParameterMap,
    ) -> Result<Self> {
        definition.check()?;

        let renderer = definition
            .renderer
            .clone()
            .unwrap_or_else(|| Arc::new(StandardRenderer));
        let parameters = definition.initial_data(data);
        let mut pages: PageModel = definition.pages.iter().cloned().collect();

        let empty = ParameterMap::new();
        let ctx = ValidationContext::new(&parameters, &empty);
        for page in pages.pages_mut() {
            refresh_completion(page, &ctx);
        }

        let id = id.into();
        tracing::debug!(
            target: targets::CONTROLLER,
            wizard = %id,
            pages = pages.page_count(),
            "created wizard controller"
        );

        Ok(Self {
            id,
            definition,
            renderer,
            pages,
            state: ControllerState::NoPageShown,
            previous: parameters.clone(),
            parameters,
            dirty: false,
            round: RoundId::default(),
            progress: None,
            pending: FuturesUnordered::new(),
            file_dialog: Arc::new(NoFileDialog),
            resource_root: None,
            batch_ready: Signal::new(),
            current_page_changed: Signal::new(),
            dirty_changed: Signal::new(),
            closed: Signal::new(),
        })
    }

    /// Use a host file dialog.
    pub fn with_file_dialog(mut self, host: Arc<dyn FileDialogHost>) -> Self {
        self.file_dialog = host;
        self
    }

    /// Resolve template files against `root`.
    pub fn with_resource_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.resource_root = Some(root.into());
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The wizard id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The definition.
    pub fn definition(&self) -> &WizardDefinition {
        &self.definition
    }

    /// The lifecycle state.
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Whether the wizard has closed.
    pub fn is_closed(&self) -> bool {
        self.state == ControllerState::Closed
    }

    /// Whether the user has edited anything since open or the last
    /// successful finish.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The pages.
    pub fn pages(&self) -> &PageModel {
        &self.pages
    }

    /// The current field values.
    pub fn parameters(&self) -> &ParameterMap {
        &self.parameters
    }

    /// The id of the shown page.
    pub fn current_page_id(&self) -> Option<&str> {
        match &self.state {
            ControllerState::PageShown(id) => Some(id),
            _ => None,
        }
    }

    /// The shown page.
    pub fn current_page(&self) -> Option<&WizardPage> {
        self.current_page_id().and_then(|id| self.pages.page(id))
    }

    /// The latest round id.
    pub fn round(&self) -> RoundId {
        self.round
    }

    /// The title shown on the panel, with the dirty marker if enabled.
    pub fn panel_title(&self) -> String {
        if self.definition.show_dirty_state && self.dirty {
            format!("* {}", self.definition.title)
        } else {
            self.definition.title.clone()
        }
    }

    /// Current button enablement.
    ///
    /// Back follows page resolution alone; Next and Finish also require the
    /// current page to be complete.
    pub fn button_state(&self) -> ButtonState {
        let Some(page) = self.current_page() else {
            return ButtonState::default();
        };
        let complete = page.is_complete();
        let can_finish = match &self.definition.workflow_manager {
            Some(manager) => manager.can_finish(&self.pages, &self.parameters),
            None => self.pages.can_finish(),
        };
        ButtonState {
            back: self.resolve(Direction::Back, page.id()).is_some(),
            next: complete && self.resolve(Direction::Next, page.id()).is_some(),
            finish: complete && can_finish,
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Decode and dispatch a client message.
    pub async fn handle(&mut self, message: ClientMessage) -> Result<()> {
        let command = message.command()?;
        self.dispatch(command, message.parameters).await
    }

    /// Dispatch a command.
    pub async fn dispatch(&mut self, command: Command, parameters: ParameterMap) -> Result<()> {
        if self.is_closed() {
            return Err(WizardError::Closed(self.id.clone()));
        }
        let span = tracing::info_span!(
            target: targets::CONTROLLER,
            span_names::DISPATCH,
            wizard = %self.id,
            %command
        );
        async move {
            tracing::debug!(target: targets::CONTROLLER, "dispatching command");
            match command {
                Command::Ready => {
                    self.ready();
                    Ok(())
                }
                Command::Validate => self.validate(parameters),
                Command::NextPressed => {
                    self.navigate(command, Direction::Next, parameters);
                    Ok(())
                }
                Command::BackPressed => {
                    self.navigate(command, Direction::Back, parameters);
                    Ok(())
                }
                Command::FinishPressed => self.finish(parameters).await,
                Command::OpenFileDialog => {
                    self.open_file_dialog(parameters).await;
                    Ok(())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Dismiss the wizard without finishing.
    ///
    /// Invokes the workflow's cancel hook. Does nothing once closed.
    pub fn cancel(&mut self) {
        if self.is_closed() {
            return;
        }
        if let Some(manager) = &self.definition.workflow_manager {
            manager.perform_cancel();
        }
        tracing::info!(target: targets::CONTROLLER, wizard = %self.id, "wizard cancelled");
        self.close_with(WizardOutcome::cancelled());
    }

    fn ready(&mut self) {
        let round = self.begin_round();
        match self.pages.starting_page().map(|page| page.id().to_string()) {
            Some(page_id) => self.show_page(Command::Ready, round, page_id),
            None => self.emit_controls(Command::Ready, round),
        }
    }

    fn validate(&mut self, parameters: ParameterMap) -> Result<()> {
        if self.current_page_id().is_none() {
            return Err(WizardError::NoCurrentPage);
        }
        let round = self.begin_round();
        self.parameters.overlay(&parameters);

        let mut extra = Vec::new();
        if !self.dirty {
            self.dirty = true;
            self.dirty_changed.emit(true);
            if self.definition.show_dirty_state {
                extra.push(Fragment::new(fragment_ids::UPDATE_TITLE, self.panel_title()));
            }
        }
        self.run_validation(Command::Validate, round, extra);
        Ok(())
    }

    fn navigate(&mut self, command: Command, direction: Direction, parameters: ParameterMap) {
        let round = self.begin_round();
        let before = self.parameters.clone();
        self.parameters.overlay(&parameters);
        self.recheck_current_page(before != self.parameters);

        let target = match self.current_page() {
            None if direction == Direction::Next => {
                self.pages.starting_page().map(|page| page.id().to_string())
            }
            None => None,
            Some(page) if direction == Direction::Next && !page.is_complete() => {
                tracing::debug!(
                    target: targets::NAVIGATION,
                    page = page.id(),
                    "next refused: page incomplete"
                );
                None
            }
            Some(page) => self.resolve(direction, page.id()),
        };

        match target {
            Some(page_id) => {
                tracing::info!(
                    target: targets::NAVIGATION,
                    from = ?self.current_page_id(),
                    to = %page_id,
                    "changing page"
                );
                self.show_page(command, round, page_id);
            }
            None => self.emit_controls(command, round),
        }
    }

    async fn finish(&mut self, parameters: ParameterMap) -> Result<()> {
        self.parameters.overlay(&parameters);
        let round = self.round;

        let response = match self.definition.workflow_manager.clone() {
            Some(manager) => manager
                .perform_finish(&self.pages, &self.parameters)
                .instrument(tracing::info_span!(target: targets::CONTROLLER, "perform_finish"))
                .await
                .map_err(WizardError::Finish)?,
            None => None,
        };
        let response = response.unwrap_or_default();
        tracing::info!(
            target: targets::CONTROLLER,
            close = response.close,
            success = response.success,
            templates = response.templates.len(),
            "finish completed"
        );

        let mut batch = ResponseBatch::new(Command::FinishPressed, round, BatchPhase::Finish);
        if response.success && self.dirty {
            self.dirty = false;
            self.dirty_changed.emit(false);
            if self.definition.show_dirty_state {
                batch.push(fragment_ids::UPDATE_TITLE, self.panel_title());
            }
        }
        self.push_templates(&mut batch, &response)?;
        batch.result = Some(response.return_object.clone());
        self.batch_ready.emit(batch);

        if response.close {
            self.close_with(WizardOutcome {
                finished: true,
                return_object: response.return_object,
            });
        }
        Ok(())
    }

    fn push_templates(&self, batch: &mut ResponseBatch, response: &FinishResponse) -> Result<()> {
        let _span = PerfSpan::new(span_names::FINISH);
        for template in &response.templates {
            let fragment = template.render(&response.return_object, self.resource_root.as_deref())?;
            batch.contents.push(fragment);
        }
        Ok(())
    }

    async fn open_file_dialog(&mut self, parameters: ParameterMap) {
        let field_id = parameters.text("fieldId");
        let options = match parameters.get("options") {
            Some(value) => serde_json::from_value::<FileDialogOptions>(value.clone()).unwrap_or_else(|e| {
                tracing::warn!(target: targets::CONTROLLER, error = %e, "ignoring malformed dialog options");
                FileDialogOptions::default()
            }),
            None => self
                .current_page()
                .and_then(|page| page.definition().field(&field_id))
                .and_then(|field| field.properties.dialog_options.clone())
                .unwrap_or_default(),
        };

        let dialog = Arc::clone(&self.file_dialog);
        let path = dialog.open_file(&options).await;
        tracing::debug!(target: targets::CONTROLLER, field = %field_id, chosen = path.is_some(), "file dialog answered");

        let fs_path = path.map(|p| p.display().to_string());
        let mut batch = ResponseBatch::new(Command::OpenFileDialog, self.round, BatchPhase::FileDialog);
        if let Some(fs_path) = &fs_path {
            self.parameters.insert(field_id.clone(), fs_path.clone());
            if let Some(body) = self.render_field(&field_id) {
                batch.push(field_slot_id(&field_id), body);
            }
        }
        batch.result = Some(json!({
            "returnObject": {
                "fieldId": field_id,
                "fsPath": fs_path,
            }
        }));
        self.batch_ready.emit(batch);
    }

    /// Current markup of a field on the shown page.
    fn render_field(&self, field_id: &str) -> Option<String> {
        let page = self.current_page()?;
        let field = page.definition().field(field_id)?;
        Some(self.renderer.field(field, &self.parameters, page.states().get(field_id)))
    }

    // =========================================================================
    // Rounds
    // =========================================================================

    fn begin_round(&mut self) -> RoundId {
        self.round = self.round.next();
        if !self.pending.is_empty() {
            tracing::debug!(
                target: targets::VALIDATION,
                dropped = self.pending.len(),
                round = %self.round,
                "dropping superseded validations"
            );
            self.pending = FuturesUnordered::new();
        }
        self.progress = None;
        self.round
    }

    fn show_page(&mut self, command: Command, round: RoundId, page_id: String) {
        self.state = ControllerState::PageShown(page_id.clone());
        self.current_page_changed.emit(page_id.clone());

        let Some(page) = self.pages.page(&page_id) else {
            return;
        };
        let definition = page.definition();
        let (title, description) = if definition.hide_header {
            (String::new(), String::new())
        } else {
            (
                definition.title.as_deref().map(escape).unwrap_or_default(),
                definition.description.as_deref().map(escape).unwrap_or_default(),
            )
        };

        let mut batch = ResponseBatch::new(command, round, BatchPhase::Chrome);
        batch.push(fragment_ids::HEADER, self.renderer.header(&self.definition));
        batch.push(fragment_ids::TITLE, title);
        batch.push(fragment_ids::DESCRIPTION, description);
        batch.push(
            fragment_ids::CONTENT,
            self.renderer.page_content(definition, &self.parameters, page.states()),
        );
        batch.push(fragment_ids::CONTROLS, self.controls_html());
        batch.focused_field = page.focused_field().map(str::to_string);
        self.batch_ready.emit(batch);

        self.run_validation(command, round, Vec::new());
    }

    fn run_validation(&mut self, command: Command, round: RoundId, extra: Vec<Fragment>) {
        let _span = PerfSpan::new(span_names::VALIDATION_ROUND);
        let Some(page_id) = self.current_page_id().map(str::to_string) else {
            return;
        };

        let current = self.parameters.clone();
        let previous = std::mem::replace(&mut self.previous, current.clone());
        let ctx = ValidationContext::new(&current, &previous);

        for page in self.pages.pages_mut() {
            if page.id() != page_id {
                refresh_completion(page, &ctx);
            }
        }

        let Some(page) = self.pages.page_mut(&page_id) else {
            return;
        };
        let sync = page
            .definition()
            .validator
            .as_ref()
            .map(|validator| validator.validate(&ctx))
            .unwrap_or_default();
        let futures = page
            .definition()
            .async_validator
            .as_ref()
            .map(|validator| validator.start(&ctx))
            .unwrap_or_default();

        let output = ValidationPass::new(self.renderer.as_ref(), &current).apply(page, &sync);
        page.set_complete(!output.has_error);

        let mut batch = ResponseBatch::new(command, round, BatchPhase::Validation);
        batch.contents = extra;
        batch.contents.extend(output.fragments);

        tracing::debug!(
            target: targets::VALIDATION,
            page = %page_id,
            %round,
            complete = page.is_complete(),
            messages = sync.items.len(),
            pending = futures.len(),
            "validation round started"
        );

        if futures.is_empty() {
            batch
                .contents
                .extend(placeholder_fragments(page.definition(), &output.messaged));
        } else {
            self.progress = Some(RoundProgress {
                id: round,
                command,
                page_id: page_id.clone(),
                outstanding: futures.len(),
                messaged: output.messaged,
            });
            for future in futures {
                let page_id = page_id.clone();
                self.pending.push(
                    future
                        .map(move |response| AsyncSettlement {
                            round,
                            page_id,
                            response,
                        })
                        .boxed(),
                );
            }
        }

        batch.push(fragment_ids::CONTROLS, self.controls_html());
        self.batch_ready.emit(batch);
    }

    /// Whether asynchronous validators of the latest round are outstanding.
    pub fn has_pending_validation(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Wait for the next asynchronous validator to resolve.
    ///
    /// Resolves to `None` immediately when nothing is pending.
    pub fn next_settlement(&mut self) -> futures_util::stream::Next<'_, PendingValidations> {
        self.pending.next()
    }

    /// Apply one asynchronous result and emit its batch.
    ///
    /// Results from a superseded round are dropped. When the last validator
    /// of the round settles, a placeholder batch follows.
    pub fn apply_settlement(&mut self, settlement: AsyncSettlement) {
        if self.is_closed() {
            return;
        }
        let Some(progress) = self
            .progress
            .as_mut()
            .filter(|progress| progress.id == settlement.round)
        else {
            tracing::debug!(
                target: targets::VALIDATION,
                stale = %settlement.round,
                latest = %self.round,
                "suppressing stale validation result"
            );
            return;
        };

        progress.outstanding = progress.outstanding.saturating_sub(1);
        let command = progress.command;
        let round = progress.id;
        let Some(page) = self.pages.page_mut(&progress.page_id) else {
            return;
        };

        let output =
            ValidationPass::new(self.renderer.as_ref(), &self.parameters).apply(page, &settlement.response);
        if output.has_error {
            page.set_complete(false);
        }
        progress.messaged.extend(output.messaged.iter().cloned());

        let settled = progress.outstanding == 0;
        let placeholders = if settled {
            placeholder_fragments(page.definition(), &progress.messaged)
        } else {
            Vec::new()
        };
        if settled {
            self.progress = None;
        }

        let controls = self.controls_html();
        let mut batch = ResponseBatch::new(command, round, BatchPhase::AsyncValidation);
        batch.contents = output.fragments;
        batch.push(fragment_ids::CONTROLS, controls.clone());
        self.batch_ready.emit(batch);

        if settled {
            tracing::debug!(target: targets::VALIDATION, %round, "validation round settled");
            let mut batch = ResponseBatch::new(command, round, BatchPhase::Settled);
            batch.contents = placeholders;
            batch.push(fragment_ids::CONTROLS, controls);
            self.batch_ready.emit(batch);
        }
    }

    /// Drive every pending asynchronous validator to completion.
    pub async fn settle(&mut self) {
        while let Some(settlement) = self.pending.next().await {
            self.apply_settlement(settlement);
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Recompute the current page's completion from the latest values.
    ///
    /// Errors delivered asynchronously for the same values still count;
    /// once the values change, only the synchronous validator decides.
    fn recheck_current_page(&mut self, values_changed: bool) {
        let Some(page_id) = self.current_page_id().map(str::to_string) else {
            return;
        };
        let ctx = ValidationContext::new(&self.parameters, &self.previous);
        let Some(page) = self.pages.page_mut(&page_id) else {
            return;
        };
        let sync_ok = page
            .definition()
            .validator
            .as_ref()
            .is_none_or(|validator| !validator.validate(&ctx).has_error());
        let complete = sync_ok && (values_changed || page.is_complete());
        if complete != page.is_complete() {
            tracing::debug!(target: targets::NAVIGATION, page = %page_id, complete, "completion rechecked");
        }
        page.set_complete(complete);
    }

    fn resolve(&self, direction: Direction, from: &str) -> Option<String> {
        let page = self.pages.page(from)?;
        let resolver = self
            .definition
            .workflow_manager
            .as_deref()
            .and_then(|manager| match direction {
                Direction::Next => manager.next_page_resolver(),
                Direction::Back => manager.previous_page_resolver(),
            });

        let Some(resolver) = resolver else {
            let linear = match direction {
                Direction::Next => self.pages.next_page(from),
                Direction::Back => self.pages.previous_page(from),
            };
            return linear.map(|page| page.id().to_string());
        };

        match resolver.resolve(page, &self.pages, &self.parameters) {
            Ok(Some(id)) if self.pages.page(&id).is_some() => Some(id),
            Ok(Some(id)) => {
                tracing::debug!(target: targets::NAVIGATION, from, to = %id, "resolver named an unknown page");
                None
            }
            Ok(None) => None,
            Err(e) => {
                tracing::debug!(target: targets::NAVIGATION, from, error = %e, "page resolver failed");
                None
            }
        }
    }

    fn controls_html(&self) -> String {
        self.renderer.controls(&self.definition.buttons, self.button_state())
    }

    fn emit_controls(&self, command: Command, round: RoundId) {
        let mut batch = ResponseBatch::new(command, round, BatchPhase::Controls);
        batch.push(fragment_ids::CONTROLS, self.controls_html());
        self.batch_ready.emit(batch);
    }

    fn close_with(&mut self, outcome: WizardOutcome) {
        self.state = ControllerState::Closed;
        self.pending = FuturesUnordered::new();
        self.progress = None;
        webview_wizard_core::wizard_info!(wizard = %self.id, finished = outcome.finished, "wizard closed");
        self.closed.emit(outcome);
    }
}

/// Recompute a page's completion from its synchronous validator.
fn refresh_completion(page: &mut WizardPage, ctx: &ValidationContext<'_>) {
    let complete = page
        .definition()
        .validator
        .as_ref()
        .map(|validator| !validator.validate(ctx).has_error());
    if let Some(complete) = complete {
        page.set_complete(complete);
    }
}
