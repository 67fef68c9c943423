//! Ordering and cancellation of asynchronous validation rounds.

mod common;

use std::sync::Arc;

use common::{init_tracing, last_body, params, Recorder};
use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use webview_wizard::prelude::*;
use webview_wizard::validation::PLACEHOLDER;

type Senders = Arc<Mutex<Vec<oneshot::Sender<ValidatorResponse>>>>;

/// Two pages; page1 starts two asynchronous checks per round whose results
/// the test supplies through the returned senders.
fn setup() -> (WizardController, Recorder, Senders) {
    init_tracing();
    let senders: Senders = Arc::default();
    let senders_clone = senders.clone();

    let definition = WizardDefinition::new("Async")
        .with_page(
            PageDefinition::new("page1")
                .with_field(FieldDefinition::textbox("a", "A"))
                .with_field(FieldDefinition::textbox("b", "B"))
                .with_field(FieldDefinition::textbox("c", "C"))
                .with_validator(|ctx| {
                    if ctx.parameters.text("c") == "bad" {
                        ValidatorResponse::new().with_item(Severity::Warn, "c", "c looks odd")
                    } else {
                        ValidatorResponse::new()
                    }
                })
                .with_async_validator(move |_ctx| {
                    (0..2)
                        .map(|_| {
                            let (tx, rx) = oneshot::channel();
                            senders_clone.lock().push(tx);
                            rx.map(Result::unwrap_or_default).boxed()
                        })
                        .collect()
                }),
        )
        .with_page(PageDefinition::new("page2"));

    let controller = WizardController::new("async", definition, &ParameterMap::new()).unwrap();
    let recorder = Recorder::attach(&controller);
    (controller, recorder, senders)
}

fn take_senders(senders: &Senders) -> Vec<oneshot::Sender<ValidatorResponse>> {
    std::mem::take(&mut *senders.lock())
}

#[tokio::test]
async fn test_async_results_follow_sync_batch() {
    let (mut controller, recorder, senders) = setup();
    controller.dispatch(Command::Ready, ParameterMap::new()).await.unwrap();

    let batches = recorder.take();
    assert_eq!(batches.len(), 2);
    let sync = &batches[1];
    assert_eq!(sync.phase, BatchPhase::Validation);
    assert!(sync.fragment("aValidation").is_none());
    assert!(controller.has_pending_validation());

    let mut round = take_senders(&senders);
    let first = round.remove(0);
    let second = round.remove(0);

    // Resolution order, not start order, decides batch order.
    second
        .send(ValidatorResponse::new().with_item(Severity::Warn, "b", "b is unusual"))
        .unwrap();
    let settlement = controller.next_settlement().await.unwrap();
    controller.apply_settlement(settlement);

    let batches = recorder.take();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].phase, BatchPhase::AsyncValidation);
    assert!(batches[0].fragment("bValidation").unwrap().body.contains("b is unusual"));
    assert!(controller.current_page().unwrap().is_complete());

    first
        .send(ValidatorResponse::new().with_item(Severity::Error, "a", "a is taken"))
        .unwrap();
    controller.settle().await;

    let batches = recorder.take();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].phase, BatchPhase::AsyncValidation);
    assert!(batches[0].fragment("aValidation").unwrap().body.contains("a is taken"));

    let settled = &batches[1];
    assert_eq!(settled.phase, BatchPhase::Settled);
    assert_eq!(settled.ids(), vec!["cValidation", "wizardControls"]);
    assert_eq!(settled.fragment("cValidation").unwrap().body, PLACEHOLDER);

    assert!(!controller.has_pending_validation());
    assert!(!controller.current_page().unwrap().is_complete());
    assert!(!controller.button_state().next);
}

#[tokio::test]
async fn test_sync_message_survives_settled_placeholders() {
    let (mut controller, recorder, senders) = setup();
    controller.dispatch(Command::Ready, ParameterMap::new()).await.unwrap();
    take_senders(&senders);

    controller
        .dispatch(Command::Validate, params([("c", "bad")]))
        .await
        .unwrap();
    for sender in take_senders(&senders) {
        sender.send(ValidatorResponse::new()).unwrap();
    }
    controller.settle().await;

    let batches = recorder.take();
    assert!(last_body(&batches, "cValidation").unwrap().contains("c looks odd"));
    let settled = batches.last().unwrap();
    assert_eq!(settled.phase, BatchPhase::Settled);
    assert_eq!(settled.ids(), vec!["aValidation", "bValidation", "wizardControls"]);
}

#[tokio::test]
async fn test_new_round_drops_outstanding_validators() {
    let (mut controller, recorder, senders) = setup();
    controller.dispatch(Command::Ready, ParameterMap::new()).await.unwrap();
    let stale = take_senders(&senders);

    controller
        .dispatch(Command::Validate, params([("a", "x")]))
        .await
        .unwrap();
    let fresh = take_senders(&senders);
    let validate_round = controller.round();

    // The superseded futures were dropped along with their receivers.
    for sender in stale {
        assert!(sender.is_closed());
        assert!(sender
            .send(ValidatorResponse::new().with_item(Severity::Error, "a", "stale"))
            .is_err());
    }

    for sender in fresh {
        sender.send(ValidatorResponse::new()).unwrap();
    }
    controller.settle().await;

    let batches = recorder.take();
    let async_batches: Vec<_> = batches
        .iter()
        .filter(|batch| matches!(batch.phase, BatchPhase::AsyncValidation | BatchPhase::Settled))
        .collect();
    assert_eq!(async_batches.len(), 3);
    assert!(async_batches.iter().all(|batch| batch.round == validate_round));
    assert!(batches.iter().all(|batch| {
        batch
            .fragments_for("aValidation")
            .all(|fragment| !fragment.body.contains("stale"))
    }));
    assert!(controller.current_page().unwrap().is_complete());
}

#[tokio::test]
async fn test_rounds_never_decrease() {
    let (mut controller, recorder, senders) = setup();
    controller.dispatch(Command::Ready, ParameterMap::new()).await.unwrap();
    for _ in 0..3 {
        controller.dispatch(Command::Validate, ParameterMap::new()).await.unwrap();
    }
    for sender in take_senders(&senders) {
        let _ = sender.send(ValidatorResponse::new());
    }
    controller.settle().await;

    let rounds: Vec<RoundId> = recorder.take().iter().map(|batch| batch.round).collect();
    assert!(rounds.windows(2).all(|pair| pair[0] <= pair[1]));
}
