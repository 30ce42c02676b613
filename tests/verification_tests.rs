mod helpers;

use helpers::*;
use watch_exchange::config::FeatureFlags;
use watch_exchange::entities::content_item::ContentStatus;
use watch_exchange::entities::exchange_event::ExchangeEvent;
use watch_exchange::entities::participant::participant_thing;
use watch_exchange::entities::task::TaskStatus;
use watch_exchange::interfaces::repositories::obligation_ifce::ObligationRepositoryInterface;
use watch_exchange::middleware::error::AppError;
use watch_exchange::services::content_service::ContentService;
use watch_exchange::services::ledger_service::LedgerService;
use watch_exchange::services::obligation_service::ObligationService;
use watch_exchange::services::participant_service::ParticipantService;
use watch_exchange::services::task_service::{SubmitOutcome, TaskService, VerifyOutcome};

#[tokio::test]
async fn blank_evidence_is_a_no_op() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "owner", 5).await;
    register_with_credit(state, "viewer", 5).await;
    upload(state, "owner", 2).await;
    let task = request_assigned(state, "viewer").await;

    let service = TaskService::new(state);
    let outcome = service.submit_proof("viewer", None).await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::EvidenceMissing));
    let outcome = service
        .submit_proof("viewer", Some("   ".to_string()))
        .await
        .unwrap();
    assert!(matches!(outcome, SubmitOutcome::EvidenceMissing));

    let stored = service.get_task(&key(&task.id)).await.unwrap();
    assert_eq!(stored.status, TaskStatus::Assigned);
    assert!(engine.gateway.events_for("owner").is_empty());
}

#[tokio::test]
async fn proof_submission_notifies_owner() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "owner", 5).await;
    register_with_credit(state, "viewer", 5).await;
    upload(state, "owner", 2).await;
    request_assigned(state, "viewer").await;

    let task = submit(state, "viewer").await;
    assert_eq!(task.status, TaskStatus::ProofSubmitted);
    assert!(task.proof.is_some());
    assert!(task.proof_submitted_at.is_some());

    let owner_events = engine.gateway.events_for("owner");
    assert!(matches!(
        owner_events.as_slice(),
        [ExchangeEvent::VerificationRequested { assignee, .. }] if assignee == "viewer"
    ));

    // a second submission has no assigned task to target
    let again = TaskService::new(state)
        .submit_proof("viewer", Some("more".to_string()))
        .await;
    assert!(matches!(again, Err(AppError::EntityFailIdNotFound { .. })));
}

#[tokio::test]
async fn accept_completes_and_credits() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "owner", 10).await;
    register_with_credit(state, "viewer", 1).await;
    let item = upload(state, "owner", 3).await;
    request_assigned(state, "viewer").await;
    let task = submit(state, "viewer").await;

    let outcome = TaskService::new(state)
        .accept_proof("owner", &key(&task.id), &flags())
        .await
        .unwrap();
    let accepted = match outcome {
        VerifyOutcome::Accepted(task) => task,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(accepted.status, TaskStatus::Completed);
    assert!(accepted.resolved_at.is_some());

    let item = ContentService::new(state)
        .get_item(&key(&item.id))
        .await
        .unwrap();
    assert_eq!(item.status, ContentStatus::Active);
    assert_eq!(item.view_count, 1);

    let ledger = LedgerService::new(state);
    assert_eq!(ledger.balance("viewer").await.unwrap(), 4);
    assert_eq!(ledger.balance("owner").await.unwrap(), 7);

    let viewer = ParticipantService::new(state).get("viewer").await.unwrap();
    assert_eq!(viewer.completed_task_count, 1);

    let obligation = state
        .db
        .obligations
        .oldest_pending(&participant_thing("viewer"))
        .await
        .unwrap()
        .expect("obligation created");
    assert_eq!(obligation.owed_by, participant_thing("owner"));

    let viewer_events = engine.gateway.events_for("viewer");
    assert!(viewer_events
        .iter()
        .any(|e| matches!(e, ExchangeEvent::ProofAccepted { credited: 3, .. })));
    assert!(viewer_events
        .iter()
        .any(|e| matches!(e, ExchangeEvent::RatingRequested { .. })));
}

#[tokio::test]
async fn duplicate_accept_applies_once() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "owner", 10).await;
    register_with_credit(state, "viewer", 1).await;
    upload(state, "owner", 2).await;
    request_assigned(state, "viewer").await;
    let task = submit(state, "viewer").await;
    let service = TaskService::new(state);
    let task_id = key(&task.id);

    let first = service.accept_proof("owner", &task_id, &flags()).await.unwrap();
    assert!(matches!(first, VerifyOutcome::Accepted(_)));
    let second = service.accept_proof("owner", &task_id, &flags()).await.unwrap();
    assert!(matches!(second, VerifyOutcome::AlreadyProcessed));
    let late_reject = service
        .reject_proof("owner", &task_id, None, &flags())
        .await
        .unwrap();
    assert!(matches!(late_reject, VerifyOutcome::AlreadyProcessed));

    assert_eq!(LedgerService::new(state).balance("viewer").await.unwrap(), 3);
    assert_eq!(
        ObligationService::new(state).count_owed_by("owner").await.unwrap(),
        1
    );
    let viewer = ParticipantService::new(state).get("viewer").await.unwrap();
    assert_eq!(viewer.completed_task_count, 1);
    assert_eq!(viewer.strike_count, 0);
}

#[tokio::test]
async fn reject_fails_task_and_strikes_assignee() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "owner", 10).await;
    register_with_credit(state, "viewer", 1).await;
    let item = upload(state, "owner", 2).await;
    request_assigned(state, "viewer").await;
    let task = submit(state, "viewer").await;

    let outcome = TaskService::new(state)
        .reject_proof(
            "owner",
            &key(&task.id),
            Some("screenshot is cropped".to_string()),
            &flags(),
        )
        .await
        .unwrap();
    let (rejected, strike_count) = match outcome {
        VerifyOutcome::Rejected { task, strike_count } => (task, strike_count),
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(rejected.status, TaskStatus::Failed);
    assert_eq!(
        rejected.rejection_reason.as_deref(),
        Some("screenshot is cropped")
    );
    assert_eq!(strike_count, 1);

    let item = ContentService::new(state)
        .get_item(&key(&item.id))
        .await
        .unwrap();
    assert_eq!(item.status, ContentStatus::Active);
    assert_eq!(item.view_count, 0);

    // no credit, no obligation on rejection
    assert_eq!(LedgerService::new(state).balance("viewer").await.unwrap(), 1);
    assert_eq!(
        ObligationService::new(state).count_owed_by("owner").await.unwrap(),
        0
    );

    let events = engine.gateway.events_for("viewer");
    assert!(events.iter().any(|e| matches!(
        e,
        ExchangeEvent::ProofRejected { strike_count: 1, reason: Some(_), .. }
    )));
}

#[tokio::test]
async fn only_the_assigner_may_verify() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "owner", 10).await;
    register_with_credit(state, "viewer", 1).await;
    register(state, "intruder").await;
    upload(state, "owner", 2).await;
    request_assigned(state, "viewer").await;
    let task = submit(state, "viewer").await;

    let result = TaskService::new(state)
        .accept_proof("intruder", &key(&task.id), &flags())
        .await;
    assert!(matches!(result, Err(AppError::EntityFailIdNotFound { .. })));
    let result = TaskService::new(state)
        .accept_proof("viewer", &key(&task.id), &flags())
        .await;
    assert!(matches!(result, Err(AppError::EntityFailIdNotFound { .. })));
}

#[tokio::test]
async fn verifying_before_proof_is_already_processed() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "owner", 10).await;
    register_with_credit(state, "viewer", 1).await;
    upload(state, "owner", 2).await;
    let task = request_assigned(state, "viewer").await;

    let outcome = TaskService::new(state)
        .accept_proof("owner", &key(&task.id), &flags())
        .await
        .unwrap();
    assert!(matches!(outcome, VerifyOutcome::AlreadyProcessed));
    let stored = TaskService::new(state).get_task(&key(&task.id)).await.unwrap();
    assert_eq!(stored.status, TaskStatus::Assigned);
}

#[tokio::test]
async fn earmarked_obligation_resolves_on_success_only() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "p", 10).await;
    register_with_credit(state, "q", 10).await;
    upload(state, "q", 1).await;
    upload(state, "q", 1).await;
    let obligations = ObligationService::new(state);
    obligations.enqueue("q", "p").await.unwrap();

    // failed attempt keeps the debt
    let first = request_assigned(state, "p").await;
    assert!(first.obligation.is_some());
    submit(state, "p").await;
    TaskService::new(state)
        .reject_proof("q", &key(&first.id), None, &flags())
        .await
        .unwrap();
    assert_eq!(obligations.count_owed_by("q").await.unwrap(), 1);

    // success settles it
    let second = request_assigned(state, "p").await;
    assert_eq!(second.obligation, first.obligation);
    submit(state, "p").await;
    TaskService::new(state)
        .accept_proof("q", &key(&second.id), &flags())
        .await
        .unwrap();

    // the settled debt is gone; acceptance opened a new one owed by q to p
    let pending = state
        .db
        .obligations
        .oldest_pending(&participant_thing("p"))
        .await
        .unwrap()
        .expect("new obligation");
    assert_ne!(Some(pending.id), first.obligation);
    assert_eq!(obligations.count_owed_by("q").await.unwrap(), 1);
}

#[tokio::test]
async fn pending_verifications_grouped_by_owner() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "busy", 10).await;
    register_with_credit(state, "quiet", 10).await;
    for viewer in ["v1", "v2", "v3"] {
        register_with_credit(state, viewer, 5).await;
    }
    upload(state, "busy", 1).await;
    upload(state, "busy", 1).await;
    upload(state, "quiet", 1).await;

    let flags = FeatureFlags {
        reciprocal_tasks: false,
        ..FeatureFlags::default()
    };
    let matching = watch_exchange::services::matching_service::MatchingService::new(state);
    for viewer in ["v1", "v2", "v3"] {
        matching.request_assignment(viewer, &flags).await.unwrap();
    }
    submit(state, "v1").await;

    let pending = TaskService::new(state).pending_verifications().await.unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].owner, participant_thing("busy"));
    assert_eq!(pending[0].total(), 2);
    assert_eq!(pending[1].owner, participant_thing("quiet"));
    let submitted: usize = pending.iter().map(|p| p.awaiting_verification).sum();
    assert_eq!(submitted, 1);
}
