mod helpers;

use helpers::*;
use watch_exchange::config::FeatureFlags;
use watch_exchange::entities::content_item::ContentStatus;
use watch_exchange::entities::exchange_event::ExchangeEvent;
use watch_exchange::entities::participant::{participant_thing, Tier};
use watch_exchange::entities::task::TaskStatus;
use watch_exchange::interfaces::repositories::watch_record_ifce::WatchRecordRepositoryInterface;
use watch_exchange::middleware::error::AppError;
use watch_exchange::services::content_service::ContentService;
use watch_exchange::services::ledger_service::LedgerService;
use watch_exchange::services::matching_service::{DenyReason, MatchOutcome, MatchingService};
use watch_exchange::services::obligation_service::ObligationService;
use watch_exchange::services::participant_service::ParticipantService;
use watch_exchange::services::strike_service::StrikeService;
use watch_exchange::services::task_service::TaskService;

#[tokio::test]
async fn assigns_item_and_debits_owner() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "owner", 10).await;
    register_with_credit(state, "viewer", 3).await;
    let item = upload(state, "owner", 4).await;

    let assignment = match request(state, "viewer").await {
        MatchOutcome::Assigned(assignment) => assignment,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(assignment.item.id, item.id);
    assert_eq!(assignment.min_watch_minutes, 2);
    assert_eq!(assignment.task.status, TaskStatus::Assigned);
    assert_eq!(assignment.task.assignee, participant_thing("viewer"));
    assert_eq!(assignment.task.assigner, participant_thing("owner"));
    assert!(assignment.task.obligation.is_none());

    let stored = ContentService::new(state)
        .get_item(&key(&item.id))
        .await
        .unwrap();
    assert_eq!(stored.status, ContentStatus::InProgress);

    let ledger = LedgerService::new(state);
    assert_eq!(ledger.balance("owner").await.unwrap(), 6);
    assert_eq!(ledger.balance("viewer").await.unwrap(), 3);

    let watched = state
        .db
        .watch_records
        .has_watched(&participant_thing("viewer"), &item.id)
        .await
        .unwrap();
    assert!(watched);
    let history = state
        .db
        .watch_records
        .list_by_participant(&participant_thing("viewer"))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content_item, item.id);

    let live = TaskService::new(state).active_task("viewer").await.unwrap();
    assert_eq!(live.map(|t| t.id), Some(assignment.task.id.clone()));

    let events = engine.gateway.events_for("viewer");
    assert!(matches!(
        events.as_slice(),
        [ExchangeEvent::AssignmentCreated { min_watch_minutes: 2, duration: 4, via_obligation: false, .. }]
    ));
}

#[tokio::test]
async fn unauthorized_requester_is_denied_first() {
    let engine = create_engine().await;
    let state = &engine.state;
    register(state, "viewer").await;
    StrikeService::new(state).block("viewer").await.unwrap();
    engine.gatekeeper.deny("viewer");

    let outcome = request(state, "viewer").await;
    assert!(matches!(outcome, MatchOutcome::Denied(DenyReason::NotAuthorized)));
}

#[tokio::test]
async fn blocked_and_paused_requesters_are_denied() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "owner", 5).await;
    register_with_credit(state, "blocked", 5).await;
    register_with_credit(state, "paused", 5).await;
    upload(state, "owner", 2).await;

    StrikeService::new(state).block("blocked").await.unwrap();
    ParticipantService::new(state).pause("paused").await.unwrap();

    assert!(matches!(
        request(state, "blocked").await,
        MatchOutcome::Denied(DenyReason::Blocked)
    ));
    assert!(matches!(
        request(state, "paused").await,
        MatchOutcome::Denied(DenyReason::Paused)
    ));

    ParticipantService::new(state).resume("paused").await.unwrap();
    assert!(matches!(request(state, "paused").await, MatchOutcome::Assigned(_)));
}

#[tokio::test]
async fn second_request_with_live_task_is_denied() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "owner", 10).await;
    register_with_credit(state, "viewer", 10).await;
    upload(state, "owner", 1).await;
    upload(state, "owner", 1).await;

    request_assigned(state, "viewer").await;
    assert!(matches!(
        request(state, "viewer").await,
        MatchOutcome::Denied(DenyReason::AlreadyActive)
    ));

    submit(state, "viewer").await;
    assert!(matches!(
        request(state, "viewer").await,
        MatchOutcome::Denied(DenyReason::AlreadyActive)
    ));
}

#[tokio::test]
async fn credit_gating_follows_flag() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "owner", 5).await;
    register(state, "viewer").await;
    upload(state, "owner", 3).await;

    assert!(matches!(
        request(state, "viewer").await,
        MatchOutcome::Denied(DenyReason::NoCredit)
    ));

    let no_credits = FeatureFlags {
        task_credits: false,
        ..FeatureFlags::default()
    };
    let outcome = MatchingService::new(state)
        .request_assignment("viewer", &no_credits)
        .await
        .unwrap();
    assert!(matches!(outcome, MatchOutcome::Assigned(_)));
    // nothing is debited while credits are off
    assert_eq!(LedgerService::new(state).balance("owner").await.unwrap(), 5);
}

#[tokio::test]
async fn negative_owner_balance_does_not_stop_matching() {
    let engine = create_engine().await;
    let state = &engine.state;
    register(state, "owner").await;
    register_with_credit(state, "viewer", 1).await;
    upload(state, "owner", 5).await;

    request_assigned(state, "viewer").await;
    assert_eq!(LedgerService::new(state).balance("owner").await.unwrap(), -5);
}

#[tokio::test]
async fn own_items_and_empty_pool_yield_nothing() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "solo", 5).await;

    assert!(matches!(request(state, "solo").await, MatchOutcome::NoneAvailable));
    upload(state, "solo", 2).await;
    assert!(matches!(request(state, "solo").await, MatchOutcome::NoneAvailable));
}

#[tokio::test]
async fn unregistered_requester_is_not_found() {
    let engine = create_engine().await;
    let result = MatchingService::new(&engine.state)
        .request_assignment("ghost", &flags())
        .await;
    assert!(matches!(result, Err(AppError::EntityFailIdNotFound { .. })));
}

#[tokio::test]
async fn watched_item_is_never_assigned_again() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "owner", 10).await;
    register_with_credit(state, "viewer", 10).await;
    upload(state, "owner", 1).await;

    complete_one(state, "viewer", "owner").await;
    assert!(matches!(request(state, "viewer").await, MatchOutcome::NoneAvailable));
}

#[tokio::test]
async fn higher_tier_owner_goes_first() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "bronze", 10).await;
    register_with_credit(state, "gold", 10).await;
    register_with_credit(state, "viewer", 10).await;
    ParticipantService::new(state)
        .set_tier("gold", Tier::Gold)
        .await
        .unwrap();
    upload(state, "bronze", 1).await;
    let gold_item = upload(state, "gold", 1).await;

    let task = request_assigned(state, "viewer").await;
    assert_eq!(task.content_item, gold_item.id);
}

#[tokio::test]
async fn fewer_views_win_within_a_tier() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "owner_a", 10).await;
    register_with_credit(state, "owner_b", 10).await;
    register_with_credit(state, "first", 10).await;
    register_with_credit(state, "second", 10).await;
    let seen = upload(state, "owner_a", 1).await;
    let fresh = upload(state, "owner_b", 1).await;

    // give `seen` one view through the no-reciprocal path
    let general_only = FeatureFlags {
        reciprocal_tasks: false,
        ..FeatureFlags::default()
    };
    ContentService::new(state)
        .remove_item("owner_b", &key(&fresh.id))
        .await
        .unwrap();
    complete_one(state, "first", "owner_a").await;
    let fresh = upload(state, "owner_b", 1).await;

    let outcome = MatchingService::new(state)
        .request_assignment("second", &general_only)
        .await
        .unwrap();
    match outcome {
        MatchOutcome::Assigned(assignment) => {
            assert_eq!(assignment.item.id, fresh.id);
            assert_ne!(assignment.item.id, seen.id);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn pending_obligation_takes_precedence() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "p", 10).await;
    register_with_credit(state, "q", 10).await;
    let gold = register_with_credit(state, "gold", 10).await;
    ParticipantService::new(state)
        .set_tier(&key(&gold.id), Tier::Gold)
        .await
        .unwrap();
    upload(state, "gold", 1).await;
    let q_item = upload(state, "q", 2).await;

    let obligation = ObligationService::new(state).enqueue("q", "p").await.unwrap();

    match request(state, "p").await {
        MatchOutcome::Assigned(assignment) => {
            assert_eq!(assignment.item.id, q_item.id);
            assert_eq!(assignment.task.obligation, Some(obligation.id));
        }
        other => panic!("unexpected {other:?}"),
    }
    let events = engine.gateway.events_for("p");
    assert!(matches!(
        events.last(),
        Some(ExchangeEvent::AssignmentCreated { via_obligation: true, .. })
    ));
}

#[tokio::test]
async fn obligation_without_eligible_item_falls_back() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "p", 10).await;
    register_with_credit(state, "q", 10).await;
    register_with_credit(state, "other", 10).await;
    let other_item = upload(state, "other", 1).await;
    ObligationService::new(state).enqueue("q", "p").await.unwrap();

    let task = request_assigned(state, "p").await;
    assert_eq!(task.content_item, other_item.id);
    assert!(task.obligation.is_none());
    // still owed
    assert_eq!(ObligationService::new(state).count_owed_by("q").await.unwrap(), 1);
}

#[tokio::test]
async fn only_the_oldest_obligation_is_tried() {
    let engine = create_engine().await;
    let state = &engine.state;
    for id in ["p", "q", "r", "gold"] {
        register_with_credit(state, id, 10).await;
    }
    ParticipantService::new(state)
        .set_tier("gold", Tier::Gold)
        .await
        .unwrap();
    upload(state, "r", 1).await;
    let gold_item = upload(state, "gold", 1).await;
    let obligations = ObligationService::new(state);
    // q has nothing to show, r does
    let oldest = obligations.enqueue("q", "p").await.unwrap();
    obligations.enqueue("r", "p").await.unwrap();

    let task = request_assigned(state, "p").await;
    assert_eq!(task.content_item, gold_item.id);
    assert!(task.obligation.is_none());

    assert_eq!(obligations.count_owed_by("q").await.unwrap(), 1);
    assert_eq!(obligations.count_owed_by("r").await.unwrap(), 1);
    let head = obligations.peek_oldest_pending("p").await.unwrap().unwrap();
    assert_eq!(head.id, oldest.id);
}

#[tokio::test]
async fn reciprocal_path_is_skipped_when_disabled() {
    let engine = create_engine().await;
    let state = &engine.state;
    register_with_credit(state, "p", 10).await;
    register_with_credit(state, "q", 10).await;
    register_with_credit(state, "gold", 10).await;
    ParticipantService::new(state)
        .set_tier("gold", Tier::Gold)
        .await
        .unwrap();
    upload(state, "q", 1).await;
    let gold_item = upload(state, "gold", 1).await;
    ObligationService::new(state).enqueue("q", "p").await.unwrap();

    let flags = FeatureFlags {
        reciprocal_tasks: false,
        ..FeatureFlags::default()
    };
    match MatchingService::new(state)
        .request_assignment("p", &flags)
        .await
        .unwrap()
    {
        MatchOutcome::Assigned(assignment) => assert_eq!(assignment.item.id, gold_item.id),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn delivery_failure_does_not_undo_assignment() {
    let state = create_engine_with_failing_gateway().await;
    register_with_credit(&state, "owner", 5).await;
    register_with_credit(&state, "viewer", 5).await;
    upload(&state, "owner", 2).await;

    let task = request_assigned(&state, "viewer").await;
    assert_eq!(task.status, TaskStatus::Assigned);
}
