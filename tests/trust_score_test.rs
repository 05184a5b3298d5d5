use chrono::{Duration, Utc};
use quickcrew::application::ports::TrustStore;
use quickcrew::domain::{
    CustomerId, TrustAction, TrustActor, TrustPolicy, WorkerId,
};
use quickcrew::infrastructure::persistence::InMemoryStore;
use rust_decimal_macros::dec;

fn store() -> InMemoryStore {
    InMemoryStore::new(TrustPolicy::default())
}

#[tokio::test]
async fn given_large_penalty_when_applied_then_score_clamps_at_zero() {
    let store = store();
    let actor = TrustActor::Worker(WorkerId::new());

    let mutation = store
        .apply_delta(actor, dec!(-9.0), TrustAction::ManualAdjustment, None, "fraud finding")
        .await
        .unwrap();

    assert_eq!(mutation.new_score, dec!(0));
}

#[tokio::test]
async fn given_large_reward_when_applied_then_score_clamps_at_five() {
    let store = store();
    let actor = TrustActor::Worker(WorkerId::new());

    let mutation = store
        .apply_delta(actor, dec!(2.0), TrustAction::JobCompleted, None, "milestone bonus")
        .await
        .unwrap();

    assert_eq!(mutation.new_score, dec!(5));
}

#[tokio::test]
async fn given_score_dropping_below_threshold_then_actor_locks_for_48_hours() {
    let store = store();
    let actor = TrustActor::Customer(CustomerId::new());

    let before = Utc::now();
    let mutation = store
        .apply_delta(actor, dec!(-3.2), TrustAction::ManualAdjustment, None, "chargeback")
        .await
        .unwrap();

    assert_eq!(mutation.new_score, dec!(1.8));
    let locked_until = mutation.locked_until.unwrap();
    let lower = before + Duration::hours(48);
    let upper = Utc::now() + Duration::hours(48);
    assert!(locked_until >= lower && locked_until <= upper);

    assert!(store.is_locked(actor).await.unwrap());
}

#[tokio::test]
async fn given_locked_actor_when_score_recovers_then_lock_clears() {
    let store = store();
    let actor = TrustActor::Worker(WorkerId::new());

    store
        .apply_delta(actor, dec!(-3.2), TrustAction::ManualAdjustment, None, "no-show streak")
        .await
        .unwrap();
    assert!(store.is_locked(actor).await.unwrap());

    let mutation = store
        .apply_delta(actor, dec!(0.5), TrustAction::ManualAdjustment, None, "appeal granted")
        .await
        .unwrap();

    assert_eq!(mutation.new_score, dec!(2.3));
    assert!(mutation.locked_until.is_none());
    assert!(!store.is_locked(actor).await.unwrap());
}

#[tokio::test]
async fn given_sequence_of_deltas_then_ledger_is_newest_first_and_chained() {
    let store = store();
    let actor = TrustActor::Worker(WorkerId::new());

    store
        .apply_delta(actor, dec!(-0.10), TrustAction::RatingReceived, None, "1 star rating")
        .await
        .unwrap();
    store
        .apply_delta(actor, dec!(0.05), TrustAction::RatingReceived, None, "5 star rating")
        .await
        .unwrap();

    let ledger = store.ledger(actor).await.unwrap();
    assert_eq!(ledger.len(), 2);

    assert_eq!(ledger[0].change_amount, dec!(0.05));
    assert_eq!(ledger[0].old_score, dec!(4.90));
    assert_eq!(ledger[0].new_score, dec!(4.95));

    assert_eq!(ledger[1].change_amount, dec!(-0.10));
    assert_eq!(ledger[1].old_score, dec!(5));
    assert_eq!(ledger[1].new_score, dec!(4.90));
}

#[tokio::test]
async fn given_unknown_actor_when_scored_then_default_is_five() {
    let store = store();
    let actor = TrustActor::Customer(CustomerId::new());

    assert_eq!(store.score(actor).await.unwrap(), Some(dec!(5)));
    assert!(!store.is_locked(actor).await.unwrap());
}
