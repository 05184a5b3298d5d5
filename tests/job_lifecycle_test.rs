mod helpers;

use quickcrew::application::ports::{JobFilter, LifecycleError, PageRequest};
use quickcrew::domain::{JobStatus, TrustAction, TrustActor, WorkerId};
use rust_decimal_macros::dec;

use helpers::{customer, draft, test_app};

#[tokio::test]
async fn given_open_job_when_first_worker_accepts_then_assignment_is_leader() {
    let app = test_app();
    let job = app.jobs.create(customer(), draft(2)).await.unwrap();

    let first = app.jobs.accept(job.id, WorkerId::new()).await.unwrap();
    let second = app.jobs.accept(job.id, WorkerId::new()).await.unwrap();

    assert!(first.is_leader);
    assert!(!second.is_leader);
}

#[tokio::test]
async fn given_job_with_open_slots_when_accepts_fill_quantity_then_job_locks() {
    let app = test_app();
    let job = app.jobs.create(customer(), draft(2)).await.unwrap();

    app.jobs.accept(job.id, WorkerId::new()).await.unwrap();
    let mid = app.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(mid.status, JobStatus::Searching);

    app.jobs.accept(job.id, WorkerId::new()).await.unwrap();
    let locked = app.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(locked.status, JobStatus::Locked);
}

#[tokio::test]
async fn given_two_slot_job_when_six_workers_race_then_exactly_two_win() {
    let app = test_app();
    let job = app.jobs.create(customer(), draft(2)).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..6 {
        let jobs = app.jobs.clone();
        let job_id = job.id;
        tasks.push(tokio::spawn(async move {
            jobs.accept(job_id, WorkerId::new()).await
        }));
    }

    let mut wins = 0;
    let mut rejections = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => wins += 1,
            Err(LifecycleError::CapacityExceeded) | Err(LifecycleError::InvalidState(_)) => {
                rejections += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(wins, 2);
    assert_eq!(rejections, 4);

    let final_job = app.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(final_job.status, JobStatus::Locked);
    assert_eq!(app.jobs.assignments(job.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn given_assigned_worker_when_accepting_again_then_already_assigned() {
    let app = test_app();
    let job = app.jobs.create(customer(), draft(2)).await.unwrap();
    let worker = WorkerId::new();

    app.jobs.accept(job.id, worker).await.unwrap();
    let second_try = app.jobs.accept(job.id, worker).await;

    assert!(matches!(second_try, Err(LifecycleError::AlreadyAssigned)));
}

#[tokio::test]
async fn given_unscheduled_job_when_created_then_expiry_deadline_is_set() {
    let app = test_app();
    let job = app.jobs.create(customer(), draft(1)).await.unwrap();

    assert_eq!(job.status, JobStatus::Searching);
    assert!(job.auto_expire_at.is_some());
}

#[tokio::test]
async fn given_scheduled_job_when_created_then_no_expiry_deadline() {
    let app = test_app();
    let mut scheduled = draft(1);
    scheduled.scheduled_start_time = Some(chrono::Utc::now() + chrono::Duration::hours(6));

    let job = app.jobs.create(customer(), scheduled).await.unwrap();
    assert!(job.auto_expire_at.is_none());
}

#[tokio::test]
async fn given_searching_job_when_cancelled_then_small_penalty_is_ledgered() {
    let app = test_app();
    let customer_id = customer();
    let job = app.jobs.create(customer_id, draft(2)).await.unwrap();

    let outcome = app
        .jobs
        .cancel(job.id, customer_id, "changed my mind")
        .await
        .unwrap();

    assert_eq!(outcome.penalty, dec!(-0.02));
    assert_eq!(outcome.released_assignments, 0);

    let actor = TrustActor::Customer(customer_id);
    assert_eq!(app.trust.score(actor).await.unwrap(), Some(dec!(4.98)));

    let ledger = app.trust.ledger(actor).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].action, TrustAction::CancelSearching);
    assert_eq!(ledger[0].old_score, dec!(5));
    assert_eq!(ledger[0].new_score, dec!(4.98));
}

#[tokio::test]
async fn given_locked_job_when_cancelled_then_larger_penalty_and_workers_released() {
    let app = test_app();
    let customer_id = customer();
    let job = app.jobs.create(customer_id, draft(2)).await.unwrap();
    app.jobs.accept(job.id, WorkerId::new()).await.unwrap();
    app.jobs.accept(job.id, WorkerId::new()).await.unwrap();

    let outcome = app
        .jobs
        .cancel(job.id, customer_id, "plans fell through")
        .await
        .unwrap();

    assert_eq!(outcome.penalty, dec!(-0.07));
    assert_eq!(outcome.released_assignments, 2);

    let cancelled = app.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(cancelled.status, JobStatus::Cancelled);
    assert_eq!(cancelled.cancel_reason.as_deref(), Some("plans fell through"));

    let ledger = app
        .trust
        .ledger(TrustActor::Customer(customer_id))
        .await
        .unwrap();
    assert_eq!(ledger[0].action, TrustAction::CancelLocked);
}

#[tokio::test]
async fn given_in_progress_job_when_cancelled_then_rejected_without_ledger_entry() {
    let app = test_app();
    let customer_id = customer();
    let worker = WorkerId::new();
    let job = app.jobs.create(customer_id, draft(1)).await.unwrap();
    app.jobs.accept(job.id, worker).await.unwrap();
    app.checkpoints
        .arrive(worker, job.id, 0.0, 0.0, None)
        .await
        .unwrap();
    app.checkpoints.start(worker, job.id).await.unwrap();

    let result = app.jobs.cancel(job.id, customer_id, "too late").await;
    assert!(matches!(result, Err(LifecycleError::InvalidState(_))));

    let ledger = app
        .trust
        .ledger(TrustActor::Customer(customer_id))
        .await
        .unwrap();
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn given_foreign_job_when_cancelled_then_unauthorized() {
    let app = test_app();
    let job = app.jobs.create(customer(), draft(1)).await.unwrap();

    let result = app.jobs.cancel(job.id, customer(), "not mine").await;
    assert!(matches!(result, Err(LifecycleError::Unauthorized(_))));
}

#[tokio::test]
async fn given_trust_locked_customer_when_creating_job_then_unauthorized() {
    let app = test_app();
    let customer_id = customer();

    // Drive the score below the lock threshold.
    app.trust
        .apply_delta(
            TrustActor::Customer(customer_id),
            dec!(-3.5),
            quickcrew::domain::TrustAction::ManualAdjustment,
            None,
            "repeated no-pay reports",
        )
        .await
        .unwrap();

    let result = app.jobs.create(customer_id, draft(1)).await;
    assert!(matches!(result, Err(LifecycleError::Unauthorized(_))));
}

#[tokio::test]
async fn given_trust_locked_worker_when_accepting_then_unauthorized() {
    let app = test_app();
    let worker = WorkerId::new();
    let job = app.jobs.create(customer(), draft(1)).await.unwrap();

    app.trust
        .apply_delta(
            TrustActor::Worker(worker),
            dec!(-3.5),
            quickcrew::domain::TrustAction::NoShow,
            None,
            "missed two locked jobs",
        )
        .await
        .unwrap();

    let result = app.jobs.accept(job.id, worker).await;
    assert!(matches!(result, Err(LifecycleError::Unauthorized(_))));
}

async fn complete_job(
    app: &helpers::TestApp,
    job_id: quickcrew::domain::JobId,
    workers: &[WorkerId],
) {
    for worker in workers {
        app.checkpoints
            .arrive(*worker, job_id, 0.0, 0.0, None)
            .await
            .unwrap();
        app.checkpoints.start(*worker, job_id).await.unwrap();
    }
    for worker in workers {
        app.checkpoints
            .complete(*worker, job_id, None)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn given_completed_job_when_rated_five_stars_then_every_worker_gains_trust() {
    let app = test_app();
    let customer_id = customer();
    let workers = [WorkerId::new(), WorkerId::new()];
    let job = app.jobs.create(customer_id, draft(2)).await.unwrap();
    for worker in &workers {
        app.jobs.accept(job.id, *worker).await.unwrap();
    }
    complete_job(&app, job.id, &workers).await;

    let rated = app
        .jobs
        .rate_worker(job.id, customer_id, 5, Some("fast and careful"))
        .await
        .unwrap();
    assert_eq!(rated.len(), 2);

    for worker in &workers {
        let actor = TrustActor::Worker(*worker);
        assert_eq!(app.trust.score(actor).await.unwrap(), Some(dec!(5)));

        let ledger = app.trust.ledger(actor).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].action, TrustAction::RatingReceived);
        assert_eq!(ledger[0].change_amount, dec!(0.05));
    }
}

#[tokio::test]
async fn given_completed_job_when_rated_three_stars_then_no_trust_mutation() {
    let app = test_app();
    let customer_id = customer();
    let worker = WorkerId::new();
    let job = app.jobs.create(customer_id, draft(1)).await.unwrap();
    app.jobs.accept(job.id, worker).await.unwrap();
    complete_job(&app, job.id, &[worker]).await;

    app.jobs
        .rate_worker(job.id, customer_id, 3, None)
        .await
        .unwrap();

    let ledger = app.trust.ledger(TrustActor::Worker(worker)).await.unwrap();
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn given_rating_out_of_bounds_then_rejected() {
    let app = test_app();
    let customer_id = customer();
    let job = app.jobs.create(customer_id, draft(1)).await.unwrap();

    for bad in [0u8, 6] {
        let result = app.jobs.rate_worker(job.id, customer_id, bad, None).await;
        assert!(matches!(result, Err(LifecycleError::InvalidState(_))));
    }
}

#[tokio::test]
async fn given_unfinished_job_when_rated_then_rejected() {
    let app = test_app();
    let customer_id = customer();
    let job = app.jobs.create(customer_id, draft(1)).await.unwrap();
    app.jobs.accept(job.id, WorkerId::new()).await.unwrap();

    let result = app.jobs.rate_worker(job.id, customer_id, 4, None).await;
    assert!(matches!(result, Err(LifecycleError::InvalidState(_))));
}

#[tokio::test]
async fn given_several_jobs_when_listing_by_status_then_only_matches_return() {
    let app = test_app();
    let customer_id = customer();
    let open = app.jobs.create(customer_id, draft(2)).await.unwrap();
    let cancelled = app.jobs.create(customer_id, draft(1)).await.unwrap();
    app.jobs
        .cancel(cancelled.id, customer_id, "duplicate posting")
        .await
        .unwrap();

    let filter = JobFilter {
        status: Some(JobStatus::Searching),
        ..JobFilter::default()
    };
    let page = app
        .jobs
        .find_all(&filter, PageRequest::default())
        .await
        .unwrap();

    assert_eq!(page.total_items, 1);
    assert_eq!(page.data[0].id, open.id);
}
