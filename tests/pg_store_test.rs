#[path = "helpers/test_postgres.rs"]
mod test_postgres;

use quickcrew::application::ports::{CancelPenalties, JobStore, LifecycleError, TrustStore};
use quickcrew::domain::{
    CustomerId, Job, JobDraft, JobStatus, JobType, PaymentMethod, TrustActor,
};
use rust_decimal_macros::dec;

use test_postgres::TestPostgres;

fn job_for(customer_id: CustomerId, worker_quantity: u32) -> Job {
    let draft = JobDraft {
        job_type: JobType::Loading,
        description_text: Some("Unload a container of tiles".to_string()),
        description_voice_url: None,
        worker_quantity,
        booking_lat: -6.2,
        booking_long: 106.8,
        booking_address_text: Some("Warehouse 4".to_string()),
        scheduled_start_time: None,
        estimated_hours: 2.0,
        payment_method: PaymentMethod::Cash,
    };
    Job::from_draft(customer_id, draft, dec!(320000.00), None)
}

#[tokio::test]
async fn given_test_suite_starting_up_when_initializing_postgres_container_then_migrations_run() {
    let pg = TestPostgres::new().await;

    let count: i64 = sqlx::query_scalar("SELECT count(*) FROM jobs")
        .fetch_one(&pg.pool)
        .await
        .expect("Failed to query jobs table");

    assert_eq!(count, 0);
}

#[tokio::test]
async fn given_seeded_job_when_workers_accept_and_finish_then_job_completes_with_earnings() {
    let pg = TestPostgres::new().await;
    let customer_id = pg.seed_customer().await;
    let workers = [pg.seed_worker().await, pg.seed_worker().await];

    let job = job_for(customer_id, 2);
    pg.job_store.insert_job(&job).await.unwrap();

    let first = pg.job_store.accept(job.id, workers[0]).await.unwrap();
    let second = pg.job_store.accept(job.id, workers[1]).await.unwrap();
    assert!(first.is_leader);
    assert!(!second.is_leader);

    let locked = pg.job_store.job_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(locked.status, JobStatus::Locked);

    for worker in &workers {
        pg.job_store.mark_arrived(job.id, *worker, None).await.unwrap();
        pg.job_store.mark_started(job.id, *worker).await.unwrap();
    }

    let mid = pg.job_store.mark_completed(job.id, workers[0], None).await.unwrap();
    assert!(!mid.job_completed);

    let last = pg.job_store.mark_completed(job.id, workers[1], None).await.unwrap();
    assert!(last.job_completed);

    let completed = pg.job_store.job_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(completed.status, JobStatus::Completed);

    let assignments = pg.job_store.assignments_for_job(job.id).await.unwrap();
    for assignment in assignments {
        assert_eq!(assignment.earning_amount, Some(dec!(160000.00)));
    }
}

#[tokio::test]
async fn given_assigned_worker_when_accepting_twice_then_unique_constraint_surfaces() {
    let pg = TestPostgres::new().await;
    let customer_id = pg.seed_customer().await;
    let worker = pg.seed_worker().await;

    let job = job_for(customer_id, 2);
    pg.job_store.insert_job(&job).await.unwrap();

    pg.job_store.accept(job.id, worker).await.unwrap();
    let second_try = pg.job_store.accept(job.id, worker).await;

    assert!(matches!(second_try, Err(LifecycleError::AlreadyAssigned)));
}

#[tokio::test]
async fn given_searching_job_when_cancelled_then_penalty_and_ledger_row_committed_together() {
    let pg = TestPostgres::new().await;
    let customer_id = pg.seed_customer().await;

    let job = job_for(customer_id, 1);
    pg.job_store.insert_job(&job).await.unwrap();

    let outcome = pg
        .job_store
        .cancel(
            job.id,
            customer_id,
            "posted by mistake",
            CancelPenalties {
                searching: dec!(-0.02),
                locked: dec!(-0.07),
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.penalty, dec!(-0.02));
    let mutation = outcome.trust.unwrap();
    assert_eq!(mutation.new_score, dec!(4.98));

    let actor = TrustActor::Customer(customer_id);
    assert_eq!(pg.trust_store.score(actor).await.unwrap(), Some(dec!(4.98)));

    let ledger = pg.trust_store.ledger(actor).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].change_amount, dec!(-0.02));
}
