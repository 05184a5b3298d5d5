mod helpers;

use quickcrew::application::ports::{JobStore, LifecycleError};
use quickcrew::domain::{AssignmentStatus, JobStatus, WorkerId};
use quickcrew::infrastructure::media::MockMediaStore;
use quickcrew::infrastructure::settings::StaticSettings;
use rust_decimal_macros::dec;

use helpers::{customer, draft, draft_at, test_app, test_app_with};

// Roughly 200m north of the origin.
const OUT_OF_RANGE_LAT: f64 = 0.0018;
// Roughly 55m north.
const NEARBY_LAT: f64 = 0.0005;

#[tokio::test]
async fn given_worker_beyond_gps_radius_when_arriving_then_rejected_and_status_unchanged() {
    let app = test_app();
    let worker = WorkerId::new();
    let job = app.jobs.create(customer(), draft_at(0.0, 0.0, 1)).await.unwrap();
    app.jobs.accept(job.id, worker).await.unwrap();

    let result = app
        .checkpoints
        .arrive(worker, job.id, OUT_OF_RANGE_LAT, 0.0, None)
        .await;

    match result {
        Err(LifecycleError::OutOfRange {
            distance_meters,
            allowed_meters,
        }) => {
            assert!(distance_meters > 150.0);
            assert_eq!(allowed_meters, 150.0);
        }
        other => panic!("expected OutOfRange, got {other:?}"),
    }

    let assignment = app
        .store
        .assignment_for_worker(job.id, worker)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(assignment.status, AssignmentStatus::Accepted);
}

#[tokio::test]
async fn given_worker_inside_gps_radius_when_arriving_then_assignment_is_arrived() {
    let app = test_app();
    let worker = WorkerId::new();
    let job = app.jobs.create(customer(), draft_at(0.0, 0.0, 1)).await.unwrap();
    app.jobs.accept(job.id, worker).await.unwrap();

    let assignment = app
        .checkpoints
        .arrive(worker, job.id, NEARBY_LAT, 0.0, None)
        .await
        .unwrap();

    assert_eq!(assignment.status, AssignmentStatus::Arrived);
    assert!(assignment.arrived_at.is_some());
    assert!(assignment.check_in_photo_url.is_none());
}

#[tokio::test]
async fn given_photo_requirement_when_arriving_without_photo_then_rejected() {
    let settings = StaticSettings::new().with("require_checkin_photo", "true");
    let app = test_app_with(settings, MockMediaStore::new());
    let worker = WorkerId::new();
    let job = app.jobs.create(customer(), draft(1)).await.unwrap();
    app.jobs.accept(job.id, worker).await.unwrap();

    let result = app.checkpoints.arrive(worker, job.id, 0.0, 0.0, None).await;
    assert!(matches!(result, Err(LifecycleError::InvalidState(_))));
}

#[tokio::test]
async fn given_checkin_photo_when_arriving_then_url_is_recorded() {
    let app = test_app();
    let worker = WorkerId::new();
    let job = app.jobs.create(customer(), draft(1)).await.unwrap();
    app.jobs.accept(job.id, worker).await.unwrap();

    let assignment = app
        .checkpoints
        .arrive(worker, job.id, 0.0, 0.0, Some(b"jpeg bytes"))
        .await
        .unwrap();

    let url = assignment.check_in_photo_url.unwrap();
    assert!(url.starts_with(&format!("jobs/{}/checkin", job.id)));
    assert_eq!(app.media.uploaded_folders().len(), 1);
}

#[tokio::test]
async fn given_arrived_worker_when_starting_then_job_moves_to_in_progress() {
    let app = test_app();
    let worker = WorkerId::new();
    let job = app.jobs.create(customer(), draft(1)).await.unwrap();
    app.jobs.accept(job.id, worker).await.unwrap();
    app.checkpoints
        .arrive(worker, job.id, 0.0, 0.0, None)
        .await
        .unwrap();

    let assignment = app.checkpoints.start(worker, job.id).await.unwrap();
    assert_eq!(assignment.status, AssignmentStatus::InProgress);

    let updated_job = app.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(updated_job.status, JobStatus::InProgress);
}

#[tokio::test]
async fn given_accepted_worker_when_starting_before_arrival_then_rejected() {
    let app = test_app();
    let worker = WorkerId::new();
    let job = app.jobs.create(customer(), draft(1)).await.unwrap();
    app.jobs.accept(job.id, worker).await.unwrap();

    let result = app.checkpoints.start(worker, job.id).await;
    assert!(matches!(result, Err(LifecycleError::InvalidState(_))));
}

#[tokio::test]
async fn given_two_workers_when_first_finishes_then_job_stays_in_progress() {
    let app = test_app();
    let workers = [WorkerId::new(), WorkerId::new()];
    let job = app.jobs.create(customer(), draft(2)).await.unwrap();
    for worker in &workers {
        app.jobs.accept(job.id, *worker).await.unwrap();
        app.checkpoints
            .arrive(*worker, job.id, 0.0, 0.0, None)
            .await
            .unwrap();
        app.checkpoints.start(*worker, job.id).await.unwrap();
    }

    let outcome = app
        .checkpoints
        .complete(workers[0], job.id, None)
        .await
        .unwrap();

    assert!(!outcome.job_completed);
    assert_eq!(outcome.assignment.status, AssignmentStatus::Done);
    assert!(outcome.assignment.earning_amount.is_none());

    let mid_job = app.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(mid_job.status, JobStatus::InProgress);
}

#[tokio::test]
async fn given_two_workers_when_last_finishes_then_job_completes_and_earnings_split() {
    let app = test_app();
    let workers = [WorkerId::new(), WorkerId::new()];
    let job = app.jobs.create(customer(), draft(2)).await.unwrap();
    for worker in &workers {
        app.jobs.accept(job.id, *worker).await.unwrap();
        app.checkpoints
            .arrive(*worker, job.id, 0.0, 0.0, None)
            .await
            .unwrap();
        app.checkpoints.start(*worker, job.id).await.unwrap();
    }

    app.checkpoints
        .complete(workers[0], job.id, None)
        .await
        .unwrap();
    let outcome = app
        .checkpoints
        .complete(workers[1], job.id, None)
        .await
        .unwrap();

    assert!(outcome.job_completed);

    let completed = app.jobs.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(completed.status, JobStatus::Completed);
    assert_eq!(completed.final_price, completed.price_estimated);

    // 80_000/hr * 3h * 2 workers = 480_000, split evenly.
    let assignments = app.jobs.assignments(job.id).await.unwrap();
    for assignment in assignments {
        assert_eq!(assignment.earning_amount, Some(dec!(240000.00)));
    }
}

#[tokio::test]
async fn given_failing_media_store_when_completing_then_status_untouched() {
    let app = test_app_with(StaticSettings::new(), MockMediaStore::failing());
    let worker = WorkerId::new();
    let job = app.jobs.create(customer(), draft(1)).await.unwrap();
    app.jobs.accept(job.id, worker).await.unwrap();
    app.checkpoints
        .arrive(worker, job.id, 0.0, 0.0, None)
        .await
        .unwrap();
    app.checkpoints.start(worker, job.id).await.unwrap();

    let result = app
        .checkpoints
        .complete(worker, job.id, Some(b"checkout photo"))
        .await;
    assert!(matches!(result, Err(LifecycleError::Dependency(_))));

    let assignment = app
        .store
        .assignment_for_worker(job.id, worker)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(assignment.status, AssignmentStatus::InProgress);
}
