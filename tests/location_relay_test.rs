use std::time::Duration;

use chrono::Utc;
use quickcrew::application::services::LocationRelay;
use quickcrew::domain::{JobId, LocationSample};
use uuid::Uuid;

fn sample(job_id: JobId, lat: f64) -> LocationSample {
    LocationSample {
        job_id: job_id.as_uuid(),
        worker_id: Uuid::new_v4(),
        lat,
        long: 106.8,
        heading_degrees: 90.0,
        speed: Some(1.4),
        timestamp: Utc::now(),
    }
}

#[tokio::test]
async fn given_subscriber_when_sample_published_then_it_is_delivered() {
    let relay = LocationRelay::default();
    let job_id = JobId::new();

    let mut subscription = relay.subscribe(job_id).await;
    relay.publish(sample(job_id, -6.2), None).await;

    let received = subscription.receiver.recv().await.unwrap();
    assert_eq!(received.lat, -6.2);
}

#[tokio::test]
async fn given_publishing_connection_then_it_never_receives_its_own_sample() {
    let relay = LocationRelay::default();
    let job_id = JobId::new();

    let mut publisher = relay.subscribe(job_id).await;
    let mut viewer = relay.subscribe(job_id).await;

    relay.publish(sample(job_id, -6.2), Some(publisher.id)).await;

    let received = viewer.receiver.recv().await.unwrap();
    assert_eq!(received.lat, -6.2);

    // The publisher's queue must stay empty.
    assert!(publisher.receiver.try_recv().is_err());
}

#[tokio::test]
async fn given_jobs_with_separate_channels_then_samples_do_not_cross() {
    let relay = LocationRelay::default();
    let job_a = JobId::new();
    let job_b = JobId::new();

    let mut sub_b = relay.subscribe(job_b).await;
    relay.publish(sample(job_a, -6.2), None).await;

    assert!(sub_b.receiver.try_recv().is_err());
}

#[tokio::test]
async fn given_cached_position_when_late_viewer_joins_then_it_is_replayed() {
    let relay = LocationRelay::default();
    let job_id = JobId::new();

    relay.publish(sample(job_id, -6.25), None).await;

    let mut late = relay.subscribe(job_id).await;
    let replayed = late.receiver.recv().await.unwrap();
    assert_eq!(replayed.lat, -6.25);
}

#[tokio::test(start_paused = true)]
async fn given_expired_cache_when_viewer_joins_then_nothing_is_replayed() {
    let relay = LocationRelay::new(Duration::from_secs(300));
    let job_id = JobId::new();

    relay.publish(sample(job_id, -6.25), None).await;
    tokio::time::advance(Duration::from_secs(301)).await;

    let mut late = relay.subscribe(job_id).await;
    assert!(late.receiver.try_recv().is_err());
    assert!(relay.last_position(job_id).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn given_fresh_publish_then_ttl_clock_resets() {
    let relay = LocationRelay::new(Duration::from_secs(300));
    let job_id = JobId::new();

    relay.publish(sample(job_id, -6.25), None).await;
    tokio::time::advance(Duration::from_secs(200)).await;
    relay.publish(sample(job_id, -6.26), None).await;
    tokio::time::advance(Duration::from_secs(200)).await;

    // 400s after the first publish, 200s after the second.
    let cached = relay.last_position(job_id).await.unwrap();
    assert_eq!(cached.lat, -6.26);
}

#[tokio::test]
async fn given_unsubscribed_viewer_then_no_further_samples_arrive() {
    let relay = LocationRelay::default();
    let job_id = JobId::new();

    let mut viewer = relay.subscribe(job_id).await;
    relay.unsubscribe(job_id, viewer.id).await;
    // Idempotent.
    relay.unsubscribe(job_id, viewer.id).await;

    relay.publish(sample(job_id, -6.2), None).await;
    assert!(viewer.receiver.try_recv().is_err());
}

#[tokio::test]
async fn given_dropped_receiver_when_publishing_then_subscriber_is_pruned() {
    let relay = LocationRelay::default();
    let job_id = JobId::new();

    let subscription = relay.subscribe(job_id).await;
    drop(subscription);

    // Both publishes must succeed; the first prunes the dead slot.
    relay.publish(sample(job_id, -6.2), None).await;
    relay.publish(sample(job_id, -6.3), None).await;

    let cached = relay.last_position(job_id).await.unwrap();
    assert_eq!(cached.lat, -6.3);
}

#[tokio::test]
async fn given_lagging_subscriber_then_overflow_samples_are_dropped_not_blocking() {
    let relay = LocationRelay::default();
    let job_id = JobId::new();

    let mut slow = relay.subscribe(job_id).await;

    // Buffer is 32; the excess must be discarded without blocking.
    for i in 0..40 {
        relay.publish(sample(job_id, f64::from(i)), None).await;
    }

    let mut delivered = 0;
    while slow.receiver.try_recv().is_ok() {
        delivered += 1;
    }
    assert_eq!(delivered, 32);
}
