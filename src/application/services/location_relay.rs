use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{JobId, LocationSample};

const DEFAULT_POSITION_TTL: Duration = Duration::from_secs(300);
const SUBSCRIBER_BUFFER: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live feed of one job's location channel. Dropping the receiver is
/// enough to detach; `unsubscribe` additionally frees the slot eagerly.
pub struct Subscription {
    pub id: SubscriberId,
    pub receiver: mpsc::Receiver<LocationSample>,
}

struct JobChannel {
    last_position: Option<(LocationSample, Instant)>,
    subscribers: HashMap<SubscriberId, mpsc::Sender<LocationSample>>,
}

impl JobChannel {
    fn empty() -> Self {
        Self {
            last_position: None,
            subscribers: HashMap::new(),
        }
    }
}

/// Ephemeral pub/sub for worker GPS samples, keyed by job. Holds only
/// the single last-known position per job under a short TTL; nothing
/// here ever reaches the durable store. Last-write-wins is fine because
/// only the most recent position is meaningful.
pub struct LocationRelay {
    channels: RwLock<HashMap<JobId, JobChannel>>,
    position_ttl: Duration,
}

impl Default for LocationRelay {
    fn default() -> Self {
        Self::new(DEFAULT_POSITION_TTL)
    }
}

impl LocationRelay {
    pub fn new(position_ttl: Duration) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            position_ttl,
        }
    }

    /// Joins the job's broadcast group. A fresh cached position is
    /// replayed immediately so a late-joining viewer sees current state
    /// without waiting for the next publish.
    pub async fn subscribe(&self, job_id: JobId) -> Subscription {
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = SubscriberId::new();

        let mut channels = self.channels.write().await;
        let channel = channels.entry(job_id).or_insert_with(JobChannel::empty);

        if let Some((sample, stored_at)) = &channel.last_position {
            if stored_at.elapsed() <= self.position_ttl {
                let _ = sender.try_send(sample.clone());
            }
        }

        channel.subscribers.insert(id, sender);
        debug!(job_id = %job_id, subscriber = %id, "Relay subscriber joined");

        Subscription { id, receiver }
    }

    /// Idempotent; empty channels with an expired cache entry are freed.
    pub async fn unsubscribe(&self, job_id: JobId, subscriber: SubscriberId) {
        let mut channels = self.channels.write().await;
        if let Some(channel) = channels.get_mut(&job_id) {
            channel.subscribers.remove(&subscriber);

            let cache_expired = match &channel.last_position {
                Some((_, stored_at)) => stored_at.elapsed() > self.position_ttl,
                None => true,
            };
            if channel.subscribers.is_empty() && cache_expired {
                channels.remove(&job_id);
            }
        }
    }

    /// Overwrites the job's last-known position (TTL refreshed) and fans
    /// the sample out to every subscriber except the publishing
    /// connection. Closed subscribers are pruned; a full buffer drops the
    /// sample for that subscriber only.
    pub async fn publish(&self, sample: LocationSample, publisher: Option<SubscriberId>) {
        let job_id = JobId::from_uuid(sample.job_id);
        let mut channels = self.channels.write().await;
        let channel = channels.entry(job_id).or_insert_with(JobChannel::empty);

        channel.last_position = Some((sample.clone(), Instant::now()));

        let mut closed = Vec::new();
        for (id, sender) in &channel.subscribers {
            if Some(*id) == publisher {
                continue;
            }
            match sender.try_send(sample.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    debug!(subscriber = %id, "Relay subscriber lagging, sample dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*id),
            }
        }
        for id in closed {
            channel.subscribers.remove(&id);
        }
    }

    /// Current cached position for a job, if still within TTL.
    pub async fn last_position(&self, job_id: JobId) -> Option<LocationSample> {
        let channels = self.channels.read().await;
        channels.get(&job_id).and_then(|c| {
            c.last_position.as_ref().and_then(|(sample, stored_at)| {
                (stored_at.elapsed() <= self.position_ttl).then(|| sample.clone())
            })
        })
    }
}
