use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{LifecycleError, RepositoryError, TrustStore};
use crate::domain::{
    JobId, TrustAction, TrustActor, TrustLedgerEntry, TrustMutation, TrustPolicy,
};

fn actor_table(actor: TrustActor) -> &'static str {
    match actor {
        TrustActor::Customer(_) => "customers",
        TrustActor::Worker(_) => "workers",
    }
}

fn query_failed(e: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

/// Locks the actor row, applies the clamped delta and appends the audit
/// entry on the given connection. Runs inside the caller's transaction so
/// cancellation can bundle it with the job mutation.
pub(crate) async fn apply_trust_delta_tx(
    conn: &mut PgConnection,
    policy: &TrustPolicy,
    actor: TrustActor,
    delta: Decimal,
    action: TrustAction,
    job_id: Option<JobId>,
    reason: &str,
) -> Result<TrustMutation, LifecycleError> {
    let table = actor_table(actor);

    let row = sqlx::query(&format!(
        "SELECT trust_score, trust_locked_until FROM {} WHERE id = $1 FOR UPDATE",
        table
    ))
    .bind(actor.as_uuid())
    .fetch_optional(&mut *conn)
    .await
    .map_err(query_failed)?
    .ok_or_else(|| LifecycleError::NotFound(format!("{} {}", actor.kind(), actor.as_uuid())))?;

    let current: Decimal = row.get("trust_score");
    let existing_lock: Option<DateTime<Utc>> = row.get("trust_locked_until");

    let now = Utc::now();
    let mutation = policy.apply(current, delta, existing_lock, now);

    sqlx::query(&format!(
        "UPDATE {} SET trust_score = $1, trust_locked_until = $2, updated_at = $3 WHERE id = $4",
        table
    ))
    .bind(mutation.new_score)
    .bind(mutation.locked_until)
    .bind(now)
    .bind(actor.as_uuid())
    .execute(&mut *conn)
    .await
    .map_err(query_failed)?;

    sqlx::query(
        r#"
        INSERT INTO trust_ledger
            (id, actor_kind, actor_id, job_id, action_type, change_amount,
             old_score, new_score, description, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(actor.kind())
    .bind(actor.as_uuid())
    .bind(job_id.map(|id| id.as_uuid()))
    .bind(action.as_str())
    .bind(delta)
    .bind(mutation.old_score)
    .bind(mutation.new_score)
    .bind(reason)
    .bind(now)
    .execute(&mut *conn)
    .await
    .map_err(query_failed)?;

    Ok(mutation)
}

pub struct PgTrustStore {
    pool: PgPool,
    policy: TrustPolicy,
}

impl PgTrustStore {
    pub fn new(pool: PgPool, policy: TrustPolicy) -> Self {
        Self { pool, policy }
    }
}

#[async_trait]
impl TrustStore for PgTrustStore {
    #[instrument(skip(self, reason), fields(actor = %actor, delta = %delta))]
    async fn apply_delta(
        &self,
        actor: TrustActor,
        delta: Decimal,
        action: TrustAction,
        job_id: Option<JobId>,
        reason: &str,
    ) -> Result<TrustMutation, LifecycleError> {
        let mut tx = self.pool.begin().await.map_err(query_failed)?;
        let mutation =
            apply_trust_delta_tx(&mut tx, &self.policy, actor, delta, action, job_id, reason)
                .await?;
        tx.commit().await.map_err(query_failed)?;
        Ok(mutation)
    }

    async fn is_locked(&self, actor: TrustActor) -> Result<bool, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT trust_locked_until FROM {} WHERE id = $1",
            actor_table(actor)
        ))
        .bind(actor.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        let locked_until: Option<DateTime<Utc>> = match row {
            Some(row) => row.get("trust_locked_until"),
            None => None,
        };
        Ok(locked_until.is_some_and(|until| until > Utc::now()))
    }

    async fn score(&self, actor: TrustActor) -> Result<Option<Decimal>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT trust_score FROM {} WHERE id = $1",
            actor_table(actor)
        ))
        .bind(actor.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(row.map(|r| r.get("trust_score")))
    }

    async fn ledger(&self, actor: TrustActor) -> Result<Vec<TrustLedgerEntry>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, actor_kind, actor_id, job_id, action_type, change_amount,
                   old_score, new_score, description, created_at
            FROM trust_ledger
            WHERE actor_kind = $1 AND actor_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(actor.kind())
        .bind(actor.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.into_iter()
            .map(|row| {
                let action: String = row.get("action_type");
                let action = action
                    .parse::<TrustAction>()
                    .map_err(RepositoryError::CorruptRow)?;

                Ok(TrustLedgerEntry {
                    id: row.get("id"),
                    actor,
                    job_id: row
                        .get::<Option<Uuid>, _>("job_id")
                        .map(JobId::from_uuid),
                    action,
                    change_amount: row.get("change_amount"),
                    old_score: row.get("old_score"),
                    new_score: row.get("new_score"),
                    description: row.get("description"),
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }
}
