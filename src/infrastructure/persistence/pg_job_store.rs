use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{
    CancelOutcome, CancelPenalties, CompleteOutcome, JobFilter, JobSort, JobStore, LifecycleError,
    Page, PageRequest, RepositoryError,
};
use crate::domain::{
    Assignment, AssignmentId, AssignmentStatus, CustomerId, Job, JobId, JobStatus, JobType,
    PaymentMethod, PaymentStatus, TrustAction, TrustActor, TrustPolicy, WorkerId,
};

use super::pg_trust::apply_trust_delta_tx;

const SLOT_STATUSES: &str = "('accepted', 'arrived', 'in_progress', 'done')";

const JOB_COLUMNS: &str = "id, customer_id, job_type, description_text, description_voice_url, \
     worker_quantity, booking_lat, booking_long, booking_address_text, scheduled_start_time, \
     estimated_hours, price_estimated, final_price, status, payment_method, payment_status, \
     cancel_reason, auto_expire_at, created_at, updated_at";

const ASSIGNMENT_COLUMNS: &str = "id, job_id, worker_id, status, accepted_at, arrived_at, \
     started_at, finished_at, check_in_photo_url, check_out_photo_url, earning_amount, \
     is_leader, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    customer_id: Uuid,
    job_type: String,
    description_text: Option<String>,
    description_voice_url: Option<String>,
    worker_quantity: i32,
    booking_lat: f64,
    booking_long: f64,
    booking_address_text: Option<String>,
    scheduled_start_time: Option<DateTime<Utc>>,
    estimated_hours: f64,
    price_estimated: Decimal,
    final_price: Decimal,
    status: String,
    payment_method: String,
    payment_status: String,
    cancel_reason: Option<String>,
    auto_expire_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = RepositoryError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(Job {
            id: JobId::from_uuid(row.id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            job_type: row
                .job_type
                .parse::<JobType>()
                .map_err(RepositoryError::CorruptRow)?,
            description_text: row.description_text,
            description_voice_url: row.description_voice_url,
            worker_quantity: row.worker_quantity.max(0) as u32,
            booking_lat: row.booking_lat,
            booking_long: row.booking_long,
            booking_address_text: row.booking_address_text,
            scheduled_start_time: row.scheduled_start_time,
            estimated_hours: row.estimated_hours,
            price_estimated: row.price_estimated,
            final_price: row.final_price,
            status: row
                .status
                .parse::<JobStatus>()
                .map_err(RepositoryError::CorruptRow)?,
            payment_method: row
                .payment_method
                .parse::<PaymentMethod>()
                .map_err(RepositoryError::CorruptRow)?,
            payment_status: row
                .payment_status
                .parse::<PaymentStatus>()
                .map_err(RepositoryError::CorruptRow)?,
            cancel_reason: row.cancel_reason,
            auto_expire_at: row.auto_expire_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AssignmentRow {
    id: Uuid,
    job_id: Uuid,
    worker_id: Uuid,
    status: String,
    accepted_at: Option<DateTime<Utc>>,
    arrived_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    check_in_photo_url: Option<String>,
    check_out_photo_url: Option<String>,
    earning_amount: Option<Decimal>,
    is_leader: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AssignmentRow> for Assignment {
    type Error = RepositoryError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        Ok(Assignment {
            id: AssignmentId::from_uuid(row.id),
            job_id: JobId::from_uuid(row.job_id),
            worker_id: WorkerId::from_uuid(row.worker_id),
            status: row
                .status
                .parse::<AssignmentStatus>()
                .map_err(RepositoryError::CorruptRow)?,
            accepted_at: row.accepted_at,
            arrived_at: row.arrived_at,
            started_at: row.started_at,
            finished_at: row.finished_at,
            check_in_photo_url: row.check_in_photo_url,
            check_out_photo_url: row.check_out_photo_url,
            earning_amount: row.earning_amount,
            is_leader: row.is_leader,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn query_failed(e: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

pub struct PgJobStore {
    pool: PgPool,
    policy: TrustPolicy,
}

impl PgJobStore {
    pub fn new(pool: PgPool, policy: TrustPolicy) -> Self {
        Self { pool, policy }
    }

    async fn job_for_update(
        conn: &mut PgConnection,
        job_id: JobId,
    ) -> Result<Option<Job>, RepositoryError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {} FROM jobs WHERE id = $1 FOR UPDATE",
            JOB_COLUMNS
        ))
        .bind(job_id.as_uuid())
        .fetch_optional(conn)
        .await
        .map_err(query_failed)?;

        row.map(Job::try_from).transpose()
    }

    /// Turns a zero-row conditional update into the right error kind:
    /// missing assignment vs. wrong current state.
    async fn explain_missed_update(
        conn: &mut PgConnection,
        job_id: JobId,
        worker_id: WorkerId,
        wanted: AssignmentStatus,
    ) -> LifecycleError {
        let status: Result<Option<String>, _> = sqlx::query_scalar(
            "SELECT status FROM job_assignments WHERE job_id = $1 AND worker_id = $2",
        )
        .bind(job_id.as_uuid())
        .bind(worker_id.as_uuid())
        .fetch_optional(conn)
        .await;

        match status {
            Ok(Some(current)) => LifecycleError::InvalidState(format!(
                "assignment is {}, expected {}",
                current, wanted
            )),
            Ok(None) => {
                LifecycleError::NotFound(format!("assignment for worker {}", worker_id))
            }
            Err(e) => LifecycleError::Store(query_failed(e)),
        }
    }

    fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &JobFilter) {
        let mut prefix = " WHERE ";
        if let Some(status) = filter.status {
            builder.push(prefix).push("status = ");
            builder.push_bind(status.as_str());
            prefix = " AND ";
        }
        if let Some(job_type) = filter.job_type {
            builder.push(prefix).push("job_type = ");
            builder.push_bind(job_type.as_str());
            prefix = " AND ";
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", search);
            builder.push(prefix).push("(description_text ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR booking_address_text ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    async fn insert_job(&self, job: &Job) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO jobs
                (id, customer_id, job_type, description_text, description_voice_url,
                 worker_quantity, booking_lat, booking_long, booking_address_text,
                 scheduled_start_time, estimated_hours, price_estimated, final_price,
                 status, payment_method, payment_status, cancel_reason, auto_expire_at,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            "#,
        )
        .bind(job.id.as_uuid())
        .bind(job.customer_id.as_uuid())
        .bind(job.job_type.as_str())
        .bind(&job.description_text)
        .bind(&job.description_voice_url)
        .bind(job.worker_quantity as i32)
        .bind(job.booking_lat)
        .bind(job.booking_long)
        .bind(&job.booking_address_text)
        .bind(job.scheduled_start_time)
        .bind(job.estimated_hours)
        .bind(job.price_estimated)
        .bind(job.final_price)
        .bind(job.status.as_str())
        .bind(job.payment_method.as_str())
        .bind(job.payment_status.as_str())
        .bind(&job.cancel_reason)
        .bind(job.auto_expire_at)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn job_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {} FROM jobs WHERE id = $1",
            JOB_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.map(Job::try_from).transpose()
    }

    #[instrument(skip(self, filter))]
    async fn list_jobs(
        &self,
        filter: &JobFilter,
        page: PageRequest,
    ) -> Result<Page<Job>, RepositoryError> {
        let limit = page.limit.max(1);
        let current_page = page.page.max(1);
        let offset = (current_page - 1) * limit;

        let mut count_builder = QueryBuilder::new("SELECT count(*) FROM jobs");
        Self::push_filter(&mut count_builder, filter);
        let total_items: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(query_failed)?;

        let mut builder = QueryBuilder::new(format!("SELECT {} FROM jobs", JOB_COLUMNS));
        Self::push_filter(&mut builder, filter);
        builder.push(match filter.sort {
            JobSort::Newest => " ORDER BY created_at DESC",
            JobSort::Oldest => " ORDER BY created_at ASC",
            JobSort::PriceHigh => " ORDER BY price_estimated DESC",
            JobSort::PriceLow => " ORDER BY price_estimated ASC",
        });
        builder.push(" LIMIT ");
        builder.push_bind(limit as i64);
        builder.push(" OFFSET ");
        builder.push_bind(offset as i64);

        let rows: Vec<JobRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(query_failed)?;

        let data = rows
            .into_iter()
            .map(Job::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let total_items = total_items.max(0) as u64;
        Ok(Page {
            data,
            page: current_page,
            limit,
            total_items,
            total_pages: total_items.div_ceil(limit as u64) as u32,
        })
    }

    #[instrument(skip(self), fields(job_id = %job_id))]
    async fn assignments_for_job(
        &self,
        job_id: JobId,
    ) -> Result<Vec<Assignment>, RepositoryError> {
        let rows = sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {} FROM job_assignments WHERE job_id = $1 ORDER BY created_at ASC",
            ASSIGNMENT_COLUMNS
        ))
        .bind(job_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(query_failed)?;

        rows.into_iter().map(Assignment::try_from).collect()
    }

    async fn assignment_for_worker(
        &self,
        job_id: JobId,
        worker_id: WorkerId,
    ) -> Result<Option<Assignment>, RepositoryError> {
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            "SELECT {} FROM job_assignments WHERE job_id = $1 AND worker_id = $2",
            ASSIGNMENT_COLUMNS
        ))
        .bind(job_id.as_uuid())
        .bind(worker_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.map(Assignment::try_from).transpose()
    }

    #[instrument(skip(self), fields(job_id = %job_id, worker_id = %worker_id))]
    async fn accept(
        &self,
        job_id: JobId,
        worker_id: WorkerId,
    ) -> Result<Assignment, LifecycleError> {
        let mut tx = self.pool.begin().await.map_err(query_failed)?;

        // The row lock serializes every concurrent accept on this job;
        // the slot count below cannot go stale inside the transaction.
        let job = Self::job_for_update(&mut tx, job_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("job {}", job_id)))?;

        if job.status != JobStatus::Searching {
            return Err(LifecycleError::InvalidState(format!(
                "job is {}, not accepting workers",
                job.status
            )));
        }

        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM job_assignments WHERE job_id = $1 AND worker_id = $2",
        )
        .bind(job_id.as_uuid())
        .bind(worker_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_failed)?;
        if existing.is_some() {
            return Err(LifecycleError::AlreadyAssigned);
        }

        let active: i64 = sqlx::query_scalar(&format!(
            "SELECT count(*) FROM job_assignments WHERE job_id = $1 AND status IN {}",
            SLOT_STATUSES
        ))
        .bind(job_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(query_failed)?;
        let active = active.max(0) as u32;

        if active >= job.worker_quantity {
            // Status lagged reality; self-heal before rejecting.
            sqlx::query("UPDATE jobs SET status = 'locked', updated_at = $1 WHERE id = $2")
                .bind(Utc::now())
                .bind(job_id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(query_failed)?;
            tx.commit().await.map_err(query_failed)?;
            return Err(LifecycleError::CapacityExceeded);
        }

        let assignment = Assignment::accepted(job_id, worker_id, active == 0);
        sqlx::query(
            r#"
            INSERT INTO job_assignments
                (id, job_id, worker_id, status, accepted_at, is_leader, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(assignment.id.as_uuid())
        .bind(job_id.as_uuid())
        .bind(worker_id.as_uuid())
        .bind(assignment.status.as_str())
        .bind(assignment.accepted_at)
        .bind(assignment.is_leader)
        .bind(assignment.created_at)
        .bind(assignment.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e.as_database_error().and_then(|d| d.constraint()) {
            Some("unique_assignment") => LifecycleError::AlreadyAssigned,
            _ => LifecycleError::Store(query_failed(e)),
        })?;

        if active + 1 == job.worker_quantity {
            sqlx::query("UPDATE jobs SET status = 'locked', updated_at = $1 WHERE id = $2")
                .bind(Utc::now())
                .bind(job_id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(query_failed)?;
        }

        tx.commit().await.map_err(query_failed)?;
        Ok(assignment)
    }

    #[instrument(skip(self, reason, penalties), fields(job_id = %job_id, customer_id = %customer_id))]
    async fn cancel(
        &self,
        job_id: JobId,
        customer_id: CustomerId,
        reason: &str,
        penalties: CancelPenalties,
    ) -> Result<CancelOutcome, LifecycleError> {
        let mut tx = self.pool.begin().await.map_err(query_failed)?;

        let job = Self::job_for_update(&mut tx, job_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("job {}", job_id)))?;

        if job.customer_id != customer_id {
            return Err(LifecycleError::Unauthorized(
                "job belongs to another customer".to_string(),
            ));
        }
        if !job.status.is_cancellable() {
            return Err(LifecycleError::InvalidState(format!(
                "cannot cancel a job in status {}",
                job.status
            )));
        }

        let (penalty, action) = match job.status {
            JobStatus::Searching => (penalties.searching, TrustAction::CancelSearching),
            JobStatus::Locked => (penalties.locked, TrustAction::CancelLocked),
            _ => unreachable!("is_cancellable covers the remaining states"),
        };

        let now = Utc::now();
        sqlx::query(
            "UPDATE jobs SET status = 'cancelled', cancel_reason = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(reason)
        .bind(now)
        .bind(job_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(query_failed)?;

        let released = sqlx::query(
            "UPDATE job_assignments SET status = 'cancelled', updated_at = $1 \
             WHERE job_id = $2 AND status <> 'cancelled'",
        )
        .bind(now)
        .bind(job_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(query_failed)?
        .rows_affected();

        let trust = if !penalty.is_zero() {
            Some(
                apply_trust_delta_tx(
                    &mut tx,
                    &self.policy,
                    TrustActor::Customer(customer_id),
                    penalty,
                    action,
                    Some(job_id),
                    &format!("cancelled while {}", job.status),
                )
                .await?,
            )
        } else {
            None
        };

        tx.commit().await.map_err(query_failed)?;
        Ok(CancelOutcome {
            penalty,
            trust,
            released_assignments: released as usize,
        })
    }

    #[instrument(skip(self), fields(job_id = %job_id, customer_id = %customer_id, rating))]
    async fn rate(
        &self,
        job_id: JobId,
        customer_id: CustomerId,
        rating: u8,
        trust_delta: Decimal,
    ) -> Result<Vec<WorkerId>, LifecycleError> {
        let mut tx = self.pool.begin().await.map_err(query_failed)?;

        let job = Self::job_for_update(&mut tx, job_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("job {}", job_id)))?;

        if job.customer_id != customer_id {
            return Err(LifecycleError::Unauthorized(
                "job belongs to another customer".to_string(),
            ));
        }
        if job.status != JobStatus::Completed {
            return Err(LifecycleError::InvalidState(format!(
                "only completed jobs can be rated, job is {}",
                job.status
            )));
        }

        let worker_ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT worker_id FROM job_assignments WHERE job_id = $1 AND status <> 'cancelled'",
        )
        .bind(job_id.as_uuid())
        .fetch_all(&mut *tx)
        .await
        .map_err(query_failed)?;

        if worker_ids.is_empty() {
            return Err(LifecycleError::NotFound(
                "no workers to rate on this job".to_string(),
            ));
        }

        let now = Utc::now();
        for worker_uuid in &worker_ids {
            let row = sqlx::query(
                "SELECT rating_avg, rating_count FROM workers WHERE id = $1 FOR UPDATE",
            )
            .bind(worker_uuid)
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_failed)?
            .ok_or_else(|| LifecycleError::NotFound(format!("worker {}", worker_uuid)))?;

            let avg: Decimal = row.get("rating_avg");
            let count: i32 = row.get("rating_count");
            let count_dec = Decimal::from(count.max(0));
            let new_avg =
                ((avg * count_dec + Decimal::from(rating)) / (count_dec + Decimal::ONE)).round_dp(1);

            sqlx::query(
                "UPDATE workers SET rating_avg = $1, rating_count = $2, updated_at = $3 WHERE id = $4",
            )
            .bind(new_avg)
            .bind(count.max(0) + 1)
            .bind(now)
            .bind(worker_uuid)
            .execute(&mut *tx)
            .await
            .map_err(query_failed)?;

            if !trust_delta.is_zero() {
                apply_trust_delta_tx(
                    &mut tx,
                    &self.policy,
                    TrustActor::Worker(WorkerId::from_uuid(*worker_uuid)),
                    trust_delta,
                    TrustAction::RatingReceived,
                    Some(job_id),
                    &format!("{} star rating", rating),
                )
                .await?;
            }
        }

        tx.commit().await.map_err(query_failed)?;
        Ok(worker_ids.into_iter().map(WorkerId::from_uuid).collect())
    }

    #[instrument(skip(self, photo_url), fields(job_id = %job_id, worker_id = %worker_id))]
    async fn mark_arrived(
        &self,
        job_id: JobId,
        worker_id: WorkerId,
        photo_url: Option<String>,
    ) -> Result<Assignment, LifecycleError> {
        let mut tx = self.pool.begin().await.map_err(query_failed)?;
        let now = Utc::now();

        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            "UPDATE job_assignments \
             SET status = 'arrived', arrived_at = $1, check_in_photo_url = $2, updated_at = $1 \
             WHERE job_id = $3 AND worker_id = $4 AND status = 'accepted' \
             RETURNING {}",
            ASSIGNMENT_COLUMNS
        ))
        .bind(now)
        .bind(&photo_url)
        .bind(job_id.as_uuid())
        .bind(worker_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_failed)?;

        let Some(row) = row else {
            return Err(
                Self::explain_missed_update(&mut tx, job_id, worker_id, AssignmentStatus::Accepted)
                    .await,
            );
        };

        tx.commit().await.map_err(query_failed)?;
        Ok(Assignment::try_from(row)?)
    }

    #[instrument(skip(self), fields(job_id = %job_id, worker_id = %worker_id))]
    async fn mark_started(
        &self,
        job_id: JobId,
        worker_id: WorkerId,
    ) -> Result<Assignment, LifecycleError> {
        let mut tx = self.pool.begin().await.map_err(query_failed)?;
        let now = Utc::now();

        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            "UPDATE job_assignments \
             SET status = 'in_progress', started_at = $1, updated_at = $1 \
             WHERE job_id = $2 AND worker_id = $3 AND status = 'arrived' \
             RETURNING {}",
            ASSIGNMENT_COLUMNS
        ))
        .bind(now)
        .bind(job_id.as_uuid())
        .bind(worker_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_failed)?;

        let Some(row) = row else {
            return Err(
                Self::explain_missed_update(&mut tx, job_id, worker_id, AssignmentStatus::Arrived)
                    .await,
            );
        };

        // First start flips the job; terminal states never regress.
        sqlx::query(
            "UPDATE jobs SET status = 'in_progress', updated_at = $1 \
             WHERE id = $2 AND status IN ('searching', 'locked')",
        )
        .bind(now)
        .bind(job_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(query_failed)?;

        tx.commit().await.map_err(query_failed)?;
        Ok(Assignment::try_from(row)?)
    }

    #[instrument(skip(self, photo_url), fields(job_id = %job_id, worker_id = %worker_id))]
    async fn mark_completed(
        &self,
        job_id: JobId,
        worker_id: WorkerId,
        photo_url: Option<String>,
    ) -> Result<CompleteOutcome, LifecycleError> {
        let mut tx = self.pool.begin().await.map_err(query_failed)?;

        // Same locking discipline as accept: the rollup count below must
        // see sibling completions, not a stale snapshot.
        let job = Self::job_for_update(&mut tx, job_id)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(format!("job {}", job_id)))?;

        let now = Utc::now();
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            "UPDATE job_assignments \
             SET status = 'done', finished_at = $1, check_out_photo_url = $2, updated_at = $1 \
             WHERE job_id = $3 AND worker_id = $4 AND status = 'in_progress' \
             RETURNING {}",
            ASSIGNMENT_COLUMNS
        ))
        .bind(now)
        .bind(&photo_url)
        .bind(job_id.as_uuid())
        .bind(worker_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_failed)?;

        let Some(row) = row else {
            return Err(Self::explain_missed_update(
                &mut tx,
                job_id,
                worker_id,
                AssignmentStatus::InProgress,
            )
            .await);
        };
        let assignment = Assignment::try_from(row)?;

        let (total, done): (i64, i64) = sqlx::query_as(
            "SELECT count(*) FILTER (WHERE status <> 'cancelled'), \
                    count(*) FILTER (WHERE status = 'done') \
             FROM job_assignments WHERE job_id = $1",
        )
        .bind(job_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(query_failed)?;

        let job_completed = total > 0 && total == done;
        if job_completed {
            sqlx::query(
                "UPDATE jobs SET status = 'completed', final_price = price_estimated, \
                 updated_at = $1 WHERE id = $2",
            )
            .bind(now)
            .bind(job_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(query_failed)?;

            let earning = (job.price_estimated / Decimal::from(done)).round_dp(2);
            sqlx::query(
                "UPDATE job_assignments SET earning_amount = $1, updated_at = $2 \
                 WHERE job_id = $3 AND status = 'done'",
            )
            .bind(earning)
            .bind(now)
            .bind(job_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(query_failed)?;
        }

        tx.commit().await.map_err(query_failed)?;
        Ok(CompleteOutcome {
            assignment,
            job_completed,
        })
    }
}
