mod health;
mod jobs;
mod location_ws;
mod responses;
mod trust;
mod worker_actions;

pub use health::health_handler;
pub use jobs::{
    cancel_job_handler, create_job_handler, job_detail_handler, list_jobs_handler,
    rate_job_handler, CUSTOMER_ID_HEADER,
};
pub use location_ws::location_ws_handler;
pub use trust::{trust_ledger_handler, trust_score_handler};
pub use worker_actions::{
    accept_job_handler, arrive_handler, complete_work_handler, start_work_handler,
    WORKER_ID_HEADER,
};
