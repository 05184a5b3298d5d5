use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use quickcrew::application::services::{
    JobLifecycleService, LocationRelay, PricingEngine, TrustScoreService, WorkerCheckpointService,
};
use quickcrew::domain::TrustPolicy;
use quickcrew::infrastructure::dispatch::LogDispatcher;
use quickcrew::infrastructure::media::LocalMediaStore;
use quickcrew::infrastructure::observability::{TracingConfig, init_tracing};
use quickcrew::infrastructure::persistence::{create_pool, PgJobStore, PgTrustStore};
use quickcrew::infrastructure::settings::PgSettingsProvider;
use quickcrew::presentation::{AppState, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    init_tracing(TracingConfig::default(), settings.server.port);

    let pool = create_pool(&settings.database.url, settings.database.max_connections).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let runtime_settings = Arc::new(PgSettingsProvider::new(pool.clone()));
    runtime_settings.seed_defaults().await?;

    let policy = TrustPolicy::default();
    let job_store = Arc::new(PgJobStore::new(pool.clone(), policy));
    let trust_store = Arc::new(PgTrustStore::new(pool.clone(), policy));
    let media = Arc::new(LocalMediaStore::new(settings.media.root_dir.clone()));
    let dispatcher = Arc::new(LogDispatcher::new());

    let trust = Arc::new(TrustScoreService::new(trust_store, runtime_settings.clone()));
    let pricing = PricingEngine::new(runtime_settings.clone());
    let jobs = Arc::new(JobLifecycleService::new(
        job_store.clone(),
        trust.clone(),
        pricing,
        runtime_settings.clone(),
        dispatcher,
    ));
    let checkpoints = Arc::new(WorkerCheckpointService::new(
        job_store,
        runtime_settings.clone(),
        media,
    ));
    let relay = Arc::new(LocationRelay::new(settings.relay.position_ttl()));

    let state = AppState {
        jobs,
        checkpoints,
        trust,
        relay,
    };
    let router = create_router(state);

    let host: std::net::IpAddr = settings.server.host.parse()?;
    let addr = SocketAddr::new(host, settings.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
