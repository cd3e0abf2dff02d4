use crate::cli::ServeArgs;
use crate::demo::seed_demo_data;
use crate::infra::{in_memory_backend, ApiServices, AppState};
use crate::routes::with_api_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use landlord_hub::backend::InMemoryDocumentStore;
use landlord_hub::clock::{Clock, SystemClock};
use landlord_hub::config::{AppConfig, AppEnvironment};
use landlord_hub::error::AppError;
use landlord_hub::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = InMemoryDocumentStore::new();
    if config.environment != AppEnvironment::Production {
        seed_demo_data(&store, clock.now())?;
        info!("seeded demo portfolio");
    }
    let backend = in_memory_backend(&store, clock.clone());
    let services = ApiServices::new(&config, backend, clock);

    let app = with_api_routes(&services)
        .layer(Extension(services))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        fallback = ?config.invites.fallback,
        %addr,
        "landlord dashboard api ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
