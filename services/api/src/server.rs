use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_gateway_routes;
use applicant_intake::config::{AppConfig, BackendConfig};
use applicant_intake::error::AppError;
use applicant_intake::gateways::{
    InMemoryBackend, IntakeGateway, SubmissionBackend, SupabaseBackend,
};
use applicant_intake::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if args.in_memory {
        info!("using in-memory storage and table backend");
        serve(config, Arc::new(InMemoryBackend::default())).await
    } else {
        let backend = SupabaseBackend::new(&BackendConfig::from_env()?)?;
        serve(config, Arc::new(backend)).await
    }
}

async fn serve<B>(config: AppConfig, backend: Arc<B>) -> Result<(), AppError>
where
    B: SubmissionBackend + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let intake = config.intake.clone();
    if intake.upload_bucket != intake.public_url_bucket {
        warn!(
            upload_bucket = %intake.upload_bucket,
            public_url_bucket = %intake.public_url_bucket,
            "public links resolve against a different bucket than uploads are written to"
        );
    }

    let gateway = Arc::new(IntakeGateway::new(backend, intake));
    let app = with_gateway_routes(gateway)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(environment = %config.environment, %addr, "applicant intake gateways ready");

    axum::serve(listener, app).await?;
    Ok(())
}
