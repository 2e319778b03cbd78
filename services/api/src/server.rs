use crate::cli::ServeArgs;
use crate::infra::{grading_oracle, in_memory_collaborators, AppState, LoggingNotificationSink};
use crate::routes::with_assessment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use hiretrust::config::AppConfig;
use hiretrust::error::AppError;
use hiretrust::telemetry;
use hiretrust::workflows::assessment::{
    AssessmentEngine, NotificationDispatcher, NotificationOutbox,
};
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

    let (outbox, inbox) = NotificationOutbox::channel();
    tokio::spawn(NotificationDispatcher::new(inbox, Arc::new(LoggingNotificationSink)).run());

    let oracle = grading_oracle(&config.oracle);
    let engine = Arc::new(AssessmentEngine::new(
        in_memory_collaborators(oracle),
        outbox,
        config.assessment.clone(),
    ));

    let app = with_assessment_routes(engine)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "assessment service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
