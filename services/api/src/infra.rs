use async_trait::async_trait;
use hiretrust::config::OracleConfig;
use hiretrust::workflows::assessment::memory::{
    MemoryProfileStore, MemoryQuestionCatalog, MemoryResponseStore, MemoryScoreStore,
    MemorySessionStore,
};
use hiretrust::workflows::assessment::{
    AssessmentCollaborators, AssessmentNotification, GeminiOracle, GradingOracle,
    NotificationError, NotificationSink, OfflineOracle,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Notification sink for local runs: candidate-facing events are written to the log.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LoggingNotificationSink;

#[async_trait]
impl NotificationSink for LoggingNotificationSink {
    async fn deliver(&self, notification: &AssessmentNotification) -> Result<(), NotificationError> {
        info!(
            candidate_id = %notification.candidate_id,
            kind = %notification.kind,
            title = %notification.title,
            metadata = %notification.metadata,
            "candidate notification"
        );
        Ok(())
    }
}

/// Hosted oracle when credentials are present; otherwise every oracle call degrades.
pub(crate) fn grading_oracle(config: &OracleConfig) -> Arc<dyn GradingOracle> {
    let Some(api_key) = config.api_key.clone() else {
        warn!("ORACLE_API_KEY not set; grading falls back to neutral scores");
        return Arc::new(OfflineOracle);
    };

    match GeminiOracle::new(config, api_key) {
        Ok(oracle) => {
            info!(model = %config.model, "hosted grading oracle configured");
            Arc::new(oracle)
        }
        Err(err) => {
            warn!(error = %err, "hosted oracle unavailable; grading falls back to neutral scores");
            Arc::new(OfflineOracle)
        }
    }
}

pub(crate) fn in_memory_collaborators(oracle: Arc<dyn GradingOracle>) -> AssessmentCollaborators {
    AssessmentCollaborators {
        sessions: Arc::new(MemorySessionStore::default()),
        responses: Arc::new(MemoryResponseStore::default()),
        scores: Arc::new(MemoryScoreStore::default()),
        profiles: Arc::new(MemoryProfileStore::default()),
        catalog: Arc::new(MemoryQuestionCatalog::seeded()),
        oracle,
    }
}
