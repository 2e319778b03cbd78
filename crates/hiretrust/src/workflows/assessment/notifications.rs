use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::warn;

use super::repository::{AssessmentNotification, NotificationSink};

const DELIVERY_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Sending half held by the engine. Emitting never waits on delivery.
#[derive(Debug, Clone)]
pub struct NotificationOutbox {
    sender: mpsc::UnboundedSender<AssessmentNotification>,
}

/// Receiving half, drained by a [`NotificationDispatcher`] or by tests.
pub type NotificationInbox = mpsc::UnboundedReceiver<AssessmentNotification>;

impl NotificationOutbox {
    pub fn channel() -> (Self, NotificationInbox) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn emit(&self, notification: AssessmentNotification) {
        if let Err(err) = self.sender.send(notification) {
            warn!(
                candidate_id = %err.0.candidate_id,
                kind = %err.0.kind,
                "notification dropped: dispatcher stopped"
            );
        }
    }
}

/// Consumer delivering queued notifications to a sink with bounded retries.
pub struct NotificationDispatcher {
    inbox: NotificationInbox,
    sink: Arc<dyn NotificationSink>,
}

impl NotificationDispatcher {
    pub fn new(inbox: NotificationInbox, sink: Arc<dyn NotificationSink>) -> Self {
        Self { inbox, sink }
    }

    /// Runs until every outbox handle is dropped.
    pub async fn run(mut self) {
        while let Some(notification) = self.inbox.recv().await {
            self.deliver(&notification).await;
        }
    }

    async fn deliver(&self, notification: &AssessmentNotification) {
        for attempt in 1..=DELIVERY_ATTEMPTS {
            match self.sink.deliver(notification).await {
                Ok(()) => return,
                Err(err) if attempt < DELIVERY_ATTEMPTS => {
                    warn!(attempt, error = %err, "notification delivery failed; retrying");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(err) => {
                    warn!(
                        candidate_id = %notification.candidate_id,
                        kind = %notification.kind,
                        error = %err,
                        "notification abandoned"
                    );
                }
            }
        }
    }
}
