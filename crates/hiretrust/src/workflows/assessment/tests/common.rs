use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use chrono::Utc;
use serde_json::Value;

use crate::config::AssessmentConfig;
use crate::workflows::assessment::domain::{
    AssessmentResponse, AssessmentSession, CandidateId, CareerGaps, Category, Difficulty,
    EvaluationMetadata, EvaluatorKind, ExperienceBand, ProfileScore, ResumeData,
    SubmissionMetadata, TimelineEntry,
};
use crate::workflows::assessment::memory::{
    CandidateProfile, MemoryProfileStore, MemoryQuestionCatalog, MemoryResponseStore,
    MemoryScoreStore, MemorySessionStore,
};
use crate::workflows::assessment::notifications::{NotificationInbox, NotificationOutbox};
use crate::workflows::assessment::oracle::{GradingOracle, OracleError};
use crate::workflows::assessment::repository::{RepositoryError, SessionStore};
use crate::workflows::assessment::service::{
    AnswerSubmission, AssessmentCollaborators, AssessmentEngine,
};

/// Oracle replaying canned replies in order, unavailable once the script runs dry.
#[derive(Default)]
pub(super) struct ScriptedOracle {
    replies: Mutex<VecDeque<Result<String, OracleError>>>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub(super) fn replying(replies: Vec<Result<String, OracleError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn grading(scores: &[u8]) -> Self {
        Self::replying(scores.iter().map(|score| Ok(verdict(*score))).collect())
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GradingOracle for ScriptedOracle {
    async fn generate(&self, _prompt: &str) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .expect("oracle mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Unavailable("script exhausted".to_string())))
    }
}

/// Oracle that never answers inside any realistic deadline.
pub(super) struct StalledOracle;

#[async_trait]
impl GradingOracle for StalledOracle {
    async fn generate(&self, _prompt: &str) -> Result<String, OracleError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(verdict(6))
    }
}

/// Edit applied to the stored row by a competing writer.
pub(super) type CompetingWrite = Box<dyn FnOnce(&mut AssessmentSession) + Send>;

/// Session store that loses the first `races` compare-and-swap attempts, and can commit a
/// competing write just before a chosen attempt reaches the inner store.
pub(super) struct RacingSessionStore {
    pub(super) inner: MemorySessionStore,
    pub(super) races: Mutex<u32>,
    pub(super) competing: Mutex<Option<(u32, CompetingWrite)>>,
}

impl RacingSessionStore {
    fn take_competing_write(&self) -> Option<CompetingWrite> {
        let mut competing = self.competing.lock().expect("competing mutex poisoned");
        let due = match competing.as_mut() {
            Some((skip, _)) if *skip > 0 => {
                *skip -= 1;
                false
            }
            Some(_) => true,
            None => false,
        };
        if due {
            competing.take().map(|(_, write)| write)
        } else {
            None
        }
    }
}

#[async_trait]
impl SessionStore for RacingSessionStore {
    async fn fetch(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<AssessmentSession>, RepositoryError> {
        self.inner.fetch(candidate).await
    }

    async fn insert(
        &self,
        session: AssessmentSession,
    ) -> Result<AssessmentSession, RepositoryError> {
        self.inner.insert(session).await
    }

    async fn compare_and_update(
        &self,
        session: &AssessmentSession,
        expected_version: u64,
    ) -> Result<AssessmentSession, RepositoryError> {
        {
            let mut races = self.races.lock().expect("race mutex poisoned");
            if *races > 0 {
                *races -= 1;
                return Err(RepositoryError::StaleWrite);
            }
        }

        if let Some(write) = self.take_competing_write() {
            let mut stored = self
                .inner
                .fetch(&session.candidate_id)
                .await?
                .ok_or(RepositoryError::NotFound)?;
            let version = stored.version;
            write(&mut stored);
            self.inner.compare_and_update(&stored, version).await?;
        }

        self.inner.compare_and_update(session, expected_version).await
    }

    async fn delete(&self, candidate: &CandidateId) -> Result<(), RepositoryError> {
        self.inner.delete(candidate).await
    }
}

pub(super) fn verdict(score: u8) -> String {
    format!("{{\"score\": {score}, \"reasoning\": \"scripted\"}}")
}

pub(super) fn candidate() -> CandidateId {
    CandidateId("cand-7".to_string())
}

pub(super) fn assessment_config() -> AssessmentConfig {
    AssessmentConfig {
        oracle_timeout: Duration::from_secs(15),
        fallback_score: 3,
        chat_unlock_score: 50,
    }
}

pub(super) fn resume() -> ResumeData {
    ResumeData {
        timeline: vec![
            TimelineEntry {
                role: "Sales Associate".to_string(),
                organization: "Contoso Retail".to_string(),
                start: None,
                end: None,
            },
            TimelineEntry {
                role: "Account Executive".to_string(),
                organization: "Fabrikam".to_string(),
                start: None,
                end: None,
            },
        ],
        career_gaps: CareerGaps {
            count: 1,
            periods: Vec::new(),
        },
        achievements: vec!["Grew regional revenue 40%".to_string()],
    }
}

pub(super) fn profile(band: ExperienceBand) -> CandidateProfile {
    CandidateProfile {
        experience: Some(band),
        ..CandidateProfile::default()
    }
}

pub(super) fn answer(category: Category, text: &str, driver: Option<&str>) -> AnswerSubmission {
    AnswerSubmission {
        question_id: None,
        category,
        answer: text.to_string(),
        difficulty: Difficulty::Medium,
        metadata: SubmissionMetadata {
            text: Some("Tell us about a time you were under pressure.".to_string()),
            driver: driver.map(str::to_string),
            evaluation_rubric: None,
            tab_switches: 0,
        },
    }
}

pub(super) fn stored_response(
    candidate: &CandidateId,
    category: Category,
    score: u8,
) -> AssessmentResponse {
    AssessmentResponse {
        id: format!("seed-{category}-{score}"),
        candidate_id: candidate.clone(),
        question_id: None,
        question_text: None,
        category,
        driver: None,
        raw_answer: "seeded".to_string(),
        score,
        is_skipped: false,
        evaluation_metadata: EvaluationMetadata {
            evaluator: EvaluatorKind::OracleGraded,
            rationale: String::new(),
            evaluation_rubric: None,
        },
        difficulty: Difficulty::Medium,
        tab_switches: 0,
        created_at: Utc::now(),
    }
}

pub(super) fn best_score(candidate: &CandidateId, final_score: u8) -> ProfileScore {
    ProfileScore {
        candidate_id: candidate.clone(),
        resume_score: 0,
        behavioral_score: 0,
        psychometric_score: 0,
        skills_score: 0,
        final_score,
        updated_at: Utc::now(),
    }
}

/// Engine wired to in-memory stores, with handles kept for assertions.
pub(super) struct Harness {
    pub(super) engine: Arc<AssessmentEngine>,
    pub(super) racing: Arc<RacingSessionStore>,
    pub(super) sessions: MemorySessionStore,
    pub(super) responses: MemoryResponseStore,
    pub(super) scores: MemoryScoreStore,
    pub(super) profiles: MemoryProfileStore,
    pub(super) inbox: NotificationInbox,
}

impl Harness {
    pub(super) fn new(oracle: Arc<dyn GradingOracle>) -> Self {
        Self::racing(oracle, 0)
    }

    /// Harness whose session store loses the first `races` compare-and-swap attempts.
    pub(super) fn racing(oracle: Arc<dyn GradingOracle>, races: u32) -> Self {
        let sessions = MemorySessionStore::default();
        let responses = MemoryResponseStore::default();
        let scores = MemoryScoreStore::default();
        let profiles = MemoryProfileStore::default();
        let (outbox, inbox) = NotificationOutbox::channel();

        let racing = Arc::new(RacingSessionStore {
            inner: sessions.clone(),
            races: Mutex::new(races),
            competing: Mutex::new(None),
        });

        let collaborators = AssessmentCollaborators {
            sessions: racing.clone(),
            responses: Arc::new(responses.clone()),
            scores: Arc::new(scores.clone()),
            profiles: Arc::new(profiles.clone()),
            catalog: Arc::new(MemoryQuestionCatalog::seeded()),
            oracle,
        };
        let engine = Arc::new(AssessmentEngine::new(
            collaborators,
            outbox,
            assessment_config(),
        ));

        Self {
            engine,
            racing,
            sessions,
            responses,
            scores,
            profiles,
            inbox,
        }
    }

    /// Commits `write` to the stored session right before the engine's compare-and-swap,
    /// after letting `skip` earlier swaps through untouched.
    pub(super) fn compete_before_swap(
        &self,
        skip: u32,
        write: impl FnOnce(&mut AssessmentSession) + Send + 'static,
    ) {
        let write: CompetingWrite = Box::new(write);
        *self.racing.competing.lock().expect("competing mutex poisoned") = Some((skip, write));
    }

    pub(super) fn drain_notifications(&mut self) -> usize {
        let mut drained = 0;
        while self.inbox.try_recv().is_ok() {
            drained += 1;
        }
        drained
    }
}

pub(super) async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
