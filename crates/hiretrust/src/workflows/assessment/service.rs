use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use super::access::{self, FeatureAccess};
use super::domain::{
    AssessmentResponse, AssessmentSession, AssessmentStatus, CandidateId, Category, Difficulty,
    ExperienceBand, ProfileScore, Question, QuestionId, SessionStatus, SubmissionMetadata,
};
use super::grading::{GradedAnswer, GradingPipeline};
use super::integrity::{self, IntegrityOutcome};
use super::notifications::NotificationOutbox;
use super::oracle::GradingOracle;
use super::repository::{
    AssessmentNotification, ProfileStore, QuestionCatalog, RepositoryError, ResponseStore,
    ScoreStore, SessionStore,
};
use super::scoring;
use super::selection::QuestionSelector;
use super::session;
use crate::config::AssessmentConfig;

/// Compare-and-swap attempts before a contended session write is reported.
const MAX_SESSION_WRITE_ATTEMPTS: u32 = 3;

pub const COMPLETION_NOTIFICATION: &str = "ASSESSMENT_COMPLETED";

static RESPONSE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_response_id() -> String {
    let id = RESPONSE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("resp-{id:06}")
}

/// Collaborators injected by the process bootstrap.
#[derive(Clone)]
pub struct AssessmentCollaborators {
    pub sessions: Arc<dyn SessionStore>,
    pub responses: Arc<dyn ResponseStore>,
    pub scores: Arc<dyn ScoreStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub catalog: Arc<dyn QuestionCatalog>,
    pub oracle: Arc<dyn GradingOracle>,
}

/// Answer payload accepted from the API layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    #[serde(default)]
    pub question_id: Option<QuestionId>,
    pub category: Category,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub metadata: SubmissionMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub status: &'static str,
    pub score: u8,
    pub is_skipped: bool,
    pub assessment_complete: bool,
}

/// Reported on completion. `score` is the best known score, not necessarily this session's.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionReport {
    pub status: SessionStatus,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NextQuestion {
    Ask(Question),
    Completed(CompletionReport),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetakeReceipt {
    pub status: AssessmentStatus,
    pub session: AssessmentSession,
}

/// Error raised by the assessment engine.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentError {
    #[error("session not found")]
    SessionNotFound,
    #[error("candidate is blocked from assessments")]
    Blocked,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Adaptive assessment engine: session lifecycle, selection, grading and scoring.
pub struct AssessmentEngine {
    sessions: Arc<dyn SessionStore>,
    responses: Arc<dyn ResponseStore>,
    scores: Arc<dyn ScoreStore>,
    profiles: Arc<dyn ProfileStore>,
    selector: QuestionSelector,
    grading: GradingPipeline,
    outbox: NotificationOutbox,
    config: AssessmentConfig,
}

impl AssessmentEngine {
    pub fn new(
        collaborators: AssessmentCollaborators,
        outbox: NotificationOutbox,
        config: AssessmentConfig,
    ) -> Self {
        let selector = QuestionSelector::new(
            collaborators.profiles.clone(),
            collaborators.responses.clone(),
            collaborators.catalog,
            collaborators.oracle.clone(),
            config.oracle_timeout,
        );
        let grading = GradingPipeline::new(
            collaborators.oracle,
            config.oracle_timeout,
            config.fallback_score,
        );

        Self {
            sessions: collaborators.sessions,
            responses: collaborators.responses,
            scores: collaborators.scores,
            profiles: collaborators.profiles,
            selector,
            grading,
            outbox,
            config,
        }
    }

    pub async fn start_or_resume_session(
        &self,
        candidate: &CandidateId,
    ) -> Result<AssessmentSession, AssessmentError> {
        self.ensure_not_blocked(candidate).await?;
        self.get_or_create_session(candidate).await
    }

    /// Returns the candidate's session, creating a `Started` one on first contact.
    pub async fn get_or_create_session(
        &self,
        candidate: &CandidateId,
    ) -> Result<AssessmentSession, AssessmentError> {
        if let Some(existing) = self.sessions.fetch(candidate).await? {
            return Ok(existing);
        }

        let band = match self.profiles.experience_band(candidate).await {
            Ok(Some(band)) => band,
            Ok(None) => ExperienceBand::Fresher,
            Err(err) => {
                warn!(%candidate, error = %err, "experience band unreadable; using fresher");
                ExperienceBand::Fresher
            }
        };

        let fresh = session::new_session(candidate.clone(), band, Utc::now());
        match self.sessions.insert(fresh).await {
            Ok(stored) => {
                self.profiles
                    .set_assessment_status(candidate, AssessmentStatus::Started)
                    .await?;
                info!(
                    %candidate,
                    band = band.label(),
                    budget = stored.total_budget,
                    "assessment session created"
                );
                Ok(stored)
            }
            Err(RepositoryError::Conflict) => self
                .sessions
                .fetch(candidate)
                .await?
                .ok_or(AssessmentError::Repository(RepositoryError::Conflict)),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn next_question(
        &self,
        candidate: &CandidateId,
    ) -> Result<NextQuestion, AssessmentError> {
        self.ensure_not_blocked(candidate).await?;
        let session = self.get_or_create_session(candidate).await?;

        if session.status == SessionStatus::Completed {
            let best = self.scores.fetch(candidate).await?.map(|best| best.final_score);
            let score = best
                .into_iter()
                .chain(session.overall_score)
                .max()
                .unwrap_or(0);
            return Ok(NextQuestion::Completed(CompletionReport {
                status: SessionStatus::Completed,
                score,
            }));
        }

        if session::is_complete(&session) {
            let report = self.complete_assessment(session).await?;
            return Ok(NextQuestion::Completed(report));
        }

        let question = self.selector.next_question(&session).await?;
        Ok(NextQuestion::Ask(question))
    }

    pub async fn submit_answer(
        &self,
        candidate: &CandidateId,
        submission: AnswerSubmission,
    ) -> Result<SubmissionReceipt, AssessmentError> {
        self.ensure_not_blocked(candidate).await?;
        let graded = self
            .grading
            .evaluate_answer(&submission.answer, submission.category, &submission.metadata)
            .await;
        self.store_response(candidate, submission, graded).await
    }

    /// Advances the session, then appends the response. A missing session is a hard error.
    pub async fn store_response(
        &self,
        candidate: &CandidateId,
        submission: AnswerSubmission,
        graded: GradedAnswer,
    ) -> Result<SubmissionReceipt, AssessmentError> {
        let driver = submission.metadata.driver.clone();
        let score = graded.score;

        let session = self
            .mutate_session(candidate, |current| {
                session::advance_step(current, driver.as_deref(), score)
            })
            .await?;

        let response = AssessmentResponse {
            id: next_response_id(),
            candidate_id: candidate.clone(),
            question_id: submission.question_id,
            question_text: submission.metadata.text.clone(),
            category: submission.category,
            driver,
            raw_answer: submission.answer,
            score,
            is_skipped: graded.is_skipped,
            evaluation_metadata: graded.metadata,
            difficulty: submission.difficulty,
            tab_switches: submission.metadata.tab_switches,
            created_at: Utc::now(),
        };
        self.responses.insert(response).await?;

        let assessment_complete = if session.status == SessionStatus::Started
            && session::is_complete(&session)
        {
            self.complete_assessment(session).await?;
            true
        } else {
            session.status == SessionStatus::Completed
        };

        Ok(SubmissionReceipt {
            status: "ok",
            score,
            is_skipped: graded.is_skipped,
            assessment_complete,
        })
    }

    /// Aggregates the session's responses and applies best-score retention.
    pub async fn complete_assessment(
        &self,
        session: AssessmentSession,
    ) -> Result<CompletionReport, AssessmentError> {
        let candidate = session.candidate_id;
        let responses = self.responses.list(&candidate).await?;
        let card = scoring::aggregate(session.experience_band, &responses);
        let previous = self.scores.fetch(&candidate).await?;

        // Set by whichever attempt actually moved the stored row out of `Started`.
        let mut first_completion = false;
        self.mutate_session(&candidate, |current| {
            first_completion = current.status == SessionStatus::Started;
            current.status = SessionStatus::Completed;
            current.overall_score = Some(card.overall_score);
            current.component_scores = card.component_scores.clone();
            current.completed_at = current.completed_at.or_else(|| Some(Utc::now()));
        })
        .await?;
        self.profiles
            .set_assessment_status(&candidate, AssessmentStatus::Completed)
            .await?;

        let improved = previous
            .as_ref()
            .map_or(true, |best| card.overall_score >= best.final_score);
        if improved {
            let component = |category: Category| {
                card.component_scores.get(&category).copied().unwrap_or(0)
            };
            self.scores
                .upsert(ProfileScore {
                    candidate_id: candidate.clone(),
                    resume_score: component(Category::Resume),
                    behavioral_score: component(Category::Behavioral),
                    psychometric_score: component(Category::Psychometric),
                    skills_score: component(Category::Skill),
                    final_score: card.overall_score,
                    updated_at: Utc::now(),
                })
                .await?;
            self.profiles
                .set_final_profile_score(&candidate, card.overall_score)
                .await?;
        }

        let reported = previous.map_or(card.overall_score, |best| {
            best.final_score.max(card.overall_score)
        });

        if first_completion {
            info!(
                %candidate,
                session_score = card.overall_score,
                best_score = reported,
                responses = responses.len(),
                "assessment completed"
            );
            self.outbox.emit(AssessmentNotification {
                candidate_id: candidate.clone(),
                kind: COMPLETION_NOTIFICATION.to_string(),
                title: "Assessment Completed".to_string(),
                message: format!("Your assessment is complete. Your trust score is {reported}."),
                metadata: json!({ "score": reported, "session_score": card.overall_score }),
            });
        }

        Ok(CompletionReport {
            status: SessionStatus::Completed,
            score: reported,
        })
    }

    /// Current session; completed sessions are re-aggregated before being returned.
    pub async fn get_results(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<AssessmentSession>, AssessmentError> {
        let Some(session) = self.sessions.fetch(candidate).await? else {
            return Ok(None);
        };

        if session.status == SessionStatus::Completed {
            self.complete_assessment(session).await?;
            return Ok(self.sessions.fetch(candidate).await?);
        }

        Ok(Some(session))
    }

    /// Drops the session and its responses; the best-score aggregate is left untouched.
    pub async fn retake(&self, candidate: &CandidateId) -> Result<RetakeReceipt, AssessmentError> {
        self.ensure_not_blocked(candidate).await?;

        self.sessions.delete(candidate).await?;
        let purged = self.responses.purge(candidate).await?;
        self.profiles
            .set_assessment_status(candidate, AssessmentStatus::Started)
            .await?;
        let session = self.get_or_create_session(candidate).await?;

        info!(%candidate, purged, "assessment retake started");
        Ok(RetakeReceipt {
            status: AssessmentStatus::Started,
            session,
        })
    }

    pub async fn record_tab_switch(
        &self,
        candidate: &CandidateId,
    ) -> Result<IntegrityOutcome, AssessmentError> {
        let session = self
            .mutate_session(candidate, |current| current.integrity_warnings += 1)
            .await?;

        let outcome = integrity::judge_tab_switch(session.integrity_warnings);
        if let IntegrityOutcome::Blocked { warnings, .. } = &outcome {
            warn!(%candidate, warnings, "candidate blocked for integrity violations");
            self.profiles
                .block_candidate(candidate, integrity::BLOCK_REASON)
                .await?;
            self.profiles
                .set_assessment_status(candidate, AssessmentStatus::Disqualified)
                .await?;
        }

        Ok(outcome)
    }

    pub async fn feature_access(
        &self,
        candidate: &CandidateId,
    ) -> Result<FeatureAccess, AssessmentError> {
        let status = self.profiles.assessment_status(candidate).await?;
        let best = self.scores.fetch(candidate).await?;
        let blocked = self.profiles.is_blocked(candidate).await?;

        Ok(access::feature_access(
            status,
            best.as_ref(),
            blocked,
            self.config.chat_unlock_score,
        ))
    }

    async fn ensure_not_blocked(&self, candidate: &CandidateId) -> Result<(), AssessmentError> {
        if self.profiles.is_blocked(candidate).await? {
            return Err(AssessmentError::Blocked);
        }
        Ok(())
    }

    /// Read-modify-write keyed on the row version, retried when another writer got there first.
    async fn mutate_session<F>(
        &self,
        candidate: &CandidateId,
        mut change: F,
    ) -> Result<AssessmentSession, AssessmentError>
    where
        F: FnMut(&mut AssessmentSession) + Send,
    {
        let mut attempt = 1;
        loop {
            let mut session = self
                .sessions
                .fetch(candidate)
                .await?
                .ok_or(AssessmentError::SessionNotFound)?;
            let expected_version = session.version;
            change(&mut session);

            match self
                .sessions
                .compare_and_update(&session, expected_version)
                .await
            {
                Ok(stored) => return Ok(stored),
                Err(RepositoryError::StaleWrite) if attempt < MAX_SESSION_WRITE_ATTEMPTS => {
                    warn!(%candidate, attempt, "session changed concurrently; retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
