use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{
    AssessmentResponse, AssessmentSession, AssessmentStatus, CandidateId, CatalogQuestion,
    Category, ExperienceBand, ProfileScore, QuestionId, ResumeData,
};

/// Error enumeration for storage failures shared by every store.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record changed since it was read")]
    StaleWrite,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// One session row per candidate.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn fetch(&self, candidate: &CandidateId)
        -> Result<Option<AssessmentSession>, RepositoryError>;

    /// Fails with `Conflict` when the candidate already owns a session.
    async fn insert(&self, session: AssessmentSession)
        -> Result<AssessmentSession, RepositoryError>;

    /// Writes `session` only if the stored `version` still equals `expected_version`.
    /// Returns the row as stored, with its version bumped.
    async fn compare_and_update(
        &self,
        session: &AssessmentSession,
        expected_version: u64,
    ) -> Result<AssessmentSession, RepositoryError>;

    async fn delete(&self, candidate: &CandidateId) -> Result<(), RepositoryError>;
}

/// Append-only response log, purged only by a retake.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    async fn insert(&self, response: AssessmentResponse) -> Result<(), RepositoryError>;

    /// Responses in insertion order.
    async fn list(&self, candidate: &CandidateId)
        -> Result<Vec<AssessmentResponse>, RepositoryError>;

    async fn purge(&self, candidate: &CandidateId) -> Result<usize, RepositoryError>;
}

#[async_trait]
pub trait ScoreStore: Send + Sync {
    async fn fetch(&self, candidate: &CandidateId) -> Result<Option<ProfileScore>, RepositoryError>;

    async fn upsert(&self, score: ProfileScore) -> Result<(), RepositoryError>;
}

/// Candidate attributes owned by the profile module.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// `None` when the candidate never declared an experience level.
    async fn experience_band(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<ExperienceBand>, RepositoryError>;

    async fn resume_data(&self, candidate: &CandidateId)
        -> Result<Option<ResumeData>, RepositoryError>;

    async fn declared_skills(&self, candidate: &CandidateId) -> Result<Vec<String>, RepositoryError>;

    async fn set_assessment_status(
        &self,
        candidate: &CandidateId,
        status: AssessmentStatus,
    ) -> Result<(), RepositoryError>;

    async fn assessment_status(
        &self,
        candidate: &CandidateId,
    ) -> Result<AssessmentStatus, RepositoryError>;

    async fn set_final_profile_score(
        &self,
        candidate: &CandidateId,
        score: u8,
    ) -> Result<(), RepositoryError>;

    async fn is_blocked(&self, candidate: &CandidateId) -> Result<bool, RepositoryError>;

    async fn block_candidate(
        &self,
        candidate: &CandidateId,
        reason: &str,
    ) -> Result<(), RepositoryError>;
}

/// Read-only question pool.
#[async_trait]
pub trait QuestionCatalog: Send + Sync {
    /// `band = None` widens the query to every band.
    async fn query(
        &self,
        category: Category,
        band: Option<ExperienceBand>,
        excluding: &[QuestionId],
    ) -> Result<Vec<CatalogQuestion>, RepositoryError>;
}

/// Outbound notification transport (in-app inbox, e-mail, ...).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &AssessmentNotification)
        -> Result<(), NotificationError>;
}

/// Event payload handed to the notification sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentNotification {
    pub candidate_id: CandidateId,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub metadata: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
