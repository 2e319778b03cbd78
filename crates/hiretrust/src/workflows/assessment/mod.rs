//! Adaptive candidate assessment.
//!
//! A session picks the next question from the candidate's resume, declared skills and the
//! behavioral/psychometric catalog, grades free-text answers through a language-model oracle
//! with a neutral fallback, and rolls the graded responses into a weighted trust score. The
//! candidate's best score is retained across retakes and unlocks profile visibility and chat.

pub mod access;
pub mod domain;
pub mod grading;
pub mod integrity;
pub mod memory;
pub mod notifications;
pub mod oracle;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod selection;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

pub use access::FeatureAccess;
pub use domain::{
    AssessmentResponse, AssessmentSession, AssessmentStatus, CandidateId, CareerGaps,
    CatalogQuestion, Category, Difficulty, EvaluationMetadata, EvaluatorKind, ExperienceBand,
    GapPeriod, ProfileScore, Question, QuestionId, ResumeData, SessionStatus, SubmissionMetadata,
    TimelineEntry,
};
pub use grading::{GradeVerdict, GradedAnswer, GradingPipeline};
pub use integrity::IntegrityOutcome;
pub use notifications::{NotificationDispatcher, NotificationInbox, NotificationOutbox};
pub use oracle::{GeminiOracle, GradingOracle, OfflineOracle, OracleError};
pub use repository::{
    AssessmentNotification, NotificationError, NotificationSink, ProfileStore, QuestionCatalog,
    RepositoryError, ResponseStore, ScoreStore, SessionStore,
};
pub use router::assessment_router;
pub use scoring::ScoreCard;
pub use service::{
    AnswerSubmission, AssessmentCollaborators, AssessmentEngine, AssessmentError,
    CompletionReport, NextQuestion, RetakeReceipt, SubmissionReceipt,
};
