use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for candidates owning an assessment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identifier of a catalog question. Generated questions have none.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(pub String);

/// Seniority bracket fixed at session creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceBand {
    Fresher,
    Mid,
    Senior,
    Leadership,
}

impl ExperienceBand {
    pub const ALL: [ExperienceBand; 4] = [
        ExperienceBand::Fresher,
        ExperienceBand::Mid,
        ExperienceBand::Senior,
        ExperienceBand::Leadership,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ExperienceBand::Fresher => "fresher",
            ExperienceBand::Mid => "mid",
            ExperienceBand::Senior => "senior",
            ExperienceBand::Leadership => "leadership",
        }
    }
}

/// Question and scoring category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Resume,
    Skill,
    Behavioral,
    Psychometric,
    Reference,
}

impl Category {
    pub const fn label(self) -> &'static str {
        match self {
            Category::Resume => "resume",
            Category::Skill => "skill",
            Category::Behavioral => "behavioral",
            Category::Psychometric => "psychometric",
            Category::Reference => "reference",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Low,
    #[default]
    Medium,
    High,
}

/// A question handed to the caller; `id` is absent for generated questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<QuestionId>,
    pub text: String,
    pub category: Category,
    pub driver: String,
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_rubric: Option<String>,
}

/// Catalog entry keyed by `(category, band)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogQuestion {
    pub id: QuestionId,
    pub band: ExperienceBand,
    pub text: String,
    pub category: Category,
    pub driver: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub evaluation_rubric: Option<String>,
}

impl From<CatalogQuestion> for Question {
    fn from(entry: CatalogQuestion) -> Self {
        Question {
            id: Some(entry.id),
            text: entry.text,
            category: entry.category,
            driver: entry.driver,
            difficulty: entry.difficulty,
            evaluation_rubric: entry.evaluation_rubric,
        }
    }
}

/// Parsed resume slices used for resume-derived questions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResumeData {
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    #[serde(default)]
    pub career_gaps: CareerGaps,
    #[serde(default)]
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub role: String,
    pub organization: String,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CareerGaps {
    pub count: u32,
    #[serde(default)]
    pub periods: Vec<GapPeriod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub months: u32,
}

/// Candidate-level assessment status mirrored on the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    #[default]
    NotStarted,
    Started,
    Completed,
    Disqualified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Started,
    Completed,
}

/// One active (or most recent) session per candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSession {
    pub candidate_id: CandidateId,
    pub experience_band: ExperienceBand,
    pub status: SessionStatus,
    pub total_budget: u32,
    pub current_step: u32,
    pub driver_confidence: BTreeMap<String, u32>,
    #[serde(default)]
    pub integrity_warnings: u32,
    /// Bumped by the store on every successful write.
    #[serde(default)]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_score: Option<u8>,
    #[serde(default)]
    pub component_scores: BTreeMap<Category, u8>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Who produced a response's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluatorKind {
    OracleGraded,
    Fallback,
    Skipped,
}

/// Question context supplied by the caller alongside an answer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SubmissionMetadata {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub evaluation_rubric: Option<String>,
    #[serde(default)]
    pub tab_switches: u32,
}

/// Audit trail stored with every response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetadata {
    pub evaluator: EvaluatorKind,
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_rubric: Option<String>,
}

/// Immutable record of one answered or skipped question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResponse {
    pub id: String,
    pub candidate_id: CandidateId,
    pub question_id: Option<QuestionId>,
    pub question_text: Option<String>,
    pub category: Category,
    pub driver: Option<String>,
    pub raw_answer: String,
    pub score: u8,
    pub is_skipped: bool,
    pub evaluation_metadata: EvaluationMetadata,
    pub difficulty: Difficulty,
    pub tab_switches: u32,
    pub created_at: DateTime<Utc>,
}

/// Best-ever scores across completed sessions. Never regresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileScore {
    pub candidate_id: CandidateId,
    pub resume_score: u8,
    pub behavioral_score: u8,
    pub psychometric_score: u8,
    pub skills_score: u8,
    pub final_score: u8,
    pub updated_at: DateTime<Utc>,
}
