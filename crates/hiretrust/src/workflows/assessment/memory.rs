//! In-memory collaborators for local runs and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::domain::{
    AssessmentResponse, AssessmentSession, AssessmentStatus, CandidateId, CatalogQuestion,
    Category, Difficulty, ExperienceBand, ProfileScore, QuestionId, ResumeData,
};
use super::repository::{
    AssessmentNotification, NotificationError, NotificationSink, ProfileStore, QuestionCatalog,
    RepositoryError, ResponseStore, ScoreStore, SessionStore,
};

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{name} mutex poisoned")))
}

#[derive(Default, Clone)]
pub struct MemorySessionStore {
    sessions: Arc<Mutex<HashMap<CandidateId, AssessmentSession>>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn fetch(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<AssessmentSession>, RepositoryError> {
        Ok(lock(&self.sessions, "session")?.get(candidate).cloned())
    }

    async fn insert(
        &self,
        session: AssessmentSession,
    ) -> Result<AssessmentSession, RepositoryError> {
        let mut guard = lock(&self.sessions, "session")?;
        if guard.contains_key(&session.candidate_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.candidate_id.clone(), session.clone());
        Ok(session)
    }

    async fn compare_and_update(
        &self,
        session: &AssessmentSession,
        expected_version: u64,
    ) -> Result<AssessmentSession, RepositoryError> {
        let mut guard = lock(&self.sessions, "session")?;
        match guard.get_mut(&session.candidate_id) {
            Some(stored) if stored.version == expected_version => {
                *stored = AssessmentSession {
                    version: expected_version + 1,
                    ..session.clone()
                };
                Ok(stored.clone())
            }
            Some(_) => Err(RepositoryError::StaleWrite),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn delete(&self, candidate: &CandidateId) -> Result<(), RepositoryError> {
        lock(&self.sessions, "session")?.remove(candidate);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct MemoryResponseStore {
    responses: Arc<Mutex<Vec<AssessmentResponse>>>,
}

#[async_trait]
impl ResponseStore for MemoryResponseStore {
    async fn insert(&self, response: AssessmentResponse) -> Result<(), RepositoryError> {
        lock(&self.responses, "response")?.push(response);
        Ok(())
    }

    async fn list(
        &self,
        candidate: &CandidateId,
    ) -> Result<Vec<AssessmentResponse>, RepositoryError> {
        Ok(lock(&self.responses, "response")?
            .iter()
            .filter(|response| &response.candidate_id == candidate)
            .cloned()
            .collect())
    }

    async fn purge(&self, candidate: &CandidateId) -> Result<usize, RepositoryError> {
        let mut guard = lock(&self.responses, "response")?;
        let before = guard.len();
        guard.retain(|response| &response.candidate_id != candidate);
        Ok(before - guard.len())
    }
}

#[derive(Default, Clone)]
pub struct MemoryScoreStore {
    scores: Arc<Mutex<HashMap<CandidateId, ProfileScore>>>,
}

#[async_trait]
impl ScoreStore for MemoryScoreStore {
    async fn fetch(&self, candidate: &CandidateId) -> Result<Option<ProfileScore>, RepositoryError> {
        Ok(lock(&self.scores, "score")?.get(candidate).cloned())
    }

    async fn upsert(&self, score: ProfileScore) -> Result<(), RepositoryError> {
        lock(&self.scores, "score")?.insert(score.candidate_id.clone(), score);
        Ok(())
    }
}

/// Candidate attributes as the profile module would expose them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateProfile {
    pub experience: Option<ExperienceBand>,
    pub resume: Option<ResumeData>,
    pub skills: Vec<String>,
    pub assessment_status: AssessmentStatus,
    pub final_profile_score: Option<u8>,
    pub blocked_reason: Option<String>,
}

#[derive(Default, Clone)]
pub struct MemoryProfileStore {
    profiles: Arc<Mutex<HashMap<CandidateId, CandidateProfile>>>,
}

impl MemoryProfileStore {
    pub fn put(&self, candidate: CandidateId, profile: CandidateProfile) {
        if let Ok(mut guard) = self.profiles.lock() {
            guard.insert(candidate, profile);
        }
    }

    pub fn profile(&self, candidate: &CandidateId) -> Option<CandidateProfile> {
        self.profiles
            .lock()
            .ok()
            .and_then(|guard| guard.get(candidate).cloned())
    }

    fn with_profile<T>(
        &self,
        candidate: &CandidateId,
        read: impl FnOnce(&CandidateProfile) -> T,
    ) -> Result<T, RepositoryError> {
        let guard = lock(&self.profiles, "profile")?;
        let empty = CandidateProfile::default();
        Ok(read(guard.get(candidate).unwrap_or(&empty)))
    }

    fn edit_profile(
        &self,
        candidate: &CandidateId,
        edit: impl FnOnce(&mut CandidateProfile),
    ) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.profiles, "profile")?;
        edit(guard.entry(candidate.clone()).or_default());
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn experience_band(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<ExperienceBand>, RepositoryError> {
        self.with_profile(candidate, |profile| profile.experience)
    }

    async fn resume_data(
        &self,
        candidate: &CandidateId,
    ) -> Result<Option<ResumeData>, RepositoryError> {
        self.with_profile(candidate, |profile| profile.resume.clone())
    }

    async fn declared_skills(&self, candidate: &CandidateId) -> Result<Vec<String>, RepositoryError> {
        self.with_profile(candidate, |profile| profile.skills.clone())
    }

    async fn set_assessment_status(
        &self,
        candidate: &CandidateId,
        status: AssessmentStatus,
    ) -> Result<(), RepositoryError> {
        self.edit_profile(candidate, |profile| profile.assessment_status = status)
    }

    async fn assessment_status(
        &self,
        candidate: &CandidateId,
    ) -> Result<AssessmentStatus, RepositoryError> {
        self.with_profile(candidate, |profile| profile.assessment_status)
    }

    async fn set_final_profile_score(
        &self,
        candidate: &CandidateId,
        score: u8,
    ) -> Result<(), RepositoryError> {
        self.edit_profile(candidate, |profile| profile.final_profile_score = Some(score))
    }

    async fn is_blocked(&self, candidate: &CandidateId) -> Result<bool, RepositoryError> {
        self.with_profile(candidate, |profile| profile.blocked_reason.is_some())
    }

    async fn block_candidate(
        &self,
        candidate: &CandidateId,
        reason: &str,
    ) -> Result<(), RepositoryError> {
        self.edit_profile(candidate, |profile| {
            profile.blocked_reason = Some(reason.to_string())
        })
    }
}

#[derive(Default, Clone)]
pub struct MemoryQuestionCatalog {
    questions: Arc<Vec<CatalogQuestion>>,
}

impl MemoryQuestionCatalog {
    pub fn new(questions: Vec<CatalogQuestion>) -> Self {
        Self {
            questions: Arc::new(questions),
        }
    }

    /// Behavioral and psychometric pools for every band, covering the early-exit traits.
    pub fn seeded() -> Self {
        const BEHAVIORAL: [(&str, &str); 4] = [
            (
                "adaptability",
                "Describe a time priorities changed overnight. How did you re-plan your work?",
            ),
            (
                "communication",
                "Tell us about a time you had to explain a difficult decision to a frustrated \
                 stakeholder. What did you say and what happened next?",
            ),
            (
                "resilience",
                "Walk us through a project that failed. What did you do in the following week?",
            ),
            (
                "growth_potential",
                "What is a skill you taught yourself in the last year, and how did you apply it?",
            ),
        ];
        const PSYCHOMETRIC: [(&str, &str); 4] = [
            (
                "emotional_stability",
                "A client criticises your work in front of your team. How do you respond in \
                 the moment and afterwards?",
            ),
            (
                "resilience",
                "You receive three rejections in one morning. How do you approach the afternoon?",
            ),
            (
                "adaptability",
                "Your manager reassigns you to an unfamiliar product mid-quarter. What are \
                 your first three moves?",
            ),
            (
                "emotional_stability",
                "How do you keep your judgement steady when a deadline is at risk?",
            ),
        ];

        let mut questions = Vec::new();
        for band in ExperienceBand::ALL {
            for (category, pool) in [
                (Category::Behavioral, &BEHAVIORAL),
                (Category::Psychometric, &PSYCHOMETRIC),
            ] {
                for (index, (driver, text)) in pool.iter().enumerate() {
                    questions.push(CatalogQuestion {
                        id: QuestionId(format!("{}-{}-{}", band.label(), category, index + 1)),
                        band,
                        text: (*text).to_string(),
                        category,
                        driver: (*driver).to_string(),
                        difficulty: Difficulty::Medium,
                        evaluation_rubric: None,
                    });
                }
            }
        }

        Self::new(questions)
    }
}

#[async_trait]
impl QuestionCatalog for MemoryQuestionCatalog {
    async fn query(
        &self,
        category: Category,
        band: Option<ExperienceBand>,
        excluding: &[QuestionId],
    ) -> Result<Vec<CatalogQuestion>, RepositoryError> {
        Ok(self
            .questions
            .iter()
            .filter(|question| question.category == category)
            .filter(|question| band.map_or(true, |band| question.band == band))
            .filter(|question| !excluding.contains(&question.id))
            .cloned()
            .collect())
    }
}

/// Sink recording every delivered notification.
#[derive(Default, Clone)]
pub struct MemoryNotificationSink {
    delivered: Arc<Mutex<Vec<AssessmentNotification>>>,
}

impl MemoryNotificationSink {
    pub fn delivered(&self) -> Vec<AssessmentNotification> {
        self.delivered
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl NotificationSink for MemoryNotificationSink {
    async fn deliver(
        &self,
        notification: &AssessmentNotification,
    ) -> Result<(), NotificationError> {
        self.delivered
            .lock()
            .map_err(|_| NotificationError::Transport("sink mutex poisoned".to_string()))?
            .push(notification.clone());
        Ok(())
    }
}
