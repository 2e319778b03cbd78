//! Adaptive next-question policy.
//!
//! Categories are tried in priority order (resume, skill, behavioral, psychometric) against
//! per-band targets. Generated categories fall through when candidate data or the oracle
//! cannot produce a question; catalog categories always resolve, ending at a hand-authored
//! fallback, so an incomplete session never runs out of questions.

mod fallback;
mod generators;
mod targets;

pub use fallback::fallback_question;
pub use generators::{pick_skill, ResumeProbe, SKILL_CLOSING_CLAUSE};
pub use targets::{selection_weights, target_counts};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use tracing::{debug, warn};

use super::domain::{
    AssessmentResponse, AssessmentSession, CandidateId, Category, ExperienceBand, Question,
    QuestionId, ResumeData,
};
use super::oracle::GradingOracle;
use super::repository::{ProfileStore, QuestionCatalog, RepositoryError, ResponseStore};

/// Decides which question a candidate sees next.
pub struct QuestionSelector {
    profiles: Arc<dyn ProfileStore>,
    responses: Arc<dyn ResponseStore>,
    catalog: Arc<dyn QuestionCatalog>,
    oracle: Arc<dyn GradingOracle>,
    oracle_timeout: Duration,
}

/// What the selector already knows about the session's answered questions.
#[derive(Debug, Default)]
pub(crate) struct AskedSoFar {
    pub counts: BTreeMap<Category, u32>,
    pub answered_ids: Vec<QuestionId>,
    pub tested_skills: Vec<String>,
}

impl AskedSoFar {
    pub(crate) fn from_responses(responses: &[AssessmentResponse]) -> Self {
        let mut asked = AskedSoFar::default();
        for response in responses {
            *asked.counts.entry(response.category).or_insert(0) += 1;
            if let Some(id) = &response.question_id {
                asked.answered_ids.push(id.clone());
            }
            if response.category == Category::Skill {
                if let Some(driver) = &response.driver {
                    asked.tested_skills.push(driver.clone());
                }
            }
        }
        asked
    }

    fn count(&self, category: Category) -> u32 {
        self.counts.get(&category).copied().unwrap_or(0)
    }
}

impl QuestionSelector {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        responses: Arc<dyn ResponseStore>,
        catalog: Arc<dyn QuestionCatalog>,
        oracle: Arc<dyn GradingOracle>,
        oracle_timeout: Duration,
    ) -> Self {
        Self {
            profiles,
            responses,
            catalog,
            oracle,
            oracle_timeout,
        }
    }

    pub async fn next_question(
        &self,
        session: &AssessmentSession,
    ) -> Result<Question, RepositoryError> {
        let candidate = &session.candidate_id;
        let band = session.experience_band;
        let targets = target_counts(band, session.total_budget);
        let asked = AskedSoFar::from_responses(&self.responses.list(candidate).await?);
        let below_target =
            |category: Category| asked.count(category) < targets.get(&category).copied().unwrap_or(0);

        if below_target(Category::Resume) {
            if let Some(resume) = self.optional_resume(candidate).await {
                if let Some(question) = generators::resume_question(
                    self.oracle.as_ref(),
                    self.oracle_timeout,
                    &resume,
                    asked.count(Category::Resume),
                )
                .await
                {
                    debug!(%candidate, driver = %question.driver, "selected resume question");
                    return Ok(question);
                }
            }
        }

        if below_target(Category::Skill) {
            let skills = self.optional_skills(candidate).await;
            if !skills.is_empty() {
                if let Some(question) = generators::skill_question(
                    self.oracle.as_ref(),
                    self.oracle_timeout,
                    band,
                    &skills,
                    &asked.tested_skills,
                )
                .await
                {
                    debug!(%candidate, driver = %question.driver, "selected skill question");
                    return Ok(question);
                }
            }
        }

        let category = if below_target(Category::Behavioral) {
            Category::Behavioral
        } else if below_target(Category::Psychometric) {
            Category::Psychometric
        } else {
            let pool = [Category::Behavioral, Category::Psychometric];
            *pool
                .choose(&mut rand::thread_rng())
                .unwrap_or(&Category::Behavioral)
        };

        let question = self
            .predefined_question(category, band, &asked.answered_ids)
            .await?;
        debug!(%candidate, category = %question.category, "selected predefined question");
        Ok(question)
    }

    /// Catalog lookup: band pool, then any band, then the hand-authored fallback.
    pub async fn predefined_question(
        &self,
        category: Category,
        band: ExperienceBand,
        answered: &[QuestionId],
    ) -> Result<Question, RepositoryError> {
        let mut pool = self.catalog.query(category, Some(band), answered).await?;
        if pool.is_empty() {
            pool = self.catalog.query(category, None, answered).await?;
        }

        // The catalog may ignore `excluding`; filter again.
        pool.retain(|entry| !answered.contains(&entry.id));

        let picked = pool.choose(&mut rand::thread_rng()).cloned();
        Ok(match picked {
            Some(entry) => entry.into(),
            None => fallback_question(category),
        })
    }

    async fn optional_resume(&self, candidate: &CandidateId) -> Option<ResumeData> {
        match self.profiles.resume_data(candidate).await {
            Ok(resume) => resume,
            Err(err) => {
                warn!(%candidate, error = %err, "resume data unreadable; skipping resume questions");
                None
            }
        }
    }

    async fn optional_skills(&self, candidate: &CandidateId) -> Vec<String> {
        match self.profiles.declared_skills(candidate).await {
            Ok(skills) => skills,
            Err(err) => {
                warn!(%candidate, error = %err, "declared skills unreadable; skipping skill questions");
                Vec::new()
            }
        }
    }
}
