//! Session lifecycle: `Started -> Completed`, with retake as the only way back.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::domain::{AssessmentSession, CandidateId, ExperienceBand, SessionStatus};

/// Score at or above which an answer counts toward its driver's confidence.
pub const SOLID_SCORE: u8 = 4;

/// Confidence every early-exit trait needs before the session may finish early.
pub const EARLY_EXIT_CONFIDENCE: u32 = 2;

pub const EARLY_EXIT_DRIVERS: [&str; 5] = [
    "resilience",
    "communication",
    "adaptability",
    "growth_potential",
    "emotional_stability",
];

/// Total number of questions asked per band.
pub const fn question_budget(band: ExperienceBand) -> u32 {
    match band {
        ExperienceBand::Fresher => 8,
        ExperienceBand::Mid => 10,
        ExperienceBand::Senior => 13,
        ExperienceBand::Leadership => 16,
    }
}

pub fn new_session(
    candidate: CandidateId,
    band: ExperienceBand,
    now: DateTime<Utc>,
) -> AssessmentSession {
    AssessmentSession {
        candidate_id: candidate,
        experience_band: band,
        status: SessionStatus::Started,
        total_budget: question_budget(band),
        current_step: 1,
        driver_confidence: BTreeMap::new(),
        integrity_warnings: 0,
        version: 0,
        overall_score: None,
        component_scores: BTreeMap::new(),
        started_at: now,
        completed_at: None,
    }
}

/// Move past the question just answered, crediting its driver on a solid score.
pub fn advance_step(session: &mut AssessmentSession, driver: Option<&str>, score: u8) {
    session.current_step += 1;

    if let Some(driver) = driver.map(str::trim).filter(|driver| !driver.is_empty()) {
        if score >= SOLID_SCORE {
            *session
                .driver_confidence
                .entry(driver.to_string())
                .or_insert(0) += 1;
        }
    }
}

pub fn budget_exhausted(session: &AssessmentSession) -> bool {
    session.current_step > session.total_budget
}

pub fn early_exit_reached(session: &AssessmentSession) -> bool {
    EARLY_EXIT_DRIVERS.iter().all(|driver| {
        session
            .driver_confidence
            .get(*driver)
            .is_some_and(|confidence| *confidence >= EARLY_EXIT_CONFIDENCE)
    })
}

pub fn is_complete(session: &AssessmentSession) -> bool {
    budget_exhausted(session) || early_exit_reached(session)
}
