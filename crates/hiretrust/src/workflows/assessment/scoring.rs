use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{AssessmentResponse, Category, ExperienceBand};
use super::grading::MAX_SCORE;

/// Categories with more answers than this are trusted even when every score is zero.
const TRUSTED_SAMPLE: usize = 2;

/// Final-score weights per band. Distinct from the selection targets.
pub fn scoring_weights(band: ExperienceBand) -> [(Category, f64); 5] {
    let (resume, behavioral, psychometric, skill, reference) = match band {
        ExperienceBand::Fresher => (0.35, 0.25, 0.25, 0.10, 0.05),
        ExperienceBand::Mid => (0.30, 0.25, 0.25, 0.12, 0.08),
        ExperienceBand::Senior => (0.30, 0.28, 0.22, 0.10, 0.10),
        ExperienceBand::Leadership => (0.25, 0.25, 0.25, 0.15, 0.10),
    };

    [
        (Category::Resume, resume),
        (Category::Behavioral, behavioral),
        (Category::Psychometric, psychometric),
        (Category::Skill, skill),
        (Category::Reference, reference),
    ]
}

/// Aggregated outcome of one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCard {
    pub component_scores: BTreeMap<Category, u8>,
    pub overall_score: u8,
}

/// Mean 0-6 score rescaled to 0-100.
fn component_score(scores: &[u8]) -> u8 {
    let mean = mean(scores);
    (mean / f64::from(MAX_SCORE) * 100.0).round_ties_even() as u8
}

fn mean(scores: &[u8]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().map(|score| f64::from(*score)).sum::<f64>() / scores.len() as f64
}

/// Trust gate: a category of only one or two zero scores is treated as noise.
fn trusted(scores: &[u8]) -> bool {
    mean(scores) > 0.0 || scores.len() > TRUSTED_SAMPLE
}

pub fn aggregate(band: ExperienceBand, responses: &[AssessmentResponse]) -> ScoreCard {
    let mut by_category: BTreeMap<Category, Vec<u8>> = BTreeMap::new();
    for response in responses {
        by_category
            .entry(response.category)
            .or_default()
            .push(response.score.min(MAX_SCORE));
    }

    let component_scores: BTreeMap<Category, u8> = by_category
        .iter()
        .filter(|(_, scores)| !scores.is_empty())
        .map(|(category, scores)| (*category, component_score(scores)))
        .collect();

    let mut weighted_sum = 0.0;
    let mut weight_present = 0.0;
    for (category, weight) in scoring_weights(band) {
        let (Some(scores), Some(component)) =
            (by_category.get(&category), component_scores.get(&category))
        else {
            continue;
        };
        if !trusted(scores) {
            continue;
        }
        weighted_sum += f64::from(*component) * weight;
        weight_present += weight;
    }

    let overall_score = if weight_present > 0.0 {
        (weighted_sum / weight_present).round_ties_even() as u8
    } else if component_scores.is_empty() {
        0
    } else {
        let total: f64 = component_scores.values().map(|score| f64::from(*score)).sum();
        (total / component_scores.len() as f64).round_ties_even() as u8
    };

    ScoreCard {
        component_scores,
        overall_score,
    }
}
