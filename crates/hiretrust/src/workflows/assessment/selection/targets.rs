use std::collections::BTreeMap;

use super::super::domain::{Category, ExperienceBand};

/// Category absorbing the rounding residue.
const FLEXIBLE: Category = Category::Behavioral;

/// Share of the question budget targeted per category.
/// Kept separate from the scoring weights; the two tables differ on purpose.
pub fn selection_weights(band: ExperienceBand) -> [(Category, f64); 4] {
    let (resume, behavioral, psychometric, skill) = match band {
        ExperienceBand::Fresher => (0.20, 0.35, 0.35, 0.10),
        ExperienceBand::Mid => (0.20, 0.30, 0.30, 0.20),
        ExperienceBand::Senior => (0.25, 0.30, 0.25, 0.20),
        ExperienceBand::Leadership => (0.25, 0.35, 0.25, 0.15),
    };

    [
        (Category::Resume, resume),
        (Category::Behavioral, behavioral),
        (Category::Psychometric, psychometric),
        (Category::Skill, skill),
    ]
}

/// Per-category question targets summing to `total_budget`.
pub fn target_counts(band: ExperienceBand, total_budget: u32) -> BTreeMap<Category, u32> {
    let mut targets: BTreeMap<Category, u32> = selection_weights(band)
        .into_iter()
        .map(|(category, weight)| {
            let share = (weight * f64::from(total_budget)).round() as u32;
            (category, share.max(1))
        })
        .collect();

    let assigned: i64 = targets.values().map(|count| i64::from(*count)).sum();
    let residue = i64::from(total_budget) - assigned;
    if let Some(flexible) = targets.get_mut(&FLEXIBLE) {
        let adjusted = (i64::from(*flexible) + residue).max(0);
        *flexible = u32::try_from(adjusted).unwrap_or(u32::MAX);
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::assessment::session::question_budget;

    #[test]
    fn targets_sum_to_budget_for_every_band() {
        for band in ExperienceBand::ALL {
            let budget = question_budget(band);
            let targets = target_counts(band, budget);
            assert_eq!(targets.values().sum::<u32>(), budget, "band {band:?}");
            assert!(targets.values().all(|count| *count >= 1));
        }
    }

    #[test]
    fn mid_band_targets_match_weights() {
        let targets = target_counts(ExperienceBand::Mid, 10);
        assert_eq!(targets[&Category::Resume], 2);
        assert_eq!(targets[&Category::Behavioral], 3);
        assert_eq!(targets[&Category::Psychometric], 3);
        assert_eq!(targets[&Category::Skill], 2);
    }

    #[test]
    fn fresher_residue_lands_in_behavioral() {
        // 1.6 -> 2, 2.8 -> 3, 2.8 -> 3, 0.8 -> 1 overshoots by one.
        let targets = target_counts(ExperienceBand::Fresher, 8);
        assert_eq!(targets[&Category::Resume], 2);
        assert_eq!(targets[&Category::Behavioral], 2);
        assert_eq!(targets[&Category::Psychometric], 3);
        assert_eq!(targets[&Category::Skill], 1);
    }

    #[test]
    fn tiny_budgets_keep_one_question_per_category_minimum() {
        let targets = target_counts(ExperienceBand::Fresher, 2);
        assert_eq!(targets[&Category::Resume], 1);
        assert_eq!(targets[&Category::Skill], 1);
        assert_eq!(targets[&Category::Psychometric], 1);
    }
}
