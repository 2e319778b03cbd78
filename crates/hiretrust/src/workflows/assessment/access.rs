use serde::Serialize;

use super::domain::{AssessmentStatus, ProfileScore};

/// Platform features unlocked by the candidate's best assessment result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureAccess {
    pub assessment_status: AssessmentStatus,
    pub best_score: Option<u8>,
    pub profile_visible: bool,
    pub chat_enabled: bool,
}

pub fn feature_access(
    status: AssessmentStatus,
    best: Option<&ProfileScore>,
    blocked: bool,
    chat_unlock_score: u8,
) -> FeatureAccess {
    let best_score = best.map(|score| score.final_score);
    let cleared = !blocked && status != AssessmentStatus::Disqualified;

    FeatureAccess {
        assessment_status: status,
        best_score,
        profile_visible: cleared && best_score.is_some(),
        chat_enabled: cleared && best_score.is_some_and(|score| score >= chat_unlock_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::assessment::domain::CandidateId;
    use chrono::Utc;

    fn best(final_score: u8) -> ProfileScore {
        ProfileScore {
            candidate_id: CandidateId("cand-1".to_string()),
            resume_score: 0,
            behavioral_score: 0,
            psychometric_score: 0,
            skills_score: 0,
            final_score,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn nothing_unlocked_before_first_completion() {
        let access = feature_access(AssessmentStatus::Started, None, false, 50);
        assert!(!access.profile_visible);
        assert!(!access.chat_enabled);
    }

    #[test]
    fn chat_needs_unlock_score() {
        let low = feature_access(AssessmentStatus::Completed, Some(&best(40)), false, 50);
        assert!(low.profile_visible);
        assert!(!low.chat_enabled);

        let high = feature_access(AssessmentStatus::Completed, Some(&best(50)), false, 50);
        assert!(high.chat_enabled);
    }

    #[test]
    fn retake_keeps_features_from_best_score() {
        let access = feature_access(AssessmentStatus::Started, Some(&best(80)), false, 50);
        assert!(access.profile_visible);
        assert!(access.chat_enabled);
    }

    #[test]
    fn blocked_candidates_get_nothing() {
        let access = feature_access(AssessmentStatus::Disqualified, Some(&best(90)), true, 50);
        assert!(!access.profile_visible);
        assert!(!access.chat_enabled);
        assert_eq!(access.best_score, Some(90));
    }
}
