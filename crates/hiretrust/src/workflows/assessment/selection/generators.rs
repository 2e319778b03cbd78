use std::time::Duration;

use rand::seq::SliceRandom;
use tracing::warn;

use super::super::domain::{Category, Difficulty, ExperienceBand, Question, ResumeData};
use super::super::oracle::{generate_within, GradingOracle};

pub const SKILL_CLOSING_CLAUSE: &str = "How would you proceed?";

/// Resume sub-drivers, cycled by how many resume questions were already asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeProbe {
    RoleClarity,
    CareerGap,
    Achievement,
}

impl ResumeProbe {
    pub fn for_count(asked: u32) -> Self {
        match asked % 3 {
            0 => ResumeProbe::RoleClarity,
            1 => ResumeProbe::CareerGap,
            _ => ResumeProbe::Achievement,
        }
    }

    pub const fn driver(self) -> &'static str {
        match self {
            ResumeProbe::RoleClarity => "role_clarity",
            ResumeProbe::CareerGap => "career_gap",
            ResumeProbe::Achievement => "achievement",
        }
    }

    const fn difficulty(self) -> Difficulty {
        match self {
            ResumeProbe::Achievement => Difficulty::High,
            ResumeProbe::RoleClarity | ResumeProbe::CareerGap => Difficulty::Medium,
        }
    }

    /// Generation prompt, or `None` when the resume slice this probe needs is empty.
    pub fn prompt(self, resume: &ResumeData) -> Option<String> {
        match self {
            ResumeProbe::RoleClarity => {
                if resume.timeline.len() < 2 {
                    return None;
                }
                let timeline = serde_json::to_string(&resume.timeline).ok()?;
                Some(format!(
                    "Based on this candidate's employment history: {timeline}. Generate ONE \
                     professional assessment question about their role consistency and depth of \
                     responsibility. Keep it under 30 words. Return only the question."
                ))
            }
            ResumeProbe::CareerGap => {
                if resume.career_gaps.count == 0 {
                    return None;
                }
                let gaps = serde_json::to_string(&resume.career_gaps).ok()?;
                Some(format!(
                    "The candidate has career gaps: {gaps}. Generate ONE professional question \
                     asking for transparency about these periods and what they did to grow. \
                     Keep it under 30 words. Return only the question."
                ))
            }
            ResumeProbe::Achievement => {
                if resume.achievements.is_empty() {
                    return None;
                }
                let achievements = serde_json::to_string(&resume.achievements).ok()?;
                Some(format!(
                    "Candidate achievements: {achievements}. Generate ONE question that \
                     validates the specificity and personal ownership of one major achievement. \
                     Keep it under 30 words. Return only the question."
                ))
            }
        }
    }
}

/// Clean up generated text; `None` when nothing usable is left.
fn usable_text(raw: &str) -> Option<String> {
    let cleaned = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

pub(crate) async fn resume_question(
    oracle: &dyn GradingOracle,
    limit: Duration,
    resume: &ResumeData,
    asked: u32,
) -> Option<Question> {
    let probe = ResumeProbe::for_count(asked);
    let prompt = probe.prompt(resume)?;

    let text = match generate_within(oracle, &prompt, limit).await {
        Ok(text) => usable_text(&text)?,
        Err(err) => {
            warn!(driver = probe.driver(), error = %err, "resume question generation degraded");
            return None;
        }
    };

    Some(Question {
        id: None,
        text,
        category: Category::Resume,
        driver: probe.driver().to_string(),
        difficulty: probe.difficulty(),
        evaluation_rubric: None,
    })
}

/// Prefer a skill not yet tested this session; repeat once every skill was covered.
pub fn pick_skill<'a>(declared: &'a [String], tested: &[String]) -> Option<&'a String> {
    let candidates: Vec<&String> = declared
        .iter()
        .filter(|skill| !skill.trim().is_empty())
        .collect();
    let untested: Vec<&String> = candidates
        .iter()
        .copied()
        .filter(|skill| !tested.iter().any(|done| done.eq_ignore_ascii_case(skill)))
        .collect();

    let mut rng = rand::thread_rng();
    if untested.is_empty() {
        candidates.choose(&mut rng).copied()
    } else {
        untested.choose(&mut rng).copied()
    }
}

pub fn skill_prompt(skill: &str, band: ExperienceBand) -> String {
    format!(
        "Experience band: {}. Candidate skill: {skill}. Generate a realistic, high-pressure \
         SCENARIO question (short case study) that tests practical accuracy and judgement with \
         this skill. The question must end with '{SKILL_CLOSING_CLAUSE}'. Under 50 words. \
         Return only the question.",
        band.label()
    )
}

pub(crate) async fn skill_question(
    oracle: &dyn GradingOracle,
    limit: Duration,
    band: ExperienceBand,
    declared: &[String],
    tested: &[String],
) -> Option<Question> {
    let skill = pick_skill(declared, tested)?.clone();
    let prompt = skill_prompt(&skill, band);

    let mut text = match generate_within(oracle, &prompt, limit).await {
        Ok(text) => usable_text(&text)?,
        Err(err) => {
            warn!(skill = %skill, error = %err, "skill question generation degraded");
            return None;
        }
    };

    if !text.ends_with(SKILL_CLOSING_CLAUSE) {
        text.push(' ');
        text.push_str(SKILL_CLOSING_CLAUSE);
    }

    Some(Question {
        id: None,
        text,
        category: Category::Skill,
        driver: skill,
        difficulty: Difficulty::High,
        evaluation_rubric: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::assessment::domain::{CareerGaps, TimelineEntry};

    fn entry(role: &str) -> TimelineEntry {
        TimelineEntry {
            role: role.to_string(),
            organization: "Northwind".to_string(),
            start: None,
            end: None,
        }
    }

    #[test]
    fn probes_cycle_by_count() {
        assert_eq!(ResumeProbe::for_count(0), ResumeProbe::RoleClarity);
        assert_eq!(ResumeProbe::for_count(1), ResumeProbe::CareerGap);
        assert_eq!(ResumeProbe::for_count(2), ResumeProbe::Achievement);
        assert_eq!(ResumeProbe::for_count(3), ResumeProbe::RoleClarity);
    }

    #[test]
    fn probes_need_their_resume_slice() {
        let mut resume = ResumeData::default();
        assert!(ResumeProbe::RoleClarity.prompt(&resume).is_none());
        assert!(ResumeProbe::CareerGap.prompt(&resume).is_none());
        assert!(ResumeProbe::Achievement.prompt(&resume).is_none());

        resume.timeline = vec![entry("Analyst")];
        assert!(ResumeProbe::RoleClarity.prompt(&resume).is_none());
        resume.timeline.push(entry("Account Executive"));
        let prompt = ResumeProbe::RoleClarity
            .prompt(&resume)
            .expect("two roles are enough");
        assert!(prompt.contains("Account Executive"));
        assert!(prompt.contains("under 30 words"));

        resume.career_gaps = CareerGaps {
            count: 1,
            periods: Vec::new(),
        };
        assert!(ResumeProbe::CareerGap.prompt(&resume).is_some());
    }

    #[test]
    fn skill_pick_prefers_untested() {
        let declared = vec!["negotiation".to_string(), "crm".to_string()];
        let tested = vec!["Negotiation".to_string()];
        for _ in 0..20 {
            assert_eq!(pick_skill(&declared, &tested).map(String::as_str), Some("crm"));
        }
    }

    #[test]
    fn skill_pick_repeats_when_all_tested() {
        let declared = vec!["crm".to_string()];
        let tested = vec!["crm".to_string()];
        assert_eq!(pick_skill(&declared, &tested).map(String::as_str), Some("crm"));
        assert!(pick_skill(&[], &tested).is_none());
    }

    #[test]
    fn usable_text_strips_wrapping_quotes() {
        assert_eq!(
            usable_text(" \"Walk me through it.\" ").as_deref(),
            Some("Walk me through it.")
        );
        assert!(usable_text("``").is_none());
    }
}
