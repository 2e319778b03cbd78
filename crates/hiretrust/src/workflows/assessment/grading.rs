use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use super::domain::{Category, EvaluationMetadata, EvaluatorKind, SubmissionMetadata};
use super::oracle::{generate_within, GradingOracle};

pub const MAX_SCORE: u8 = 6;

const STAR_INSTRUCTION: &str = "No specific rubric provided. Use the STAR (Situation, Task, \
Action, Result) framework to judge the logical depth and evidence of the answer.";

/// Parse result of one grading call. Downstream code never inspects raw oracle output.
#[derive(Debug, Clone, PartialEq)]
pub enum GradeVerdict {
    Graded { score: u8, rationale: String },
    Degraded { reason: String },
}

/// Score and audit metadata for a single answer.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedAnswer {
    pub score: u8,
    pub is_skipped: bool,
    pub metadata: EvaluationMetadata,
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    score: i64,
    #[serde(default, alias = "rationale")]
    reasoning: String,
}

/// Strict parse-or-degrade of the oracle's JSON verdict. Markdown fences are tolerated.
pub fn parse_verdict(raw: &str) -> GradeVerdict {
    let body = match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => {
            return GradeVerdict::Degraded {
                reason: "verdict contained no JSON object".to_string(),
            }
        }
    };

    match serde_json::from_str::<RawVerdict>(body) {
        Ok(RawVerdict { score, reasoning }) if (0..=i64::from(MAX_SCORE)).contains(&score) => {
            GradeVerdict::Graded {
                score: score as u8,
                rationale: reasoning.trim().to_string(),
            }
        }
        Ok(RawVerdict { score, .. }) => GradeVerdict::Degraded {
            reason: format!("score {score} outside 0-{MAX_SCORE}"),
        },
        Err(err) => GradeVerdict::Degraded {
            reason: format!("malformed verdict: {err}"),
        },
    }
}

pub fn grading_prompt(category: Category, answer: &str, metadata: &SubmissionMetadata) -> String {
    let question = metadata
        .text
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .unwrap_or("Professional question");
    let rubric_instruction = match metadata.evaluation_rubric.as_deref() {
        Some(rubric) if !rubric.trim().is_empty() => format!("Evaluation Rubric: {rubric}"),
        _ => STAR_INSTRUCTION.to_string(),
    };

    format!(
        "Category: {category}\n\
         Question: {question}\n\
         Candidate Answer: {answer}\n\
         \n\
         {rubric_instruction}\n\
         \n\
         Evaluate this answer with an integer score from 0 to {MAX_SCORE} based on professional \
         depth, logic, ownership and evidence.\n\
         \n\
         Neutrality guardrails:\n\
         1. Ignore non-standard grammar, regional idioms and non-native phrasing.\n\
         2. Score the demonstrated logic and intent, not linguistic polish.\n\
         3. Do not penalize brevity when the answer is accurate or shows ownership.\n\
         4. Reward specific logic, evidence and concrete examples.\n\
         \n\
         Return ONLY a JSON object: {{\"score\": 4, \"reasoning\": \"short explanation of the \
         signal detected\"}}"
    )
}

/// Turns free-text answers into bounded scores. Oracle trouble yields the neutral fallback.
pub struct GradingPipeline {
    oracle: Arc<dyn GradingOracle>,
    timeout: Duration,
    fallback_score: u8,
}

impl GradingPipeline {
    pub fn new(oracle: Arc<dyn GradingOracle>, timeout: Duration, fallback_score: u8) -> Self {
        Self {
            oracle,
            timeout,
            fallback_score: fallback_score.min(MAX_SCORE),
        }
    }

    pub async fn evaluate_answer(
        &self,
        answer: &str,
        category: Category,
        metadata: &SubmissionMetadata,
    ) -> GradedAnswer {
        if answer.trim().is_empty() {
            return GradedAnswer {
                score: 0,
                is_skipped: true,
                metadata: EvaluationMetadata {
                    evaluator: EvaluatorKind::Skipped,
                    rationale: "Question skipped".to_string(),
                    evaluation_rubric: metadata.evaluation_rubric.clone(),
                },
            };
        }

        let prompt = grading_prompt(category, answer, metadata);
        let verdict = match generate_within(self.oracle.as_ref(), &prompt, self.timeout).await {
            Ok(raw) => parse_verdict(&raw),
            Err(err) => GradeVerdict::Degraded {
                reason: err.to_string(),
            },
        };

        match verdict {
            GradeVerdict::Graded { score, rationale } => GradedAnswer {
                score,
                is_skipped: false,
                metadata: EvaluationMetadata {
                    evaluator: EvaluatorKind::OracleGraded,
                    rationale,
                    evaluation_rubric: metadata.evaluation_rubric.clone(),
                },
            },
            GradeVerdict::Degraded { reason } => {
                warn!(%category, %reason, "grading degraded; applying fallback score");
                GradedAnswer {
                    score: self.fallback_score,
                    is_skipped: false,
                    metadata: EvaluationMetadata {
                        evaluator: EvaluatorKind::Fallback,
                        rationale: format!("Fallback score applied: {reason}"),
                        evaluation_rubric: metadata.evaluation_rubric.clone(),
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_verdicts() {
        let raw = "```json\n{\"score\": 5, \"reasoning\": \"clear ownership\"}\n```";
        assert_eq!(
            parse_verdict(raw),
            GradeVerdict::Graded {
                score: 5,
                rationale: "clear ownership".to_string()
            }
        );
    }

    #[test]
    fn out_of_range_scores_degrade() {
        assert!(matches!(
            parse_verdict("{\"score\": 9, \"reasoning\": \"great\"}"),
            GradeVerdict::Degraded { .. }
        ));
        assert!(matches!(
            parse_verdict("{\"score\": -1}"),
            GradeVerdict::Degraded { .. }
        ));
    }

    #[test]
    fn prose_and_missing_fields_degrade() {
        assert!(matches!(
            parse_verdict("I would give this a four."),
            GradeVerdict::Degraded { .. }
        ));
        assert!(matches!(
            parse_verdict("{\"reasoning\": \"no score\"}"),
            GradeVerdict::Degraded { .. }
        ));
    }

    #[test]
    fn prompt_uses_rubric_or_star_default() {
        let mut metadata = SubmissionMetadata {
            text: Some("Describe a conflict with a peer.".to_string()),
            ..SubmissionMetadata::default()
        };
        let prompt = grading_prompt(Category::Behavioral, "We talked it through.", &metadata);
        assert!(prompt.contains("STAR"));
        assert!(prompt.contains("Describe a conflict with a peer."));
        assert!(prompt.contains("Ignore non-standard grammar"));

        metadata.evaluation_rubric = Some("Mentions a concrete resolution".to_string());
        let prompt = grading_prompt(Category::Behavioral, "We talked it through.", &metadata);
        assert!(prompt.contains("Evaluation Rubric: Mentions a concrete resolution"));
        assert!(!prompt.contains("STAR"));
    }
}
