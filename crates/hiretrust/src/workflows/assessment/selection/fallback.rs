use super::super::domain::{Category, Difficulty, Question};

/// Hand-authored question used when the catalog has nothing left for a category.
pub fn fallback_question(category: Category) -> Question {
    let (text, driver) = match category {
        Category::Psychometric => (
            "Think of a week where several things went wrong at once. How did you keep your \
             focus and mood steady, and what did you change afterwards?",
            "emotional_stability",
        ),
        Category::Resume => (
            "Pick the role on your resume you are most proud of. What were you personally \
             accountable for, and how did you measure success?",
            "role_clarity",
        ),
        Category::Skill => (
            "Describe a recent problem you solved with your strongest professional skill. \
             Which steps did you take, and what was the outcome?",
            "applied_skill",
        ),
        Category::Reference => (
            "If we asked a former manager about your biggest area of growth, what would they \
             say and why?",
            "growth_potential",
        ),
        Category::Behavioral => (
            "Tell us about a time you had to adapt quickly to an unexpected change at work. \
             What was the situation, what did you do, and what was the result?",
            "adaptability",
        ),
    };

    Question {
        id: None,
        text: text.to_string(),
        category,
        driver: driver.to_string(),
        difficulty: Difficulty::Medium,
        evaluation_rubric: None,
    }
}
