use std::collections::HashSet;
use std::path::Path;

use rocket::serde::json::serde_json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Themes are identified by globally unique strings, e.g. `theme-61f...`.
pub type ThemeId = String;
/// Questions are identified by globally unique strings, e.g. `question-61f...`.
pub type QuestionId = String;
/// Position of the chosen option within a question's ordered option list.
pub type AnswerIndex = u32;

/// Problems with the quiz definition itself, or with an answer checked against it.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("Failed to read quiz definition: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed quiz definition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Duplicate theme ID '{0}'")]
    DuplicateTheme(ThemeId),
    #[error("Duplicate question ID '{0}'")]
    DuplicateQuestion(QuestionId),
    #[error("Question '{0}' has no answer options")]
    NoOptions(QuestionId),
    #[error("Unknown theme '{0}'")]
    UnknownTheme(ThemeId),
    #[error("Question '{question_id}' does not belong to theme '{theme_id}'")]
    UnknownQuestion {
        theme_id: ThemeId,
        question_id: QuestionId,
    },
    #[error("Answer index {index} is out of range for question '{question_id}' ({options} options)")]
    AnswerOutOfRange {
        question_id: QuestionId,
        index: i64,
        options: usize,
    },
}

/// A single quiz question, with its options ordered from one extreme to the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: QuestionId,
    /// Question text.
    #[serde(rename = "fr")]
    pub label: String,
    /// Ordered option labels.
    pub answers: Vec<String>,
    /// Link to further reading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Question {
    /// The largest possible distance between two answers to this question.
    pub fn max_deviation(&self) -> u32 {
        u32::try_from(self.answers.len())
            .unwrap_or(u32::MAX)
            .saturating_sub(1)
    }

    /// Is `index` one of this question's options?
    pub fn accepts(&self, index: AnswerIndex) -> bool {
        usize::try_from(index).map_or(false, |i| i < self.answers.len())
    }

    /// Check that `index` is one of this question's options.
    pub fn check_index(&self, index: AnswerIndex) -> Result<(), QuizError> {
        if self.accepts(index) {
            Ok(())
        } else {
            Err(QuizError::AnswerOutOfRange {
                question_id: self.id.clone(),
                index: i64::from(index),
                options: self.answers.len(),
            })
        }
    }
}

/// A topical grouping of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(rename = "_id")]
    pub id: ThemeId,
    /// Theme title.
    #[serde(rename = "fr")]
    pub label: String,
    /// Display colour, e.g. `#FACC15`.
    #[serde(
        rename = "backgroundColor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub background_color: Option<String>,
    pub questions: Vec<Question>,
}

impl Theme {
    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

/// The whole quiz: ordered themes, each with ordered questions.
///
/// Identifier uniqueness and non-empty option lists are checked on
/// construction, so every `QuizDefinition` in circulation is well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Theme>", into = "Vec<Theme>")]
pub struct QuizDefinition {
    themes: Vec<Theme>,
}

impl QuizDefinition {
    /// Build a quiz definition, rejecting duplicate identifiers and empty questions.
    pub fn new(themes: Vec<Theme>) -> Result<Self, QuizError> {
        let mut theme_ids = HashSet::new();
        let mut question_ids = HashSet::new();
        for theme in &themes {
            if !theme_ids.insert(theme.id.as_str()) {
                return Err(QuizError::DuplicateTheme(theme.id.clone()));
            }
            for question in &theme.questions {
                if !question_ids.insert(question.id.as_str()) {
                    return Err(QuizError::DuplicateQuestion(question.id.clone()));
                }
                if question.answers.is_empty() {
                    return Err(QuizError::NoOptions(question.id.clone()));
                }
            }
        }
        Ok(Self { themes })
    }

    /// Load a quiz definition from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, QuizError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    pub fn theme(&self, theme_id: &str) -> Option<&Theme> {
        self.themes.iter().find(|t| t.id == theme_id)
    }

    /// Look up a theme, treating absence as an error.
    pub fn require_theme(&self, theme_id: &str) -> Result<&Theme, QuizError> {
        self.theme(theme_id)
            .ok_or_else(|| QuizError::UnknownTheme(theme_id.to_string()))
    }

    /// All theme IDs, in quiz order.
    pub fn theme_ids(&self) -> Vec<ThemeId> {
        self.themes.iter().map(|t| t.id.clone()).collect()
    }

    /// The themes containing at least one of the given questions, in quiz order.
    pub fn themes_answered<'a>(
        &self,
        answered: impl IntoIterator<Item = &'a QuestionId>,
    ) -> Vec<ThemeId> {
        let answered = answered.into_iter().collect::<HashSet<_>>();
        self.themes
            .iter()
            .filter(|theme| theme.questions.iter().any(|q| answered.contains(&q.id)))
            .map(|theme| theme.id.clone())
            .collect()
    }

    /// Validate a submitted answer: the theme must exist, contain the
    /// question, and the index must be one of the question's options.
    pub fn check_answer(
        &self,
        theme_id: &str,
        question_id: &str,
        index: i64,
    ) -> Result<AnswerIndex, QuizError> {
        let question = self
            .require_theme(theme_id)?
            .question(question_id)
            .ok_or_else(|| QuizError::UnknownQuestion {
                theme_id: theme_id.to_string(),
                question_id: question_id.to_string(),
            })?;
        let index = AnswerIndex::try_from(index).map_err(|_| QuizError::AnswerOutOfRange {
            question_id: question.id.clone(),
            index,
            options: question.answers.len(),
        })?;
        question.check_index(index)?;
        Ok(index)
    }
}

impl TryFrom<Vec<Theme>> for QuizDefinition {
    type Error = QuizError;

    fn try_from(themes: Vec<Theme>) -> Result<Self, Self::Error> {
        Self::new(themes)
    }
}

impl From<QuizDefinition> for Vec<Theme> {
    fn from(quiz: QuizDefinition) -> Self {
        quiz.themes
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_deviation_is_option_count_minus_one() {
        let quiz = QuizDefinition::example();
        let economy = quiz.theme("theme-economy").unwrap();
        assert_eq!(economy.questions[0].max_deviation(), 4);
        let environment = quiz.theme("theme-environment").unwrap();
        assert_eq!(environment.question("question-carbon-tax").unwrap().max_deviation(), 1);
    }

    #[test]
    fn rejects_duplicate_identifiers() {
        let err = QuizDefinition::new(vec![Theme::example_economy(), Theme::example_economy()])
            .unwrap_err();
        assert!(matches!(err, QuizError::DuplicateTheme(id) if id == "theme-economy"));

        let mut clash = Theme::example_justice();
        clash.questions[0].id = "question-minimum-wage".to_string();
        let err = QuizDefinition::new(vec![Theme::example_economy(), clash]).unwrap_err();
        assert!(matches!(err, QuizError::DuplicateQuestion(id) if id == "question-minimum-wage"));
    }

    #[test]
    fn rejects_questions_without_options() {
        let mut theme = Theme::example_justice();
        theme.questions[0].answers.clear();
        assert!(matches!(
            QuizDefinition::new(vec![theme]),
            Err(QuizError::NoOptions(_))
        ));
    }

    #[test]
    fn check_answer_validates_theme_question_and_index() {
        let quiz = QuizDefinition::example();
        assert!(quiz
            .check_answer("theme-economy", "question-retirement", 4)
            .is_ok());
        assert!(matches!(
            quiz.check_answer("theme-unknown", "question-retirement", 0),
            Err(QuizError::UnknownTheme(_))
        ));
        assert!(matches!(
            quiz.check_answer("theme-justice", "question-retirement", 0),
            Err(QuizError::UnknownQuestion { .. })
        ));
        assert!(matches!(
            quiz.check_answer("theme-environment", "question-carbon-tax", 2),
            Err(QuizError::AnswerOutOfRange { index: 2, options: 2, .. })
        ));
        assert!(matches!(
            quiz.check_answer("theme-environment", "question-carbon-tax", -1),
            Err(QuizError::AnswerOutOfRange { index: -1, options: 2, .. })
        ));
        assert!(matches!(
            quiz.check_answer("theme-economy", "question-retirement", i64::from(u32::MAX) + 1),
            Err(QuizError::AnswerOutOfRange { .. })
        ));
        assert_eq!(
            quiz.check_answer("theme-economy", "question-retirement", 4).unwrap(),
            4
        );
    }

    #[test]
    fn themes_answered_follows_quiz_order() {
        let quiz = QuizDefinition::example();
        let answered = vec![
            "question-prisons".to_string(),
            "question-minimum-wage".to_string(),
            "question-retirement".to_string(),
        ];
        assert_eq!(
            quiz.themes_answered(&answered),
            vec!["theme-economy".to_string(), "theme-justice".to_string()]
        );
    }

    #[test]
    fn parses_the_stored_json_format() {
        let raw = r##"[
            {
                "_id": "theme-1",
                "fr": "Politique fiscale",
                "backgroundColor": "#F97316",
                "questions": [
                    {"_id": "question-1", "fr": "Faut-il supprimer la taxe d'habitation ?", "answers": ["Non", "Oui"]}
                ]
            }
        ]"##;
        let quiz: QuizDefinition = serde_json::from_str(raw).unwrap();
        assert_eq!(quiz.themes().len(), 1);
        assert_eq!(quiz.themes()[0].background_color.as_deref(), Some("#F97316"));
        assert_eq!(quiz.themes()[0].questions[0].help, None);

        let duplicated = r#"[
            {"_id": "theme-1", "fr": "A", "questions": []},
            {"_id": "theme-1", "fr": "B", "questions": []}
        ]"#;
        assert!(serde_json::from_str::<QuizDefinition>(duplicated).is_err());
    }

    #[test]
    fn shipped_quiz_is_valid() {
        let quiz = QuizDefinition::from_path("data/quizz.json").unwrap();
        assert!(!quiz.themes().is_empty());
        // Every example question exists in the shipped quiz with the same options.
        for theme in QuizDefinition::example().themes() {
            let shipped = quiz.require_theme(&theme.id).unwrap();
            for question in &theme.questions {
                let shipped = shipped.question(&question.id).unwrap();
                assert_eq!(shipped.answers, question.answers);
            }
        }
    }
}
