mod quiz;

pub use quiz::{AnswerIndex, Question, QuestionId, QuizDefinition, QuizError, Theme, ThemeId};
