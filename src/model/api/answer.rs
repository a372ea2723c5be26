use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    common::{AnswerIndex, QuestionId, ThemeId},
    db::answer::Answer,
};

/// A single quiz response, as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSpec {
    pub theme_id: ThemeId,
    pub question_id: QuestionId,
    /// Signed so that negative indices reach the range check.
    pub answer_index: i64,
}

/// An API-friendly stored answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDescription {
    pub id: ApiId,
    pub theme_id: ThemeId,
    pub question_id: QuestionId,
    pub answer_index: AnswerIndex,
    pub updated_at: DateTime<Utc>,
}

impl From<Answer> for AnswerDescription {
    fn from(answer: Answer) -> Self {
        let Answer { id, answer } = answer;
        Self {
            id: id.into(),
            theme_id: answer.theme_id,
            question_id: answer.question_id,
            answer_index: answer.answer_index,
            updated_at: answer.updated_at,
        }
    }
}
