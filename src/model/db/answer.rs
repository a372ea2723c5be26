use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{AnswerIndex, QuestionId, ThemeId},
    mongodb::Id,
};
use crate::scoring::AnswerSet;

/// Core answer data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerCore {
    /// Foreign Key user ID.
    pub user_id: Id,
    pub theme_id: ThemeId,
    pub question_id: QuestionId,
    pub answer_index: AnswerIndex,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    /// Last time the answer was overwritten.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl AnswerCore {
    pub fn new(
        user_id: Id,
        theme_id: ThemeId,
        question_id: QuestionId,
        answer_index: AnswerIndex,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            theme_id,
            question_id,
            answer_index,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An answer without an ID.
pub type NewAnswer = AnswerCore;

/// An answer from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub answer: AnswerCore,
}

impl Answer {
    /// Collect answers into a question → index map for scoring.
    pub fn to_answer_set<'a>(answers: impl IntoIterator<Item = &'a Answer>) -> AnswerSet {
        answers
            .into_iter()
            .map(|a| (a.question_id.clone(), a.answer_index))
            .collect()
    }
}

impl Deref for Answer {
    type Target = AnswerCore;

    fn deref(&self) -> &Self::Target {
        &self.answer
    }
}

impl DerefMut for Answer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.answer
    }
}
