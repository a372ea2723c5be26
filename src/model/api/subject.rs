use serde::{Deserialize, Serialize};

use crate::model::{
    api::{answer::AnswerDescription, user::PublicUser},
    db::{answer::Answer, user::User},
};

/// A comparison subject (candidate or friend) with all their answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectDescription {
    #[serde(flatten)]
    pub user: PublicUser,
    pub answers: Vec<AnswerDescription>,
}

impl SubjectDescription {
    pub fn new(user: User, answers: Vec<Answer>) -> Self {
        Self {
            user: user.into(),
            answers: answers.into_iter().map(AnswerDescription::from).collect(),
        }
    }
}
