use mongodb::{
    bson::{doc, DateTime},
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use rocket::{http::Status, serde::json::Json, Route, State};

use crate::api::common::{answers_for, visible_user_by_pseudo};
use crate::error::{Error, Result};
use crate::model::{
    api::{
        answer::{AnswerDescription, AnswerSpec},
        auth::AuthToken,
    },
    common::QuizDefinition,
    db::{answer::Answer, user::User},
    mongodb::Coll,
};

pub fn routes() -> Vec<Route> {
    routes![my_answers, submit_answer, answers_of]
}

#[get("/answer")]
pub async fn my_answers(
    token: AuthToken,
    answers: Coll<Answer>,
) -> Result<Json<Vec<AnswerDescription>>> {
    let answers = answers_for(token.id, &answers).await?;
    Ok(Json(answers.into_iter().map(Into::into).collect()))
}

/// Record an answer, replacing any previous answer to the same question.
#[post("/answer", data = "<submitted>", format = "json")]
pub async fn submit_answer(
    token: AuthToken,
    submitted: Json<AnswerSpec>,
    answers: Coll<Answer>,
    quiz: &State<QuizDefinition>,
) -> Result<Json<AnswerDescription>> {
    let index = quiz
        .check_answer(&submitted.theme_id, &submitted.question_id, submitted.answer_index)
        .map_err(|e| Error::bad_request(e.to_string()))?;

    let now = DateTime::now();
    let filter = doc! {
        "user_id": token.id,
        "question_id": &submitted.question_id,
    };
    let update = doc! {
        "$set": {
            "theme_id": &submitted.theme_id,
            "answer_index": i64::from(index),
            "updated_at": now,
        },
        "$setOnInsert": {
            "created_at": now,
        },
    };
    let options = FindOneAndUpdateOptions::builder()
        .upsert(true)
        .return_document(ReturnDocument::After)
        .build();

    let answer = answers
        .find_one_and_update(filter, update, options)
        .await?
        .ok_or_else(|| {
            Error::Status(
                Status::InternalServerError,
                format!("Upserted answer to '{}' was not returned", submitted.question_id),
            )
        })?;
    Ok(Json(answer.into()))
}

#[get("/answer/<pseudo>")]
pub async fn answers_of(
    pseudo: &str,
    users: Coll<User>,
    answers: Coll<Answer>,
) -> Result<Json<Vec<AnswerDescription>>> {
    let user = visible_user_by_pseudo(pseudo, &users).await?;
    let answers = answers_for(user.id, &answers).await?;
    Ok(Json(answers.into_iter().map(Into::into).collect()))
}
