use rocket::{serde::json::Json, Route};

use crate::api::common::fetch_candidates;
use crate::error::Result;
use crate::model::{
    api::subject::SubjectDescription,
    db::{answer::Answer, user::User},
    mongodb::Coll,
};

pub fn routes() -> Vec<Route> {
    routes![candidates]
}

/// Every candidate, with their answers.
#[get("/candidates")]
pub async fn candidates(
    users: Coll<User>,
    answers: Coll<Answer>,
) -> Result<Json<Vec<SubjectDescription>>> {
    let candidates = fetch_candidates(&users, &answers).await?;
    Ok(Json(
        candidates
            .into_iter()
            .map(|(user, answers)| SubjectDescription::new(user, answers))
            .collect(),
    ))
}
