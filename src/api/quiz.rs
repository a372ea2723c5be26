use rocket::{serde::json::Json, Route, State};

use crate::model::common::QuizDefinition;

pub fn routes() -> Vec<Route> {
    routes![get_quiz]
}

#[get("/quizz")]
pub fn get_quiz(quiz: &State<QuizDefinition>) -> Json<&QuizDefinition> {
    Json(quiz.inner())
}

#[cfg(test)]
mod tests {
    use rocket::{http::Status, local::asynchronous::Client};

    use super::*;

    #[backend_test]
    async fn serves_the_whole_quiz(client: Client) {
        let response = client.get(uri!(get_quiz)).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let served = response.into_json::<QuizDefinition>().await.unwrap();
        assert_eq!(served, QuizDefinition::example());
    }
}
