use rocket::{serde::json::Json, Route, State};

use crate::api::common::{
    answers_for, current_user, fetch_candidates, fetch_friends, visible_user_by_pseudo,
    UserWithAnswers,
};
use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::AuthToken,
        results::{Contender, ResultsDescription, SubjectKind},
    },
    common::QuizDefinition,
    db::{answer::Answer, user::User},
    mongodb::Coll,
};
use crate::scoring::{score_subjects, Selection, Subject};

pub fn routes() -> Vec<Route> {
    routes![my_results, public_results]
}

/// Compare the current user to the selected candidates and friends.
#[post("/result", data = "<selection>", format = "json")]
pub async fn my_results(
    token: AuthToken,
    selection: Json<Selection>,
    users: Coll<User>,
    answers: Coll<Answer>,
    quiz: &State<QuizDefinition>,
) -> Result<Json<ResultsDescription>> {
    if let Some(theme) = selection.unknown_theme(quiz) {
        return Err(Error::bad_request(format!("Unknown theme '{theme}'")));
    }

    let me = current_user(&token, &users).await?;
    let friends = fetch_friends(&me, &users, &answers).await?;
    results_for(&me, &selection, friends, &users, &answers, quiz).await
}

/// What a user's share link shows: their answers against every candidate.
#[get("/result/<pseudo>")]
pub async fn public_results(
    pseudo: &str,
    users: Coll<User>,
    answers: Coll<Answer>,
    quiz: &State<QuizDefinition>,
) -> Result<Json<ResultsDescription>> {
    let user = visible_user_by_pseudo(pseudo, &users).await?;
    results_for(&user, &Selection::public(), Vec::new(), &users, &answers, quiz).await
}

async fn results_for(
    reference: &User,
    selection: &Selection,
    friends: Vec<UserWithAnswers>,
    users: &Coll<User>,
    answers: &Coll<Answer>,
    quiz: &QuizDefinition,
) -> Result<Json<ResultsDescription>> {
    let mine = answers_for(reference.id, answers).await?;
    let reference_answers = Answer::to_answer_set(&mine);

    // Without a theme choice, only show themes with at least one answer.
    let themes = selection
        .chosen_themes(&quiz.theme_ids())
        .unwrap_or_else(|| quiz.themes_answered(mine.iter().map(|a| &a.question_id)));

    let candidates: Vec<UserWithAnswers> = fetch_candidates(users, answers)
        .await?
        .into_iter()
        .filter(|(candidate, _)| candidate.id != reference.id)
        .collect();
    let candidates = selection.candidates(candidates, |(user, _)| user.pseudo.as_deref());
    let friends = selection.friends(friends, |(user, _)| user.pseudo.as_deref());

    let subjects = candidates
        .into_iter()
        .map(|subject| (subject, SubjectKind::Candidate))
        .chain(
            friends
                .into_iter()
                .map(|subject| (subject, SubjectKind::Friend)),
        )
        .map(|((user, answers), kind)| Subject {
            answers: Answer::to_answer_set(&answers),
            subject: Contender {
                user: user.into(),
                kind,
            },
        })
        .collect();

    let scores = score_subjects(&reference_answers, subjects, quiz, &themes)?;
    Ok(Json(ResultsDescription::new(quiz, themes, &scores)))
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json::json,
    };

    use super::*;
    use crate::model::{
        api::auth::SignupRequest,
        common::AnswerIndex,
        db::{answer::NewAnswer, user::UserCore},
        mongodb::Id,
    };

    async fn insert_user(users: &Coll<User>, user: UserCore) -> Id {
        let user = User { id: Id::new(), user };
        users.insert_one(&user, None).await.unwrap();
        user.id
    }

    async fn answer(
        answers: &Coll<NewAnswer>,
        user: Id,
        theme: &str,
        question: &str,
        index: AnswerIndex,
    ) {
        answers
            .insert_one(NewAnswer::new(user, theme.into(), question.into(), index), None)
            .await
            .unwrap();
    }

    /// Two candidates and a friend. The signed-in user answered the economy
    /// theme with [2, 4]; "proche" agrees fully, "loin" scores 25% and
    /// "muet" answered nothing in common.
    async fn setup(users: &Coll<User>, answers: &Coll<NewAnswer>) -> Id {
        let me = users
            .find_one(doc! { "pseudo": SignupRequest::example().pseudo }, None)
            .await
            .unwrap()
            .unwrap()
            .id;
        let loin = insert_user(users, UserCore::example_candidate("loin")).await;
        let muet = insert_user(users, UserCore::example_candidate("muet")).await;
        let proche = insert_user(users, UserCore::example_public("proche")).await;
        users
            .update_one(me.as_doc(), doc! { "$set": { "friends": [proche] } }, None)
            .await
            .unwrap();

        for (user, wage, retirement) in [(me, 2, 4), (loin, 0, 0), (proche, 2, 4)] {
            answer(answers, user, "theme-economy", "question-minimum-wage", wage).await;
            answer(answers, user, "theme-economy", "question-retirement", retirement).await;
        }
        answer(answers, muet, "theme-justice", "question-prisons", 1).await;
        me
    }

    async fn post_selection(
        client: &Client,
        selection: rocket::serde::json::Value,
    ) -> (Status, Option<ResultsDescription>) {
        let response = client
            .post(uri!(my_results))
            .header(ContentType::JSON)
            .body(selection.to_string())
            .dispatch()
            .await;
        let status = response.status();
        (status, response.into_json().await)
    }

    fn pseudos(results: &ResultsDescription) -> Vec<&str> {
        results
            .podium
            .iter()
            .map(|entry| entry.user.pseudo.as_deref().unwrap())
            .collect()
    }

    #[backend_test(user)]
    async fn default_selection(client: Client, users: Coll<User>, answers: Coll<NewAnswer>) {
        setup(&users, &answers).await;

        let (status, results) = post_selection(&client, json!({})).await;
        assert_eq!(Status::Ok, status);
        let results = results.unwrap();

        assert_eq!(results.themes, ["theme-economy"]);
        assert_eq!(pseudos(&results), ["proche", "loin", "muet"]);
        assert_eq!(results.podium[0].kind, SubjectKind::Friend);
        assert_eq!(results.podium[0].percent, Some(100.0));
        assert_eq!(results.podium[1].percent, Some(25.0));
        assert_eq!(results.podium[2].percent, None);

        assert_eq!(results.theme_podiums.len(), 1);
        assert_eq!(results.theme_podiums[0].podium.len(), 2);
    }

    #[backend_test(user)]
    async fn narrowed_selection(client: Client, users: Coll<User>, answers: Coll<NewAnswer>) {
        setup(&users, &answers).await;

        let (status, results) = post_selection(
            &client,
            json!({
                "selectedCandidates": ["muet", "inconnu"],
                "selectedFriends": [],
                "selectedThemes": ["theme-justice", "theme-economy"],
            }),
        )
        .await;
        assert_eq!(Status::Ok, status);
        let results = results.unwrap();

        // Themes come back in quiz order.
        assert_eq!(results.themes, ["theme-economy", "theme-justice"]);
        assert_eq!(pseudos(&results), ["muet"]);
        assert_eq!(results.podium[0].total_max, 0);
        assert!(results.theme_podiums.iter().all(|t| t.podium.is_empty()));
    }

    #[backend_test(user)]
    async fn empty_theme_selection_shows_answered_themes(
        client: Client,
        users: Coll<User>,
        answers: Coll<NewAnswer>,
    ) {
        setup(&users, &answers).await;

        let (status, results) = post_selection(&client, json!({ "selectedThemes": [] })).await;
        assert_eq!(Status::Ok, status);
        let results = results.unwrap();

        assert_eq!(results.themes, ["theme-economy"]);
        assert_eq!(pseudos(&results), ["proche", "loin", "muet"]);
        assert_eq!(results.podium[0].percent, Some(100.0));
        assert_eq!(results.theme_podiums.len(), 1);
    }

    #[backend_test(user)]
    async fn unknown_theme_is_rejected(client: Client) {
        let (status, _) =
            post_selection(&client, json!({ "selectedThemes": ["theme-cuisine"] })).await;
        assert_eq!(Status::BadRequest, status);
    }

    #[backend_test(user)]
    async fn public_results_use_candidates_only(
        client: Client,
        users: Coll<User>,
        answers: Coll<NewAnswer>,
    ) {
        setup(&users, &answers).await;

        // "berger" is private until they opt in.
        let response = client.get(uri!(public_results("berger"))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());

        users
            .update_one(
                doc! { "pseudo": "berger" },
                doc! { "$set": { "is_public": true } },
                None,
            )
            .await
            .unwrap();
        let response = client.get(uri!(public_results("berger"))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let results = response.into_json::<ResultsDescription>().await.unwrap();
        assert_eq!(pseudos(&results), ["loin", "muet"]);
    }

    #[backend_test(user)]
    async fn corrupt_stored_answers_are_surfaced(
        client: Client,
        users: Coll<User>,
        answers: Coll<NewAnswer>,
    ) {
        setup(&users, &answers).await;
        let loin = users
            .find_one(doc! { "pseudo": "loin" }, None)
            .await
            .unwrap()
            .unwrap();
        answers
            .update_one(
                doc! { "user_id": loin.id, "question_id": "question-retirement" },
                doc! { "$set": { "answer_index": 9_i64 } },
                None,
            )
            .await
            .unwrap();

        let (status, _) = post_selection(&client, json!({})).await;
        assert_eq!(Status::InternalServerError, status);
    }
}
