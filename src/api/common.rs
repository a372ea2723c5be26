use std::collections::HashMap;

use mongodb::{
    bson::{doc, Bson, Document},
    error::Error as DbError,
    options::FindOptions,
};
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::{
    api::auth::AuthToken,
    db::{answer::Answer, user::User},
    mongodb::{is_duplicate_key_error, Coll, Id},
};

/// A user together with every answer they gave.
pub type UserWithAnswers = (User, Vec<Answer>);

/// Fetch the user an authentication token was issued to.
pub async fn current_user(token: &AuthToken, users: &Coll<User>) -> Result<User> {
    users
        .find_one(token.id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("User with ID '{}'", token.id)))
}

/// Fetch a user that anyone may look at, by pseudo. Private users are
/// reported as missing.
pub async fn visible_user_by_pseudo(pseudo: &str, users: &Coll<User>) -> Result<User> {
    users
        .find_one(doc! { "pseudo": pseudo }, None)
        .await?
        .filter(|user| user.is_visible())
        .ok_or_else(|| Error::not_found(format!("User with pseudo '{pseudo}'")))
}

/// Fetch every answer of a single user.
pub async fn answers_for(user_id: Id, answers: &Coll<Answer>) -> Result<Vec<Answer>> {
    let answers = answers
        .find(doc! { "user_id": user_id }, by_id())
        .await?
        .try_collect()
        .await?;
    Ok(answers)
}

/// Fetch every candidate with their answers, in creation order.
pub async fn fetch_candidates(
    users: &Coll<User>,
    answers: &Coll<Answer>,
) -> Result<Vec<UserWithAnswers>> {
    let candidates: Vec<User> = users
        .find(doc! { "is_candidate": true }, by_id())
        .await?
        .try_collect()
        .await?;
    with_answers(candidates, answers).await
}

/// Fetch the friends `me` may compare themself to, with their answers, in
/// the order they were added. Friends that have gone private without adding
/// `me` back are left out.
pub async fn fetch_friends(
    me: &User,
    users: &Coll<User>,
    answers: &Coll<Answer>,
) -> Result<Vec<UserWithAnswers>> {
    let mut found: HashMap<Id, User> = users
        .find(doc! { "_id": { "$in": id_list(&me.friends) } }, None)
        .await?
        .map_ok(|user| (user.id, user))
        .try_collect()
        .await?;
    let friends = me
        .friends
        .iter()
        .filter_map(|id| found.remove(id))
        .filter(|friend| friend.is_visible_to(me.id))
        .collect();
    with_answers(friends, answers).await
}

/// Attach answers to each user with a single query.
async fn with_answers(users: Vec<User>, answers: &Coll<Answer>) -> Result<Vec<UserWithAnswers>> {
    let ids = users.iter().map(|user| user.id).collect::<Vec<_>>();
    let mut by_user: HashMap<Id, Vec<Answer>> = HashMap::new();
    let mut cursor = answers
        .find(doc! { "user_id": { "$in": id_list(&ids) } }, by_id())
        .await?;
    while let Some(answer) = cursor.try_next().await? {
        by_user.entry(answer.user_id).or_default().push(answer);
    }
    Ok(users
        .into_iter()
        .map(|user| {
            let answers = by_user.remove(&user.id).unwrap_or_default();
            (user, answers)
        })
        .collect())
}

/// Map a duplicate pseudo onto a 400, passing other errors through.
pub fn pseudo_taken(err: DbError) -> Error {
    if is_duplicate_key_error(&err) {
        Error::bad_request("Pseudo already taken")
    } else {
        err.into()
    }
}

fn id_list(ids: &[Id]) -> Vec<Bson> {
    ids.iter().copied().map(Bson::from).collect()
}

fn by_id() -> FindOptions {
    FindOptions::builder().sort(doc! { "_id": 1 }).build()
}

/// `$set` the `updated_at` field alongside `set`.
pub fn touch(mut set: Document) -> Document {
    set.insert("updated_at", mongodb::bson::DateTime::now());
    doc! { "$set": set }
}
