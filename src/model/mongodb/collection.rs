use std::ops::Deref;
use std::time::Duration;

use log::debug;
use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    answer::{Answer, NewAnswer},
    friend_proposal::{FriendProposal, NewFriendProposal, FRIEND_PROPOSAL_TTL_SECONDS},
    user::{NewUser, User},
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// User collections
const USERS: &str = "users";
impl MongoCollection for User {
    const NAME: &'static str = USERS;
}
impl MongoCollection for NewUser {
    const NAME: &'static str = USERS;
}

// Answer collections
const ANSWERS: &str = "answers";
impl MongoCollection for Answer {
    const NAME: &'static str = ANSWERS;
}
impl MongoCollection for NewAnswer {
    const NAME: &'static str = ANSWERS;
}

// Friend proposal collections
const FRIEND_PROPOSALS: &str = "friend_proposals";
impl MongoCollection for FriendProposal {
    const NAME: &'static str = FRIEND_PROPOSALS;
}
impl MongoCollection for NewFriendProposal {
    const NAME: &'static str = FRIEND_PROPOSALS;
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    // User collection: anonymous users have no pseudo at all, so the index
    // must be sparse.
    let pseudo_index = IndexModel::builder()
        .keys(doc! {"pseudo": 1})
        .options(IndexOptions::builder().unique(true).sparse(true).build())
        .build();
    Coll::<User>::from_db(db)
        .create_index(pseudo_index, None)
        .await?;
    let candidate_index = IndexModel::builder()
        .keys(doc! {"is_candidate": 1})
        .build();
    Coll::<User>::from_db(db)
        .create_index(candidate_index, None)
        .await?;

    // Answer collection: at most one answer per user and question.
    let answer_index = IndexModel::builder()
        .keys(doc! {"user_id": 1, "question_id": 1})
        .options(IndexOptions::builder().unique(true).build())
        .build();
    Coll::<Answer>::from_db(db)
        .create_index(answer_index, None)
        .await?;

    // Friend proposal collection: expire stale proposals.
    let proposal_index = IndexModel::builder()
        .keys(doc! {"created_at": 1})
        .options(
            IndexOptions::builder()
                .expire_after(Duration::from_secs(FRIEND_PROPOSAL_TTL_SECONDS))
                .build(),
        )
        .build();
    Coll::<FriendProposal>::from_db(db)
        .create_index(proposal_index, None)
        .await?;

    Ok(())
}
