use log::info;
use mongodb::bson::{doc, DateTime};
use rocket::{http::Status, serde::json::Json, Route, State};

use crate::api::common::{current_user, fetch_friends, touch};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::AuthToken,
        friends::{FriendProposalDescription, FriendProposalRequest},
        subject::SubjectDescription,
        user::UserDescription,
    },
    db::{
        answer::Answer,
        friend_proposal::{proposal_expiry_cutoff, FriendProposal, NewFriendProposal},
        user::User,
    },
    mongodb::{Coll, Id},
};

pub fn routes() -> Vec<Route> {
    routes![
        friends,
        propose_friend,
        confirm_proposal,
        cancel_proposal,
        remove_friend
    ]
}

/// The current user's friends that they may compare themself to.
#[get("/user/friends")]
pub async fn friends(
    token: AuthToken,
    users: Coll<User>,
    answers: Coll<Answer>,
) -> Result<Json<Vec<SubjectDescription>>> {
    let me = current_user(&token, &users).await?;
    let friends = fetch_friends(&me, &users, &answers).await?;
    Ok(Json(
        friends
            .into_iter()
            .map(|(user, answers)| SubjectDescription::new(user, answers))
            .collect(),
    ))
}

/// First step of adding a friend: look them up and park a proposal until the
/// user confirms it.
#[post("/user/friends/proposals", data = "<request>", format = "json")]
pub async fn propose_friend(
    token: AuthToken,
    request: Json<FriendProposalRequest>,
    users: Coll<User>,
    proposals: Coll<FriendProposal>,
) -> Result<Json<FriendProposalDescription>> {
    let me = current_user(&token, &users).await?;
    let pseudo = request.pseudo.trim();
    let friend = users
        .find_one(doc! { "pseudo": pseudo }, None)
        .await?
        .ok_or_else(|| Error::not_found(format!("User with pseudo '{pseudo}'")))?;

    if friend.id == me.id {
        return Err(Error::bad_request("You cannot add yourself as a friend"));
    }
    if me.friends.contains(&friend.id) {
        return Err(Error::bad_request(format!("'{pseudo}' is already a friend")));
    }
    if !friend.is_visible() {
        return Err(Error::Status(
            Status::Forbidden,
            format!("'{pseudo}' does not share their results"),
        ));
    }

    let proposal = FriendProposal {
        id: Id::new(),
        proposal: NewFriendProposal::new(me.id, friend.id),
    };
    proposals.insert_one(&proposal, None).await?;

    Ok(Json(FriendProposalDescription {
        id: proposal.id.into(),
        friend: friend.into(),
    }))
}

/// Second step of adding a friend.
#[post("/user/friends/proposals/<proposal_id>/confirm")]
pub async fn confirm_proposal(
    token: AuthToken,
    proposal_id: Id,
    users: Coll<User>,
    proposals: Coll<FriendProposal>,
    config: &State<Config>,
) -> Result<Json<UserDescription>> {
    // The TTL monitor only runs about once a minute.
    let filter = doc! {
        "_id": proposal_id,
        "proposer_id": token.id,
        "created_at": { "$gt": DateTime::from_chrono(proposal_expiry_cutoff()) },
    };
    let proposal = proposals
        .find_one_and_delete(filter, None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Friend proposal with ID '{proposal_id}'")))?;

    let mut add = touch(doc! {});
    add.insert("$addToSet", doc! { "friends": proposal.target_id });
    users.update_one(token.id.as_doc(), add, None).await?;
    info!("User {} added friend {}", token.id, proposal.target_id);

    let me = current_user(&token, &users).await?;
    Ok(Json(UserDescription::new(me, config)))
}

#[delete("/user/friends/proposals/<proposal_id>")]
pub async fn cancel_proposal(
    token: AuthToken,
    proposal_id: Id,
    proposals: Coll<FriendProposal>,
) -> Result<Status> {
    let result = proposals
        .delete_one(doc! { "_id": proposal_id, "proposer_id": token.id }, None)
        .await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found(format!(
            "Friend proposal with ID '{proposal_id}'"
        )));
    }
    Ok(Status::Ok)
}

#[delete("/user/friends/<friend_id>")]
pub async fn remove_friend(
    token: AuthToken,
    friend_id: Id,
    users: Coll<User>,
    config: &State<Config>,
) -> Result<Json<UserDescription>> {
    let me = current_user(&token, &users).await?;
    if !me.friends.contains(&friend_id) {
        return Err(Error::not_found(format!("Friend with ID '{friend_id}'")));
    }

    let mut remove = touch(doc! {});
    remove.insert("$pull", doc! { "friends": friend_id });
    users.update_one(me.id.as_doc(), remove, None).await?;

    let me = current_user(&token, &users).await?;
    Ok(Json(UserDescription::new(me, config)))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::ContentType,
        local::asynchronous::{Client, LocalResponse},
        serde::json::serde_json::json,
    };

    use chrono::Utc;

    use super::*;
    use crate::model::{
        api::auth::SignupRequest,
        db::{answer::NewAnswer, user::UserCore},
    };

    async fn propose<'c>(client: &'c Client, pseudo: &str) -> LocalResponse<'c> {
        client
            .post(uri!(propose_friend))
            .header(ContentType::JSON)
            .body(json!(FriendProposalRequest { pseudo: pseudo.into() }).to_string())
            .dispatch()
            .await
    }

    async fn insert_user(users: &Coll<User>, user: UserCore) -> Id {
        let user = User { id: Id::new(), user };
        users.insert_one(&user, None).await.unwrap();
        user.id
    }

    async fn me(users: &Coll<User>) -> User {
        users
            .find_one(doc! { "pseudo": SignupRequest::example().pseudo }, None)
            .await
            .unwrap()
            .unwrap()
    }

    #[backend_test(user)]
    async fn propose_then_confirm(client: Client, users: Coll<User>, proposals: Coll<FriendProposal>) {
        let bergere = insert_user(&users, UserCore::example_public("bergere")).await;

        let response = propose(&client, "bergere").await;
        assert_eq!(Status::Ok, response.status());
        let proposal = response.into_json::<FriendProposalDescription>().await.unwrap();
        assert_eq!(Id::from(proposal.friend.id), bergere);
        assert_eq!(proposals.count_documents(None, None).await.unwrap(), 1);

        // Nothing is committed until confirmation.
        assert!(me(&users).await.friends.is_empty());

        let proposal_id = Id::from(proposal.id);
        let response = client
            .post(uri!(confirm_proposal(proposal_id)))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let desc = response.into_json::<UserDescription>().await.unwrap();
        assert_eq!(desc.friends.len(), 1);
        assert_eq!(me(&users).await.friends, vec![bergere]);
        assert_eq!(proposals.count_documents(None, None).await.unwrap(), 0);

        // A proposal can only be confirmed once.
        let response = client
            .post(uri!(confirm_proposal(proposal_id)))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());

        // Proposing an existing friend is refused.
        assert_eq!(Status::BadRequest, propose(&client, "bergere").await.status());
    }

    #[backend_test(user)]
    async fn proposals_are_checked(client: Client, users: Coll<User>, proposals: Coll<FriendProposal>) {
        insert_user(&users, UserCore::new_claimed("discret".into(), String::new())).await;

        assert_eq!(Status::NotFound, propose(&client, "personne").await.status());
        assert_eq!(Status::BadRequest, propose(&client, "berger").await.status());
        assert_eq!(Status::Forbidden, propose(&client, "discret").await.status());
        assert_eq!(proposals.count_documents(None, None).await.unwrap(), 0);
    }

    #[backend_test(user)]
    async fn cancel_and_foreign_proposals(client: Client, users: Coll<User>, proposals: Coll<FriendProposal>) {
        let bergere = insert_user(&users, UserCore::example_public("bergere")).await;
        let lassalle = insert_user(&users, UserCore::example_candidate("lassalle")).await;

        // Someone else's proposal cannot be confirmed or cancelled.
        let foreign = FriendProposal {
            id: Id::new(),
            proposal: NewFriendProposal::new(bergere, lassalle),
        };
        proposals.insert_one(&foreign, None).await.unwrap();
        let response = client
            .post(uri!(confirm_proposal(foreign.id)))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
        let response = client
            .delete(uri!(cancel_proposal(foreign.id)))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());

        let proposal = propose(&client, "lassalle")
            .await
            .into_json::<FriendProposalDescription>()
            .await
            .unwrap();
        let response = client
            .delete(uri!(cancel_proposal(Id::from(proposal.id))))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(proposals.count_documents(None, None).await.unwrap(), 1);
        assert!(me(&users).await.friends.is_empty());
    }

    #[backend_test(user)]
    async fn foreign_proposal_cannot_be_confirmed(
        client: Client,
        users: Coll<User>,
        proposals: Coll<FriendProposal>,
    ) {
        let bergere = insert_user(&users, UserCore::example_public("bergere")).await;
        let lassalle = insert_user(&users, UserCore::example_candidate("lassalle")).await;
        let foreign = FriendProposal {
            id: Id::new(),
            proposal: NewFriendProposal::new(bergere, lassalle),
        };
        proposals.insert_one(&foreign, None).await.unwrap();

        let response = client
            .post(uri!(confirm_proposal(foreign.id)))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
        assert_eq!(proposals.count_documents(None, None).await.unwrap(), 1);
        assert!(me(&users).await.friends.is_empty());
        let bergere = users.find_one(bergere.as_doc(), None).await.unwrap().unwrap();
        assert!(bergere.friends.is_empty());
    }

    #[backend_test(user)]
    async fn expired_proposal_cannot_be_confirmed(
        client: Client,
        users: Coll<User>,
        proposals: Coll<FriendProposal>,
    ) {
        let me_id = me(&users).await.id;
        let bergere = insert_user(&users, UserCore::example_public("bergere")).await;
        let stale = FriendProposal {
            id: Id::new(),
            proposal: NewFriendProposal {
                created_at: Utc::now() - chrono::Duration::minutes(11),
                ..NewFriendProposal::new(me_id, bergere)
            },
        };
        proposals.insert_one(&stale, None).await.unwrap();

        let response = client
            .post(uri!(confirm_proposal(stale.id)))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
        assert!(me(&users).await.friends.is_empty());
    }

    #[backend_test(user)]
    async fn friends_list_respects_visibility(
        client: Client,
        users: Coll<User>,
        new_answers: Coll<NewAnswer>,
    ) {
        let me_id = me(&users).await.id;
        let public = insert_user(&users, UserCore::example_public("bergere")).await;
        let mutual = insert_user(
            &users,
            UserCore {
                friends: vec![me_id],
                ..UserCore::new_claimed("fidele".into(), String::new())
            },
        )
        .await;
        let gone_private =
            insert_user(&users, UserCore::new_claimed("discret".into(), String::new())).await;
        users
            .update_one(
                doc! { "_id": me_id },
                doc! { "$set": { "friends": [mutual, gone_private, public] } },
                None,
            )
            .await
            .unwrap();
        new_answers
            .insert_one(
                NewAnswer::new(public, "theme-justice".into(), "question-prisons".into(), 3),
                None,
            )
            .await
            .unwrap();

        let friends = client
            .get(uri!(friends))
            .dispatch()
            .await
            .into_json::<Vec<SubjectDescription>>()
            .await
            .unwrap();
        let pseudos = friends
            .iter()
            .map(|f| f.user.pseudo.as_deref().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(pseudos, ["fidele", "bergere"]);
        assert!(friends[0].answers.is_empty());
        assert_eq!(friends[1].answers.len(), 1);
    }

    #[backend_test(user)]
    async fn remove_friends(client: Client, users: Coll<User>) {
        let bergere = insert_user(&users, UserCore::example_public("bergere")).await;

        let response = client.delete(uri!(remove_friend(bergere))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());

        users
            .update_one(
                doc! { "pseudo": "berger" },
                doc! { "$set": { "friends": [bergere] } },
                None,
            )
            .await
            .unwrap();
        let response = client.delete(uri!(remove_friend(bergere))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        assert!(me(&users).await.friends.is_empty());
    }
}
