use serde::{Deserialize, Serialize};

use crate::model::api::{id::ApiId, user::PublicUser};

/// Ask to add the user with this pseudo as a friend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendProposalRequest {
    pub pseudo: String,
}

/// A pending proposal, to be confirmed or cancelled by its ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendProposalDescription {
    pub id: ApiId,
    pub friend: PublicUser,
}
