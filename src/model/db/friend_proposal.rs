use std::ops::Deref;

use chrono::{DateTime, Duration, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Unconfirmed proposals are dropped by a TTL index after this long.
pub const FRIEND_PROPOSAL_TTL_SECONDS: u64 = 10 * 60;

/// A pending request by one user to add another as a friend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendProposalCore {
    /// The user who wants to add a friend.
    pub proposer_id: Id,
    /// The would-be friend.
    pub target_id: Id,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl FriendProposalCore {
    pub fn new(proposer_id: Id, target_id: Id) -> Self {
        Self {
            proposer_id,
            target_id,
            created_at: Utc::now(),
        }
    }
}

/// Proposals created before this instant have expired, whether or not the
/// TTL monitor has removed them yet.
pub fn proposal_expiry_cutoff() -> DateTime<Utc> {
    Utc::now() - Duration::seconds(FRIEND_PROPOSAL_TTL_SECONDS as i64)
}

/// A proposal without an ID.
pub type NewFriendProposal = FriendProposalCore;

/// A proposal from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendProposal {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub proposal: FriendProposalCore,
}

impl Deref for FriendProposal {
    type Target = FriendProposalCore;

    fn deref(&self) -> &Self::Target {
        &self.proposal
    }
}
