use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::model::{api::id::ApiId, common::ThemeId, db::user::User};

/// A user's own view of their account. Never contains the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDescription {
    pub id: ApiId,
    pub pseudo: Option<String>,
    pub is_public: bool,
    pub is_candidate: bool,
    pub themes: Vec<ThemeId>,
    pub friends: Vec<ApiId>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub party_name: Option<String>,
    /// Link to the public results page, for public claimed users.
    pub share_link: Option<String>,
}

impl UserDescription {
    /// Describe `user` to themself, including their share link if they have one.
    pub fn new(user: User, config: &Config) -> Self {
        let share_link = match (&user.pseudo, user.is_public) {
            (Some(pseudo), true) => Some(config.share_link(pseudo)),
            _ => None,
        };
        let User { id, user } = user;
        Self {
            id: id.into(),
            pseudo: user.pseudo,
            is_public: user.is_public,
            is_candidate: user.is_candidate,
            themes: user.themes,
            friends: user.friends.into_iter().map(ApiId::from).collect(),
            first_name: user.first_name,
            last_name: user.last_name,
            party_name: user.party_name,
            share_link,
        }
    }
}

/// What anybody may see of a visible user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: ApiId,
    pub pseudo: Option<String>,
    pub is_candidate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_name: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        let User { id, user } = user;
        Self {
            id: id.into(),
            pseudo: user.pseudo,
            is_candidate: user.is_candidate,
            first_name: user.first_name,
            last_name: user.last_name,
            party_name: user.party_name,
        }
    }
}

/// A partial profile update. Absent fields are left alone; candidacy and
/// friendships cannot be changed this way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pseudo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub themes: Option<Vec<ThemeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_name: Option<String>,
}

impl UserUpdate {
    /// The `$set` document for this update, excluding `updated_at`.
    pub fn to_set_doc(&self) -> Document {
        let mut set = Document::new();
        if let Some(pseudo) = &self.pseudo {
            set.insert("pseudo", pseudo.trim());
        }
        if let Some(is_public) = self.is_public {
            set.insert("is_public", is_public);
        }
        if let Some(themes) = &self.themes {
            set.insert("themes", themes.clone());
        }
        if let Some(first_name) = &self.first_name {
            set.insert("first_name", first_name.clone());
        }
        if let Some(last_name) = &self.last_name {
            set.insert("last_name", last_name.clone());
        }
        if let Some(party_name) = &self.party_name {
            set.insert("party_name", party_name.clone());
        }
        set
    }
}
