use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{common::ThemeId, mongodb::Id};

/// Core user data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCore {
    /// Public pseudonym. Absent until the account is claimed; the field is
    /// omitted rather than null so the sparse unique index ignores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pseudo: Option<String>,
    /// Argon2 hash, present iff the account is claimed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Has the user opted into sharing their results?
    #[serde(default)]
    pub is_public: bool,
    /// Candidates are public comparison subjects. Only ever set by hand.
    #[serde(default)]
    pub is_candidate: bool,
    /// Themes the user chose to answer.
    #[serde(default)]
    pub themes: Vec<ThemeId>,
    /// IDs of the users this user compares themselves to.
    #[serde(default)]
    pub friends: Vec<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_name: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub last_login_at: DateTime<Utc>,
}

impl UserCore {
    /// A fresh anonymous user.
    pub fn new_anonymous() -> Self {
        let now = Utc::now();
        Self {
            pseudo: None,
            password_hash: None,
            is_public: false,
            is_candidate: false,
            themes: Vec::new(),
            friends: Vec::new(),
            first_name: None,
            last_name: None,
            party_name: None,
            created_at: now,
            updated_at: now,
            last_login_at: now,
        }
    }

    /// A fresh user that is claimed from the start.
    pub fn new_claimed(pseudo: String, password_hash: String) -> Self {
        Self {
            pseudo: Some(pseudo),
            password_hash: Some(password_hash),
            ..Self::new_anonymous()
        }
    }

    /// Has this user signed up with a pseudo and password?
    pub fn is_claimed(&self) -> bool {
        self.pseudo.is_some()
    }

    /// Can anyone look at this user's answers?
    pub fn is_visible(&self) -> bool {
        self.is_public || self.is_candidate
    }

    /// Can the user with ID `viewer` compare themselves to this user?
    /// Mutual friends can, even when neither is public.
    pub fn is_visible_to(&self, viewer: Id) -> bool {
        self.is_visible() || self.friends.contains(&viewer)
    }

    /// Check whether the given password is correct. Anonymous users have no
    /// password, so nothing matches.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> Result<bool, argon2::Error> {
        match &self.password_hash {
            Some(hash) => argon2::verify_encoded(hash, password.as_ref()),
            None => Ok(false),
        }
    }
}

/// A user without an ID.
pub type NewUser = UserCore;

/// A user from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub user: UserCore,
}

impl Deref for User {
    type Target = UserCore;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl DerefMut for User {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.user
    }
}
