use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::{Cookie, SameSite, Status},
    outcome::{try_outcome, IntoOutcome},
    request::{FromRequest, Outcome},
    time::Duration,
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::{
    db::user::User,
    mongodb::{Coll, Id},
};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// An authentication token identifying the user making a request.
///
/// Handlers take this as a request guard: it is the only way they learn who
/// the current user is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthToken {
    pub id: Id,
    /// Whether the user had claimed their account when the token was issued.
    #[serde(rename = "clm")]
    pub claimed: bool,
}

impl AuthToken {
    /// Create a new [`AuthToken`] for the given user.
    pub fn new(user: &User) -> Self {
        Self {
            id: user.id,
            claimed: user.is_claimed(),
        }
    }

    #[allow(clippy::missing_panics_doc)]
    /// Serialize this token into a cookie. Anonymous users get a much
    /// shorter-lived cookie than claimed ones.
    pub fn into_cookie(self, config: &Config) -> Cookie<'static> {
        let ttl = config.auth_ttl(self.claimed);
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + ttl,
        };

        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .expect("JWT encoding is infallible with default settings");

        Cookie::build(AUTH_TOKEN_COOKIE, token)
            .path("/")
            .max_age(Duration::seconds(ttl.num_seconds()))
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish()
    }

    /// Deserialize a token from a cookie.
    pub fn from_cookie(cookie: &Cookie<'static>, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            cookie.value(),
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims>| claims.claims.token)?;
        Ok(token)
    }
}

/// Cookie claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthToken,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthToken {
    type Error = Error;

    /// Get an [`AuthToken`] from the cookie and check the user still exists.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        // Forward to any routes that do not require an authentication token.
        let cookie = try_outcome!(req.cookies().get(AUTH_TOKEN_COOKIE).or_forward(()));

        // Decode the token.
        let token: Self = try_outcome!(Self::from_cookie(cookie, config).or_forward(()));

        // Check the user actually exists.
        let db = req.guard::<&State<mongodb::Database>>().await.unwrap();
        let user = Coll::<User>::from_db(db)
            .find_one(token.id.as_doc(), None)
            .await;
        match user {
            Ok(Some(_)) => Outcome::Success(token),
            Ok(None) => Outcome::Forward(()),
            Err(e) => Outcome::Failure((Status::InternalServerError, e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::db::user::UserCore;

    #[test]
    fn cookie_round_trip() {
        let config = Config::example();
        let user = User {
            id: Id::new(),
            user: UserCore::new_anonymous(),
        };
        let cookie = AuthToken::new(&user).into_cookie(&config);
        assert_eq!(cookie.name(), AUTH_TOKEN_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(
            cookie.max_age(),
            Some(Duration::seconds(config.auth_ttl(false).num_seconds()))
        );

        let token = AuthToken::from_cookie(&cookie, &config).unwrap();
        assert_eq!(token.id, user.id);
        assert!(!token.claimed);
    }

    #[test]
    fn claimed_users_get_longer_cookies() {
        let config = Config::example();
        let user = User {
            id: Id::new(),
            user: UserCore::example_public("berger"),
        };
        let cookie = AuthToken::new(&user).into_cookie(&config);
        assert_eq!(
            cookie.max_age(),
            Some(Duration::seconds(config.auth_ttl(true).num_seconds()))
        );
        assert!(AuthToken::from_cookie(&cookie, &config).unwrap().claimed);
    }

    #[test]
    fn rejects_tokens_signed_with_another_secret() {
        let user = User {
            id: Id::new(),
            user: UserCore::new_anonymous(),
        };
        let cookie = AuthToken::new(&user).into_cookie(&Config::example());
        let other = Config::example_with_secret("une autre clef");
        assert!(AuthToken::from_cookie(&cookie, &other).is_err());
    }
}
