use argon2::Error as Argon2Error;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use log::{error, warn};
use mongodb::error::Error as DbError;
use rocket::{http::Status, response::Responder, Request};
use thiserror::Error;

use crate::logging::RequestId;
use crate::model::common::QuizError;
use crate::scoring::ScoreError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    /// A stored answer or theme does not match the quiz definition.
    #[error("Data integrity error: {0}")]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    pub fn not_found(what: String) -> Self {
        Self::Status(Status::NotFound, format!("{what} not found"))
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::Status(Status::BadRequest, reason.into())
    }

    fn status(&self) -> Status {
        match self {
            Self::Db(_) | Self::Score(_) | Self::Quiz(_) => Status::InternalServerError,
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    Status::Unauthorized
                }
                _ => Status::BadRequest,
            },
            Self::Argon2(_) => Status::InternalServerError,
            Self::Status(status, _) => *status,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let id = req.local_cache(RequestId::next);
        let status = self.status();
        if status.code >= 500 {
            error!("  req{id} {self}");
        } else {
            warn!("  req{id} {self}");
        }
        Err(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(
            Error::not_found("User with pseudo 'loup'".into()).status(),
            Status::NotFound
        );
        assert_eq!(Error::bad_request("nope").status(), Status::BadRequest);
        assert_eq!(
            Error::from(ScoreError::UnknownTheme("theme-cuisine".into())).status(),
            Status::InternalServerError
        );
        let expired = Error::from(JwtError::from(JwtErrorKind::ExpiredSignature));
        assert_eq!(expired.status(), Status::Unauthorized);
    }

    #[test]
    fn messages() {
        assert_eq!(
            Error::not_found("Proposal".into()).to_string(),
            "Proposal not found"
        );
    }
}
