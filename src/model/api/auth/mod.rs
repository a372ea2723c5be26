mod credentials;
mod token;

pub use credentials::{check_pseudo, hash_password, LoginRequest, SignupRequest, RESERVED_PSEUDOS};
pub use token::{AuthToken, AUTH_TOKEN_COOKIE};
