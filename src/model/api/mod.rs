pub mod answer;
pub mod auth;
pub mod friends;
pub mod results;
pub mod subject;
pub mod user;

mod id;

pub use id::ApiId;
