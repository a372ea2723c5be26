//! Data models.
//!
//! - `api`: request and response bodies, plus the authentication guard.
//! - `common`: the quiz definition, shared by everything else.
//! - `db`: documents as they are stored in MongoDB.
//! - `mongodb`: typed collection plumbing.

pub mod api;
pub mod common;
pub mod db;
pub mod mongodb;
