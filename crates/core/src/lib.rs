//! # Worship Core
//!
//! Domain types shared by the API server, the database layer and the API
//! client: request/response models, the error taxonomy, the authorization
//! policy, the suggestion and assignment workflow rules, and bearer token
//! signing.

pub mod errors;
pub mod models;
pub mod policy;
pub mod token;
pub mod workflow;
