//! # Worship Client
//!
//! Talks to the worship API on behalf of a signed-in web user. The web
//! front end keeps its own session; [`session::CredentialExchange`] turns
//! that session into a short-lived backend bearer token, and
//! [`api::ApiClient`] attaches it to every call.

pub mod api;
pub mod config;
pub mod session;

pub use api::ApiClient;
pub use config::ClientConfig;
pub use session::{CredentialExchange, SignedCredentialExchange, WebSession};
