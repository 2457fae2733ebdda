pub mod auth;
pub mod error_handling;
pub mod validation;
