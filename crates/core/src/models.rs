use serde::{Deserialize, Deserializer};

pub mod assignment;
pub mod auth;
pub mod instrument;
pub mod notification;
pub mod response;
pub mod service;
pub mod song;
pub mod suggestion;
pub mod user;
pub mod worship_set;

/// For `Option<Option<T>>` update fields: a missing key stays `None`, an
/// explicit `null` becomes `Some(None)` and clears the stored value.
/// Pair with `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
