pub mod assignments;
pub mod instruments;
pub mod notifications;
pub mod service_types;
pub mod services;
pub mod songs;
pub mod suggestion_slots;
pub mod suggestions;
pub mod users;
pub mod worship_sets;
