//! Injected services shared through `AppState`.

pub mod rate_limit;
pub mod sessions;
