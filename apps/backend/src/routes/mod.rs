//! HTTP route handlers

pub mod auth;
pub mod learners;
pub mod progress;
pub mod review;
