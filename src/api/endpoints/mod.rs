//! API endpoint handlers.

pub mod audit;
pub mod findings;
pub mod health;
pub mod jobs;
