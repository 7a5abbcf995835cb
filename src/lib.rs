pub mod aggregation;
pub mod auth;
pub mod config;
pub mod error;
pub mod insights;
pub mod onboarding;
pub mod server;
pub mod views;
