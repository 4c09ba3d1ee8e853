pub mod aids;
pub mod auth;
pub mod config;
pub mod onboarding;
pub mod plan;
pub mod trips;
pub mod tui;
