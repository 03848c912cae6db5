//! Onboarding form service: profile capture after sign-up.

pub mod checkout;
pub mod config;
pub mod error;
pub mod onboarding;
pub mod server;
pub mod store;
