//! Crew Desk — operator onboarding and order staffing client core.

pub mod assignments;
pub mod config;
pub mod error;
pub mod logging;
pub mod operators;
pub mod session;

pub use error::{Error, Result};
