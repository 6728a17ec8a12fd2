//! Core domain types for Rollcall.
//!
//! This crate contains pure domain types with no IO, no async, and minimal
//! dependencies. Everything here can be used from any layer of the
//! application.

mod error;
mod ids;
mod outcome;

pub use error::EnrollError;
pub use ids::{CourseId, UserId};
pub use outcome::{EnrollOutcome, WithdrawOutcome};
