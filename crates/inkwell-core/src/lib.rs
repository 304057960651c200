//! # Inkwell Core
//!
//! The domain layer of the Inkwell blog API.
//! This crate contains posts, engagement records and the services that enforce
//! their invariants, with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
