//! `binflow-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the bin-size vocabulary, validated coordinates,
//! and the domain error model shared by every other crate.

pub mod bin_size;
pub mod error;
pub mod geo;
pub mod id;

pub use bin_size::BinSize;
pub use error::{DomainError, DomainResult};
pub use geo::Coordinates;
pub use id::{PickupId, ReportId, UserId};
