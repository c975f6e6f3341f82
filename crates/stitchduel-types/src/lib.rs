//! Stitchduel Types - Canonical domain types for the duel lifecycle engine
//!
//! This crate contains all foundational types for Stitchduel with zero
//! dependencies on other stitchduel crates. It defines the complete type
//! system for:
//!
//! - Identity types (UserId, DuelId, DuelRequestId, MessageMarker)
//! - User profiles and skill tiers
//! - Duels, duel requests and duel reports
//! - Rating records
//! - Scheduled task payloads
//! - The error taxonomy shared by every layer
//!
//! # Architectural Invariants
//!
//! These types support the core Stitchduel invariants:
//!
//! 1. A user participates in at most one active duel at any instant
//! 2. A pending (from, to) duel-request pair is never duplicated
//! 3. A duel's completion timestamp and winner are set exactly once

pub mod duel;
pub mod error;
pub mod id;
pub mod task;
pub mod user;

pub use duel::*;
pub use error::*;
pub use id::*;
pub use task::*;
pub use user::*;

/// Version of the stitchduel types schema
pub const TYPES_VERSION: &str = "0.1.0";
