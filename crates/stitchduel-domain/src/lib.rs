//! Stitchduel Domain - pure decision logic for the duel lifecycle engine
//!
//! Everything in this crate is synchronous and side-effect free: the weekly
//! pairing algorithm, rating winner selection, codeword picking, the
//! pre-batch blackout policy and the engine configuration. Randomized
//! choices take an explicit `&mut impl Rng` so tests can supply seeded
//! generators.

pub mod blackout;
pub mod codeword;
pub mod config;
pub mod datetime;
pub mod pairing;
pub mod rating;

pub use blackout::{BlackoutPolicy, NoBlackout, PreBatchBlackout};
pub use codeword::{random_codeword, CODEWORDS};
pub use config::{DuelConfig, SiblingCleanup};
pub use datetime::is_last_day_of_month;
pub use pairing::pair_users;
pub use rating::compute_winners;
