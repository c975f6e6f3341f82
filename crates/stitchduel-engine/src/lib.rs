//! Stitchduel Engine - the duel lifecycle state machine
//!
//! This crate holds the decision logic that drives the duel game:
//!
//! - **[`DuelRequestManager`]**: proposing, accepting, declining and
//!   expiring duel requests
//! - **[`DuelEngine`]**: duel creation (ad-hoc and weekly batch), report
//!   submission, completion with winner determination, report reminders
//! - **[`RatingService`]**: periodic rating reads and the monthly winner
//!   celebration
//!
//! Everything stateful lives behind the four gateway ports in [`ports`]:
//! persistence, scheduled tasks, notifications and media. The engine owns
//! no shared mutable state of its own beyond an injected random source;
//! concurrency is serialized by the persistence gateway's transactions.
//!
//! # Inbound calls
//!
//! User actions and fired scheduled-task callbacks arrive as plain method
//! calls. Callback handlers ([`DuelEngine::complete_duel`],
//! [`DuelEngine::send_duel_report_reminder`],
//! [`DuelRequestManager::remove_expired_request`]) are idempotent no-ops
//! when their precondition no longer holds, which is how at-least-once
//! task delivery and the absence of task cancellation stay safe.

pub mod duels;
pub mod ports;
pub mod rating;
pub mod requests;

pub use duels::DuelEngine;
pub use ports::{DuelResults, DuelStore, MediaStore, Notifier, ParticipantResult, TaskScheduler};
pub use rating::RatingService;
pub use requests::DuelRequestManager;
