//! buspolicy core: the rule data model, message accessor contract, and the
//! error surface shared by the policy engine and its collaborators.
//!
//! This crate carries no runtime or configuration dependencies so the rule
//! model can be constructed by any configuration front-end.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Allocation failure and identity failures surface as `BusPolicyError`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod message;
pub mod rule;

/// Shared result type.
pub use error::{BusPolicyError, ErrorCode, Result};
pub use message::{ConnectionId, MessageHeader, MessageView};
pub use rule::{Gid, Rule, RuleKind, RuleMatch, RuleRef, Uid};
