//! buspolicy engine library entry.
//!
//! Wires the policy store, per-connection compiler, evaluator, and the
//! identity/service collaborators into the bus context. Consumed by the
//! `buspolicy-check` binary and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod bus_context;
pub mod config;
pub mod identity;
pub mod policy;
pub mod registry;

pub use bus_context::BusContext;
pub use identity::{IdentityResolver, StaticUserDatabase};
pub use policy::{ClientPolicy, PolicyStore};
pub use registry::{ServiceRegistry, ServiceTable};
