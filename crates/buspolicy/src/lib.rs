//! Top-level facade crate for buspolicy.
//!
//! Re-exports the core data model and the policy engine so users can depend on a single crate.

pub mod core {
    pub use buspolicy_core::*;
}

pub mod engine {
    pub use buspolicy_engine::*;
}
