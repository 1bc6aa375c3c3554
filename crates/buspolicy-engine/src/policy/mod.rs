//! Policy layer (rule store, per-connection compilation, evaluation).
//!
//! The store is built once from configuration and then only read. Each
//! authenticated connection gets a compiled [`ClientPolicy`]: the applicable
//! rules concatenated in precedence order and pruned of dead entries. All
//! checks are last-match-wins scans that default to deny.

pub mod client;
pub mod evaluate;
pub mod optimize;
pub mod store;

pub use client::ClientPolicy;
pub use optimize::optimize;
pub use store::PolicyStore;
