//! Top-level facade crate for notifyhub.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use notifyhub_core::*;
}

pub mod gateway {
    pub use notifyhub_gateway::*;
}
