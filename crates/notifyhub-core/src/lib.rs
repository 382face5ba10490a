//! notifyhub core: transport-agnostic notification types and errors.
//!
//! This crate defines the notification envelope pushed to subscribers, the
//! request model accepted by the send endpoint, and the error surface shared
//! with the gateway. It carries no transport or runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `NotifyError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{NotifyError, Result};
