//! Protocol modules.
//!
//! The notification lane is JSON only: one envelope type pushed to every
//! subscriber and one request type accepted from senders. Validation reports
//! `NotifyError` instead of panicking on malformed input.

pub mod notification;

pub use notification::{Notification, NotifyRequest};
