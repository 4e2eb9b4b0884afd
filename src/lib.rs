//! Core engine for the ProFix home-services marketplace.
//!
//! Everything reputational flows through here: the weighted Honor Score
//! calculation, the booking status state machine that triggers recomputes,
//! and the notifications each transition owes its counterparty. Transport
//! (HTTP/JSON) and storage schema live outside this crate; callers plug in
//! a [`store::DataStore`] and a [`notify::NotificationSink`].

pub mod booking;
pub mod error;
pub mod notify;
pub mod output;
pub mod scoring;
pub mod store;

pub use error::{Error, Result};
