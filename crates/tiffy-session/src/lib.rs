//! # tiffy-session
//!
//! The [`ConnectionSession`] state machine: connect a wallet, keep the
//! connected account current as the wallet reports changes, and submit the
//! payable claim through a [`ContractInvoker`](tiffy_core::ContractInvoker).
//!
//! The session never retries and never panics. Overlapping calls are
//! rejected by the in-progress states (`Connecting`, `Submitting`) rather
//! than queued.

#![deny(unsafe_code)]

pub mod session;

pub use session::ConnectionSession;
