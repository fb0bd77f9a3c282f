//! Admission decisions for analyst data synchronization.
//!
//! Every record that is listed, sent, or written passes through the gate.
//! The gate is pure decision logic: it reads collaborator state but never
//! writes.
//!
//! - [`AccessFilter`] / [`Visibility`] -- which records an identity may see
//! - [`PushEligibility`] -- which records may be offered to a given peer
//! - [`BlocklistGuard`] -- record and organization deny-list checks
//! - [`ConflictResolver`] -- last-writer-wins merge decision by `modified`

pub mod access;
pub mod blocklist;
pub mod conflict;

pub use access::{AccessFilter, PushEligibility, Visibility};
pub use blocklist::{BlockReason, BlocklistGuard};
pub use conflict::{ConflictResolver, Decision, WriterContext};
