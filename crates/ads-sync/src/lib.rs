//! Distributed synchronization of analyst data between peer instances.
//!
//! Provides the capture pipeline that turns an inbound record into a
//! validated local write, the propose-then-upload push, the chunked pull,
//! and the peer-side responder that answers the same four operations for
//! remote instances. Merge is last-writer-wins on `modified`, gated by
//! distribution, sharing groups, locks, and blocklists.

pub mod capture;
pub mod config;
pub mod error;
pub mod expand;
pub mod loopback;
pub mod negotiation;
pub mod node;
pub mod pull;
pub mod push;
pub mod responder;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use capture::CaptureEngine;
pub use config::{SyncConfig, MAX_FETCH_BATCH};
pub use error::{SyncError, SyncResult};
pub use expand::{ExpandedRecord, Expander};
pub use loopback::LoopbackTransport;
pub use negotiation::NegotiationEngine;
pub use node::SyncNode;
pub use pull::PullOrchestrator;
pub use push::PushOrchestrator;
pub use responder::Responder;
pub use transport::PeerTransport;
pub use types::{CaptureOrigin, CaptureResult, PullResult, PushFailure, PushResult, UploadOutcome};
