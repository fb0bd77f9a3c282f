//! Foundation types for analyst data synchronization.
//!
//! Analyst data are small annotation records (notes, opinions, relationships)
//! attached to arbitrary objects and replicated across a federation of peer
//! instances. Every other `ads-*` crate depends on `ads-types`.
//!
//! # Key Types
//!
//! - [`AnalystData`] — Tagged union over the three record kinds
//! - [`Envelope`] — Fields shared by every record (uuid, modified, distribution, ownership)
//! - [`Distribution`] — Visibility tier controlling how far a record may travel
//! - [`SharingGroup`] — Organizations and peer servers a distribution-4 record is scoped to
//! - [`Peer`] — A remote instance and the permissions of the credential used to reach it
//! - [`Identity`] — The acting user, threaded explicitly through every operation
//! - [`Manifest`] — Compact `{kind: {uuid: modified}}` index used by the sync handshakes

pub mod distribution;
pub mod error;
pub mod identity;
pub mod kind;
pub mod manifest;
pub mod org;
pub mod peer;
pub mod record;
pub mod sharing_group;

pub use distribution::Distribution;
pub use error::TypeError;
pub use identity::{Identity, Role};
pub use kind::{RecordKind, TargetType};
pub use manifest::Manifest;
pub use org::Organisation;
pub use peer::{Peer, PeerCapabilities};
pub use record::{AnalystData, Envelope, Note, Opinion, Relationship};
pub use sharing_group::{SharingGroup, SharingGroupServer, LOCAL_SERVER_ID};

/// Timestamp type used for `created`/`modified`.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
