//! Asset Record Store
//!
//! The store owns the canonical asset and member collections and is the
//! only shared mutable resource in the system. All writes to an existing
//! asset go through [`FleetStore::apply`], an atomic read-modify-write with
//! bounded optimistic retries, so concurrent operations on the same record
//! can never interleave partial updates. Operations on different records
//! never serialize against each other.
//!
//! Two backends implement the trait:
//! - [`MemoryStore`]: in-memory, for tests and minimal deployments
//! - [`SledStore`]: durable sled database for production use

mod memory;
mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::FleetError;
use crate::types::{Asset, AssetId, FleetSnapshot, Member, MemberId};

/// A total state transition over one asset.
///
/// Receives the current committed value and returns the next value, or an
/// error to abort with no write. May be invoked more than once if the
/// record is contended, so it must be a pure function of its input.
pub type TransitionFn<'a> = dyn Fn(Asset) -> Result<Asset, FleetError> + Send + Sync + 'a;

/// Pluggable storage backend for the fleet.
///
/// Implementations must be thread-safe (`Send + Sync`) for shared access
/// across async tasks, and must guarantee that `apply` is atomic per asset
/// id: exactly one racing transition commits per step, the loser retries
/// against the winner's value.
#[async_trait]
pub trait FleetStore: Send + Sync {
    /// Fetch one asset.
    async fn get_asset(&self, id: &AssetId) -> Result<Asset, FleetError>;

    /// All assets in insertion order.
    async fn list_assets(&self) -> Result<Vec<Asset>, FleetError>;

    /// Insert a freshly created asset. Fails if the id already exists.
    async fn insert_asset(&self, asset: Asset) -> Result<Asset, FleetError>;

    /// Atomically transition one asset.
    ///
    /// The only sanctioned write path for existing assets. Either the
    /// transition's result is fully committed (and a snapshot published) or
    /// nothing is written. Contention is retried with capped backoff up to
    /// the configured attempt limit, then surfaced as
    /// [`FleetError::Contended`].
    async fn apply(&self, id: &AssetId, transition: &TransitionFn) -> Result<Asset, FleetError>;

    /// Remove an asset and its histories. No cascade to members.
    async fn remove_asset(&self, id: &AssetId) -> Result<(), FleetError>;

    /// All members in insertion order.
    async fn list_members(&self) -> Result<Vec<Member>, FleetError>;

    /// Insert a new member.
    async fn insert_member(&self, member: Member) -> Result<Member, FleetError>;

    /// Remove a member. Dangling `assigned_to` references on assets are
    /// left in place.
    async fn remove_member(&self, id: &MemberId) -> Result<(), FleetError>;

    /// Delete every asset and member.
    async fn clear(&self) -> Result<(), FleetError>;

    /// Watch the latest committed snapshot. The receiver always holds the
    /// newest committed state; intermediate versions may be skipped.
    fn subscribe(&self) -> watch::Receiver<FleetSnapshot>;

    /// Backend name for logging.
    fn backend_name(&self) -> &'static str;
}
