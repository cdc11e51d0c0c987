//! In-memory store for tests and minimal deployments.
//!
//! Thread-safe via `RwLock`, not durable. Each asset slot carries a version
//! counter; `apply` runs the transition on a clone outside the lock, then
//! commits only if the version is unchanged, retrying otherwise.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::FleetError;
use crate::types::{Asset, AssetId, FleetSnapshot, Member, MemberId};

use super::{FleetStore, TransitionFn};

struct Slot {
    version: u64,
    asset: Asset,
}

#[derive(Default)]
struct Inner {
    assets: Vec<Slot>,
    members: Vec<Member>,
}

/// In-memory `FleetStore` backend.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    config: StoreConfig,
    snapshot_version: AtomicU64,
    tx: watch::Sender<FleetSnapshot>,
}

impl MemoryStore {
    pub fn new(config: StoreConfig) -> Self {
        let (tx, _rx) = watch::channel(FleetSnapshot::default());
        Self {
            inner: RwLock::new(Inner::default()),
            config,
            snapshot_version: AtomicU64::new(0),
            tx,
        }
    }

    /// Store with default concurrency settings.
    pub fn with_defaults() -> Self {
        Self::new(StoreConfig::default())
    }

    fn read_inner(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, FleetError> {
        self.inner
            .read()
            .map_err(|e| FleetError::StoreUnavailable(e.to_string()))
    }

    fn write_inner(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, FleetError> {
        self.inner
            .write()
            .map_err(|e| FleetError::StoreUnavailable(e.to_string()))
    }

    /// Publish the full current snapshot. Called with the write lock held,
    /// so the published state is exactly the committed state.
    fn publish(&self, inner: &Inner) {
        let version = self.snapshot_version.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = FleetSnapshot {
            version,
            assets: inner.assets.iter().map(|s| s.asset.clone()).collect(),
            members: inner.members.clone(),
        };
        // Send only fails when no subscriber exists, which is fine.
        let _ = self.tx.send(snapshot);
    }
}

#[async_trait]
impl FleetStore for MemoryStore {
    async fn get_asset(&self, id: &AssetId) -> Result<Asset, FleetError> {
        let inner = self.read_inner()?;
        inner
            .assets
            .iter()
            .find(|s| s.asset.id == *id)
            .map(|s| s.asset.clone())
            .ok_or_else(|| FleetError::asset_not_found(id))
    }

    async fn list_assets(&self) -> Result<Vec<Asset>, FleetError> {
        let inner = self.read_inner()?;
        Ok(inner.assets.iter().map(|s| s.asset.clone()).collect())
    }

    async fn insert_asset(&self, asset: Asset) -> Result<Asset, FleetError> {
        let mut inner = self.write_inner()?;
        if inner.assets.iter().any(|s| s.asset.id == asset.id) {
            return Err(FleetError::InvalidInput(format!(
                "asset id {} already exists",
                asset.id
            )));
        }
        inner.assets.push(Slot {
            version: 0,
            asset: asset.clone(),
        });
        self.publish(&inner);
        Ok(asset)
    }

    async fn apply(&self, id: &AssetId, transition: &TransitionFn) -> Result<Asset, FleetError> {
        for attempt in 1..=self.config.apply_max_attempts {
            // Read the current value and its version, then run the
            // transition without holding any lock.
            let (base_version, current) = {
                let inner = self.read_inner()?;
                let slot = inner
                    .assets
                    .iter()
                    .find(|s| s.asset.id == *id)
                    .ok_or_else(|| FleetError::asset_not_found(id))?;
                (slot.version, slot.asset.clone())
            };

            // A transition error aborts the whole operation: no write, no
            // retry, no notification.
            let next = transition(current)?;

            {
                let mut inner = self.write_inner()?;
                let slot = inner
                    .assets
                    .iter_mut()
                    .find(|s| s.asset.id == *id)
                    .ok_or_else(|| FleetError::asset_not_found(id))?;
                if slot.version == base_version {
                    slot.version += 1;
                    slot.asset = next.clone();
                    self.publish(&inner);
                    return Ok(next);
                }
            }

            debug!(asset = %id, attempt, "apply lost the race, retrying against new base");
            tokio::time::sleep(self.config.backoff_for_attempt(attempt)).await;
        }

        Err(FleetError::Contended {
            id: *id,
            attempts: self.config.apply_max_attempts,
        })
    }

    async fn remove_asset(&self, id: &AssetId) -> Result<(), FleetError> {
        let mut inner = self.write_inner()?;
        let before = inner.assets.len();
        inner.assets.retain(|s| s.asset.id != *id);
        if inner.assets.len() == before {
            return Err(FleetError::asset_not_found(id));
        }
        self.publish(&inner);
        Ok(())
    }

    async fn list_members(&self) -> Result<Vec<Member>, FleetError> {
        Ok(self.read_inner()?.members.clone())
    }

    async fn insert_member(&self, member: Member) -> Result<Member, FleetError> {
        let mut inner = self.write_inner()?;
        if inner.members.iter().any(|m| m.id == member.id) {
            return Err(FleetError::InvalidInput(format!(
                "member id {} already exists",
                member.id
            )));
        }
        inner.members.push(member.clone());
        self.publish(&inner);
        Ok(member)
    }

    async fn remove_member(&self, id: &MemberId) -> Result<(), FleetError> {
        let mut inner = self.write_inner()?;
        let before = inner.members.len();
        inner.members.retain(|m| m.id != *id);
        if inner.members.len() == before {
            return Err(FleetError::member_not_found(id));
        }
        self.publish(&inner);
        Ok(())
    }

    async fn clear(&self) -> Result<(), FleetError> {
        let mut inner = self.write_inner()?;
        inner.assets.clear();
        inner.members.clear();
        self.publish(&inner);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<FleetSnapshot> {
        self.tx.subscribe()
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
