//! Durable sled-backed store.
//!
//! Records are JSON documents in two trees (`assets`, `members`), keyed by
//! uuid bytes. Each document carries the insertion sequence so `list`
//! returns insertion order. `apply` uses `sled::Tree::compare_and_swap` on
//! the serialized bytes: exactly one racing writer commits per step, the
//! loser re-reads and retries.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::FleetError;
use crate::types::{Asset, AssetId, FleetSnapshot, Member, MemberId};

use super::{FleetStore, TransitionFn};

/// Stored asset wrapper. `seq` is assigned once at insertion and preserved
/// across every transition, so listing stays in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AssetDoc {
    seq: u64,
    asset: Asset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemberDoc {
    seq: u64,
    member: Member,
}

/// Sled-backed `FleetStore` backend.
pub struct SledStore {
    db: sled::Db,
    assets: sled::Tree,
    members: sled::Tree,
    config: StoreConfig,
    snapshot_version: AtomicU64,
    tx: watch::Sender<FleetSnapshot>,
}

impl SledStore {
    /// Open or create the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P, config: StoreConfig) -> Result<Self, FleetError> {
        let db = sled::open(path.as_ref())?;
        let assets = db.open_tree("assets")?;
        let members = db.open_tree("members")?;

        info!(path = %path.as_ref().display(), "Fleet store opened");

        let store = Self {
            db,
            assets,
            members,
            config,
            snapshot_version: AtomicU64::new(0),
            tx: watch::channel(FleetSnapshot::default()).0,
        };
        // Seed subscribers with whatever is already on disk.
        store.publish()?;
        Ok(store)
    }

    fn decode_asset(bytes: &[u8]) -> Result<AssetDoc, FleetError> {
        serde_json::from_slice(bytes).map_err(FleetError::from)
    }

    /// All asset docs, insertion order. Undecodable entries are skipped
    /// with a warning rather than failing the whole listing.
    fn asset_docs(&self) -> Result<Vec<AssetDoc>, FleetError> {
        let mut docs = Vec::new();
        for item in self.assets.iter() {
            let (key, value) = item?;
            match Self::decode_asset(&value) {
                Ok(doc) => docs.push(doc),
                Err(e) => warn!(key = ?key, error = %e, "Skipping undecodable asset record"),
            }
        }
        docs.sort_by_key(|d| d.seq);
        Ok(docs)
    }

    fn member_docs(&self) -> Result<Vec<MemberDoc>, FleetError> {
        let mut docs = Vec::new();
        for item in self.members.iter() {
            let (key, value) = item?;
            match serde_json::from_slice::<MemberDoc>(&value) {
                Ok(doc) => docs.push(doc),
                Err(e) => warn!(key = ?key, error = %e, "Skipping undecodable member record"),
            }
        }
        docs.sort_by_key(|d| d.seq);
        Ok(docs)
    }

    /// Publish the full current snapshot after a commit.
    fn publish(&self) -> Result<(), FleetError> {
        let version = self.snapshot_version.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = FleetSnapshot {
            version,
            assets: self.asset_docs()?.into_iter().map(|d| d.asset).collect(),
            members: self.member_docs()?.into_iter().map(|d| d.member).collect(),
        };
        let _ = self.tx.send(snapshot);
        Ok(())
    }

    fn flush(&self) -> Result<(), FleetError> {
        self.db.flush()?;
        Ok(())
    }
}

#[async_trait]
impl FleetStore for SledStore {
    async fn get_asset(&self, id: &AssetId) -> Result<Asset, FleetError> {
        match self.assets.get(id.as_bytes())? {
            Some(value) => Ok(Self::decode_asset(&value)?.asset),
            None => Err(FleetError::asset_not_found(id)),
        }
    }

    async fn list_assets(&self) -> Result<Vec<Asset>, FleetError> {
        Ok(self.asset_docs()?.into_iter().map(|d| d.asset).collect())
    }

    async fn insert_asset(&self, asset: Asset) -> Result<Asset, FleetError> {
        let doc = AssetDoc {
            seq: self.db.generate_id()?,
            asset: asset.clone(),
        };
        let value = serde_json::to_vec(&doc)?;

        // CAS against absence so a duplicate id can never clobber a record.
        match self
            .assets
            .compare_and_swap(asset.id.as_bytes(), None as Option<&[u8]>, Some(value))?
        {
            Ok(()) => {
                self.flush()?;
                self.publish()?;
                Ok(asset)
            }
            Err(_) => Err(FleetError::InvalidInput(format!(
                "asset id {} already exists",
                asset.id
            ))),
        }
    }

    async fn apply(&self, id: &AssetId, transition: &TransitionFn) -> Result<Asset, FleetError> {
        let key = id.as_bytes();

        for attempt in 1..=self.config.apply_max_attempts {
            let old = self
                .assets
                .get(key)?
                .ok_or_else(|| FleetError::asset_not_found(id))?;
            let doc = Self::decode_asset(&old)?;

            // A transition error aborts: no write, no retry, no notification.
            let next = transition(doc.asset)?;

            let new_doc = AssetDoc {
                seq: doc.seq,
                asset: next.clone(),
            };
            let new_bytes = serde_json::to_vec(&new_doc)?;

            match self
                .assets
                .compare_and_swap(key, Some(&old), Some(new_bytes))?
            {
                Ok(()) => {
                    self.flush()?;
                    self.publish()?;
                    return Ok(next);
                }
                Err(_) => {
                    debug!(asset = %id, attempt, "apply lost the race, retrying against new base");
                    tokio::time::sleep(self.config.backoff_for_attempt(attempt)).await;
                }
            }
        }

        Err(FleetError::Contended {
            id: *id,
            attempts: self.config.apply_max_attempts,
        })
    }

    async fn remove_asset(&self, id: &AssetId) -> Result<(), FleetError> {
        match self.assets.remove(id.as_bytes())? {
            Some(_) => {
                self.flush()?;
                self.publish()?;
                Ok(())
            }
            None => Err(FleetError::asset_not_found(id)),
        }
    }

    async fn list_members(&self) -> Result<Vec<Member>, FleetError> {
        Ok(self.member_docs()?.into_iter().map(|d| d.member).collect())
    }

    async fn insert_member(&self, member: Member) -> Result<Member, FleetError> {
        let doc = MemberDoc {
            seq: self.db.generate_id()?,
            member: member.clone(),
        };
        let value = serde_json::to_vec(&doc)?;

        // Same CAS-against-absence guard as assets, so a duplicate id can
        // never silently overwrite an existing member.
        match self
            .members
            .compare_and_swap(member.id.as_bytes(), None as Option<&[u8]>, Some(value))?
        {
            Ok(()) => {
                self.flush()?;
                self.publish()?;
                Ok(member)
            }
            Err(_) => Err(FleetError::InvalidInput(format!(
                "member id {} already exists",
                member.id
            ))),
        }
    }

    async fn remove_member(&self, id: &MemberId) -> Result<(), FleetError> {
        match self.members.remove(id.as_bytes())? {
            Some(_) => {
                self.flush()?;
                self.publish()?;
                Ok(())
            }
            None => Err(FleetError::member_not_found(id)),
        }
    }

    async fn clear(&self) -> Result<(), FleetError> {
        self.assets.clear()?;
        self.members.clear()?;
        self.flush()?;
        self.publish()?;
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<FleetSnapshot> {
        self.tx.subscribe()
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}
