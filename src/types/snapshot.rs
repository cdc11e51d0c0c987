//! Snapshot of the full fleet state, published to subscribers on every
//! committed change.

use serde::{Deserialize, Serialize};

use super::{Asset, Member};

/// The full current state of both collections.
///
/// `version` increments on every commit, so a subscriber can tell two
/// otherwise identical snapshots apart. Delivery is at-least-once: a slow
/// subscriber may skip intermediate versions but always observes the latest
/// committed one eventually.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetSnapshot {
    pub version: u64,
    pub assets: Vec<Asset>,
    pub members: Vec<Member>,
}

impl FleetSnapshot {
    /// Look up an asset in this snapshot.
    pub fn asset(&self, id: &super::AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == *id)
    }
}
