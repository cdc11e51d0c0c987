//! Alert Derivation
//!
//! Pure filter over the live asset list: which machines need operator
//! attention right now. Recomputed from each snapshot; holds no state.

use crate::types::{Asset, AssetStatus};

/// True once the hour meter has reached the service interval.
pub fn service_due(asset: &Asset) -> bool {
    asset.usage.current_hours >= asset.usage.service_interval
}

/// True when a machine needs attention: service due, or not healthy.
pub fn needs_attention(asset: &Asset) -> bool {
    service_due(asset) || asset.status != AssetStatus::Healthy
}

/// The subset of `assets` needing attention, in input order.
pub fn compute_alerts(assets: &[Asset]) -> Vec<&Asset> {
    assets.iter().filter(|a| needs_attention(a)).collect()
}
