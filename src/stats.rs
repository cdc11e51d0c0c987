//! Fleet Aggregator
//!
//! Pure rollups over the live asset list for dashboards and reports:
//! counts by assignment and condition, lifetime costs, availability.

use serde::{Deserialize, Serialize};

use crate::types::{Asset, AssetStatus};

/// Rollup statistics over the whole fleet.
///
/// `assigned + available == total` and
/// `healthy + needs_repair + broken == total` always hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetStats {
    pub total: usize,
    pub assigned: usize,
    pub available: usize,
    pub healthy: usize,
    pub needs_repair: usize,
    pub broken: usize,
    pub lifetime_maintenance_cost: f64,
    pub lifetime_fuel_cost: f64,
    /// Maintenance plus fuel spend across the whole fleet.
    pub lifetime_cost: f64,
    /// Fraction of machines currently available, 0.0 for an empty fleet.
    pub availability_ratio: f64,
}

/// Total spend recorded against one machine.
pub fn asset_lifetime_cost(asset: &Asset) -> f64 {
    let maintenance: f64 = asset.history.iter().map(|r| r.cost).sum();
    let fuel: f64 = asset.fuel_logs.iter().map(|r| r.cost).sum();
    maintenance + fuel
}

/// Compute rollups for the given snapshot of assets.
pub fn compute_fleet_stats(assets: &[Asset]) -> FleetStats {
    let total = assets.len();
    let assigned = assets.iter().filter(|a| a.assignment.is_assigned).count();
    let healthy = assets
        .iter()
        .filter(|a| a.status == AssetStatus::Healthy)
        .count();
    let needs_repair = assets
        .iter()
        .filter(|a| a.status == AssetStatus::NeedsRepair)
        .count();
    let broken = assets
        .iter()
        .filter(|a| a.status == AssetStatus::Broken)
        .count();

    let lifetime_maintenance_cost: f64 = assets
        .iter()
        .flat_map(|a| a.history.iter())
        .map(|r| r.cost)
        .sum();
    let lifetime_fuel_cost: f64 = assets
        .iter()
        .flat_map(|a| a.fuel_logs.iter())
        .map(|r| r.cost)
        .sum();

    let available = total - assigned;
    FleetStats {
        total,
        assigned,
        available,
        healthy,
        needs_repair,
        broken,
        lifetime_maintenance_cost,
        lifetime_fuel_cost,
        lifetime_cost: lifetime_maintenance_cost + lifetime_fuel_cost,
        availability_ratio: if total == 0 {
            0.0
        } else {
            available as f64 / total as f64
        },
    }
}
