//! Shared data structures for the fleet lifecycle engine.
//!
//! This module defines the record types owned by the store: assets with
//! their telemetry and histories, cooperative members, and the snapshot
//! published to subscribers on every change.

mod asset;
mod member;
mod snapshot;

pub use asset::{
    Asset, AssetId, AssetSpecs, AssetStatus, Assignment, FuelRecord, MaintenanceRecord, UsageMeter,
};
pub use member::{Member, MemberId, MemberStatus};
pub use snapshot::FleetSnapshot;
