//! AgriFleet: Asset Lifecycle & Telemetry Engine
//!
//! Core engine for tracking a cooperative's machines through their
//! operational lifecycle: operator assignment, fuel accounting, engine
//! hours, and maintenance history.
//!
//! ## Architecture
//!
//! - **Store**: canonical asset/member records behind an atomic
//!   `apply` transition contract (in-memory or sled backend)
//! - **Engine**: one operation per business event, each a single atomic
//!   state transition that enforces the fleet invariants
//! - **Scheduler**: pure forecast of the next service date from usage
//! - **Alerts / Stats**: pure derivations over the live snapshot

pub mod alerts;
pub mod config;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod stats;
pub mod store;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, FleetConfig};

// Re-export commonly used types
pub use types::{
    Asset, AssetId, AssetSpecs, AssetStatus, Assignment, FleetSnapshot, FuelRecord,
    MaintenanceRecord, Member, MemberId, MemberStatus, UsageMeter,
};

// Re-export the action interface
pub use engine::{NewAsset, NewMember, TelemetryEngine};

// Re-export storage
pub use store::{FleetStore, MemoryStore, SledStore};

// Re-export derivations
pub use alerts::{compute_alerts, needs_attention, service_due};
pub use scheduler::{predict_service, ServiceForecast, Urgency};
pub use stats::{asset_lifetime_cost, compute_fleet_stats, FleetStats};

// Re-export errors
pub use error::FleetError;
