//! Asset record types.
//!
//! An `Asset` is one tracked machine: identity, operational status, fuel
//! level, the usage meter driving predictive maintenance, the current
//! assignment, and its append-only maintenance / fuel histories.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque unique asset identifier, assigned at creation, immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(Uuid);

impl AssetId {
    pub fn new() -> Self {
        AssetId(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AssetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AssetId(Uuid::parse_str(s)?))
    }
}

/// Operational status of a machine.
///
/// Mutated only by `log_maintenance` (back to `Healthy`) and by the manual
/// status flag operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetStatus {
    Healthy,
    NeedsRepair,
    Broken,
}

/// Engine-hour meter and service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageMeter {
    /// Hours accumulated since the last service. Never negative; reset to
    /// zero only by a maintenance event.
    pub current_hours: f64,

    /// Service is due once `current_hours` reaches this threshold.
    pub service_interval: f64,

    /// Estimated hours worked per day. Consumed only by the predictive
    /// scheduler; falls back to the configured default when unset.
    pub daily_average: Option<f64>,
}

/// Checkout state binding an asset to an operator.
///
/// Invariant: an unassigned asset carries no operator and no due date.
/// Construct through `Assignment::none()` / `Assignment::to()` so the
/// invariant holds by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub is_assigned: bool,
    pub assigned_to: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl Assignment {
    /// The empty assignment state.
    pub fn none() -> Self {
        Assignment {
            is_assigned: false,
            assigned_to: None,
            due_date: None,
        }
    }

    /// An active assignment to `operator`, due back on `due_date`.
    pub fn to(operator: impl Into<String>, due_date: NaiveDate) -> Self {
        Assignment {
            is_assigned: true,
            assigned_to: Some(operator.into()),
            due_date: Some(due_date),
        }
    }
}

/// One maintenance event. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub date: NaiveDate,
    /// What was done, e.g. "Oil Change".
    pub action: String,
    pub technician: String,
    pub cost: f64,
    #[serde(default)]
    pub note: Option<String>,
}

/// One refueling event. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelRecord {
    pub date: NaiveDate,
    pub liters: f64,
    pub cost: f64,
    pub vendor: String,
}

/// Descriptive nameplate data. Display-only; never touched by telemetry
/// operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetSpecs {
    #[serde(default)]
    pub model_year: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub engine_type: Option<String>,
    #[serde(default)]
    pub power: Option<String>,
}

/// A tracked machine.
///
/// `history` and `fuel_logs` are newest-first and prepend-only: entries are
/// never mutated, reordered, or dropped after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub name: String,
    /// Machine category, e.g. "Tractor", "Processing", "Harvesting".
    pub kind: String,
    pub status: AssetStatus,
    /// Tank level as a percentage in [0, 100].
    pub fuel_level: f64,
    pub usage: UsageMeter,
    pub assignment: Assignment,
    pub history: Vec<MaintenanceRecord>,
    pub fuel_logs: Vec<FuelRecord>,
    #[serde(default)]
    pub specs: AssetSpecs,
}

impl Asset {
    /// Daily average with the caller-supplied default applied when the
    /// field is unset or non-positive.
    pub fn daily_average_or(&self, default: f64) -> f64 {
        match self.usage.daily_average {
            Some(avg) if avg > 0.0 => avg,
            _ => default,
        }
    }
}
