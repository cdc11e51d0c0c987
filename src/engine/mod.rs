//! Telemetry Mutator
//!
//! One operation per business event, each expressed as a single atomic
//! transition through [`FleetStore::apply`]. Preconditions and invariants
//! are enforced inside the transition, against the value actually being
//! committed, so they hold even when operators race on the same machine:
//!
//! - fuel stays in [0, 100]; only a refuel tops it back to 100
//! - engine hours only grow, except the reset performed by maintenance
//! - no checkout ever silently overwrites an existing assignment
//! - histories are prepend-only

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::{defaults, FleetConfig};
use crate::error::FleetError;
use crate::scheduler::{self, ServiceForecast};
use crate::store::FleetStore;
use crate::types::{
    Asset, AssetId, AssetSpecs, AssetStatus, Assignment, FleetSnapshot, FuelRecord,
    MaintenanceRecord, Member, MemberId, MemberStatus, UsageMeter,
};

/// Payload for creating an asset. Only `name` is required; everything else
/// falls back to configured defaults.
#[derive(Debug, Clone, Default)]
pub struct NewAsset {
    pub name: String,
    pub kind: Option<String>,
    pub service_interval: Option<f64>,
    pub daily_average: Option<f64>,
    pub specs: Option<AssetSpecs>,
}

/// Payload for registering a member.
#[derive(Debug, Clone, Default)]
pub struct NewMember {
    pub name: String,
    pub role: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// The action interface of the fleet core.
///
/// Holds the store by trait object, so the same engine runs against the
/// in-memory or the sled backend. Cloning is cheap; clones share the store.
#[derive(Clone)]
pub struct TelemetryEngine {
    store: Arc<dyn FleetStore>,
    config: FleetConfig,
}

impl TelemetryEngine {
    pub fn new(store: Arc<dyn FleetStore>, config: FleetConfig) -> Self {
        info!(backend = store.backend_name(), "Telemetry engine ready");
        Self { store, config }
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub async fn get_asset(&self, id: &AssetId) -> Result<Asset, FleetError> {
        self.store.get_asset(id).await
    }

    pub async fn list_assets(&self) -> Result<Vec<Asset>, FleetError> {
        self.store.list_assets().await
    }

    pub async fn list_members(&self) -> Result<Vec<Member>, FleetError> {
        self.store.list_members().await
    }

    /// Watch the latest committed snapshot.
    pub fn subscribe(&self) -> watch::Receiver<FleetSnapshot> {
        self.store.subscribe()
    }

    /// Forecast the service date for one asset from its current snapshot.
    pub async fn predict_service(&self, id: &AssetId) -> Result<ServiceForecast, FleetError> {
        let asset = self.store.get_asset(id).await?;
        Ok(scheduler::predict_service(
            &asset,
            &self.config,
            Utc::now().date_naive(),
        ))
    }

    // ------------------------------------------------------------------
    // Asset commands
    // ------------------------------------------------------------------

    /// Create a machine with the standard defaults: full tank, zero hours,
    /// unassigned, empty histories, healthy.
    pub async fn create_asset(&self, spec: NewAsset) -> Result<Asset, FleetError> {
        let name = spec.name.trim();
        if name.is_empty() {
            return Err(FleetError::InvalidInput("asset name must not be empty".into()));
        }
        let service_interval = spec
            .service_interval
            .unwrap_or(self.config.telemetry.default_service_interval);
        if service_interval <= 0.0 {
            return Err(FleetError::InvalidInput(format!(
                "service interval must be positive, got {service_interval}"
            )));
        }

        let asset = Asset {
            id: AssetId::new(),
            name: name.to_string(),
            kind: spec
                .kind
                .unwrap_or_else(|| self.config.telemetry.default_kind.clone()),
            status: AssetStatus::Healthy,
            fuel_level: defaults::FUEL_FULL_PCT,
            usage: UsageMeter {
                current_hours: 0.0,
                service_interval,
                daily_average: spec.daily_average,
            },
            assignment: Assignment::none(),
            history: Vec::new(),
            fuel_logs: Vec::new(),
            specs: spec.specs.unwrap_or_default(),
        };

        let asset = self.store.insert_asset(asset).await?;
        info!(asset = %asset.id, name = %asset.name, "Asset created");
        Ok(asset)
    }

    /// Check a machine out to an operator for `duration_days`.
    ///
    /// Refuses with `AlreadyAssigned` if another operator holds it — never
    /// a silent overwrite.
    pub async fn check_out(
        &self,
        id: &AssetId,
        operator: &str,
        duration_days: u32,
    ) -> Result<Asset, FleetError> {
        let operator = operator.trim().to_string();
        if operator.is_empty() {
            return Err(FleetError::InvalidInput("operator must not be empty".into()));
        }
        if duration_days == 0 {
            return Err(FleetError::InvalidInput(
                "checkout duration must be at least one day".into(),
            ));
        }

        let due_date = Utc::now().date_naive() + Duration::days(duration_days as i64);
        let asset_id = *id;

        let updated = self
            .store
            .apply(id, &move |mut asset: Asset| {
                if asset.assignment.is_assigned {
                    return Err(FleetError::AlreadyAssigned {
                        id: asset_id,
                        to: asset
                            .assignment
                            .assigned_to
                            .clone()
                            .unwrap_or_else(|| "unknown".to_string()),
                    });
                }
                asset.assignment = Assignment::to(operator.clone(), due_date);
                Ok(asset)
            })
            .await?;

        info!(asset = %id, operator = ?updated.assignment.assigned_to, due = %due_date, "Asset checked out");
        Ok(updated)
    }

    /// Return a checked-out machine to the pool.
    pub async fn return_asset(&self, id: &AssetId) -> Result<Asset, FleetError> {
        let asset_id = *id;
        let updated = self
            .store
            .apply(id, &move |mut asset: Asset| {
                if !asset.assignment.is_assigned {
                    return Err(FleetError::NotAssigned { id: asset_id });
                }
                asset.assignment = Assignment::none();
                Ok(asset)
            })
            .await?;

        info!(asset = %id, "Asset returned");
        Ok(updated)
    }

    /// Record a refueling. A refuel is always a full top-off: the tank goes
    /// back to 100% regardless of liters purchased.
    pub async fn log_fuel(
        &self,
        id: &AssetId,
        liters: f64,
        cost: f64,
        vendor: &str,
        date: NaiveDate,
    ) -> Result<Asset, FleetError> {
        if liters <= 0.0 {
            return Err(FleetError::InvalidInput(format!(
                "liters must be positive, got {liters}"
            )));
        }
        if cost < 0.0 {
            return Err(FleetError::InvalidInput(format!(
                "fuel cost must not be negative, got {cost}"
            )));
        }

        let record = FuelRecord {
            date,
            liters,
            cost,
            vendor: vendor.to_string(),
        };

        let updated = self
            .store
            .apply(id, &move |mut asset: Asset| {
                asset.fuel_level = defaults::FUEL_FULL_PCT;
                asset.fuel_logs.insert(0, record.clone());
                Ok(asset)
            })
            .await?;

        debug!(asset = %id, liters, cost, "Fuel logged, tank topped off");
        Ok(updated)
    }

    /// Record hours worked: burns fuel and advances the hour meter in one
    /// atomic transition, so a concurrent refuel or maintenance on the same
    /// machine can never observe one field updated without the other.
    pub async fn log_usage(&self, id: &AssetId, hours_worked: f64) -> Result<Asset, FleetError> {
        if hours_worked <= 0.0 {
            return Err(FleetError::InvalidInput(format!(
                "hours worked must be positive, got {hours_worked}"
            )));
        }

        let burn_rate = self.config.telemetry.burn_rate_pct_per_hour;

        let updated = self
            .store
            .apply(id, &move |mut asset: Asset| {
                asset.fuel_level = (asset.fuel_level - hours_worked * burn_rate).max(0.0);
                asset.usage.current_hours += hours_worked;
                Ok(asset)
            })
            .await?;

        debug!(
            asset = %id,
            hours = hours_worked,
            fuel = updated.fuel_level,
            total_hours = updated.usage.current_hours,
            "Usage logged"
        );
        Ok(updated)
    }

    /// Record a service event: status back to healthy, hour meter reset to
    /// zero, record prepended to history. Fuel is untouched — maintenance
    /// and refueling are independent axes. Safe to call on a healthy
    /// machine; every call appends exactly one record.
    pub async fn log_maintenance(
        &self,
        id: &AssetId,
        record: MaintenanceRecord,
    ) -> Result<Asset, FleetError> {
        let updated = self
            .store
            .apply(id, &move |mut asset: Asset| {
                asset.status = AssetStatus::Healthy;
                asset.usage.current_hours = 0.0;
                asset.history.insert(0, record.clone());
                Ok(asset)
            })
            .await?;

        info!(asset = %id, entries = updated.history.len(), "Maintenance logged, hour meter reset");
        Ok(updated)
    }

    /// Manually flag a machine's condition, e.g. a breakdown reported from
    /// the field. The meter and histories are untouched.
    pub async fn set_status(&self, id: &AssetId, status: AssetStatus) -> Result<Asset, FleetError> {
        let updated = self
            .store
            .apply(id, &move |mut asset: Asset| {
                asset.status = status;
                Ok(asset)
            })
            .await?;

        info!(asset = %id, status = ?status, "Asset status flagged");
        Ok(updated)
    }

    /// Delete a machine and its histories. Members that referenced it are
    /// not updated.
    pub async fn delete_asset(&self, id: &AssetId) -> Result<(), FleetError> {
        self.store.remove_asset(id).await?;
        info!(asset = %id, "Asset deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Member commands
    // ------------------------------------------------------------------

    pub async fn add_member(&self, spec: NewMember) -> Result<Member, FleetError> {
        let name = spec.name.trim();
        if name.is_empty() {
            return Err(FleetError::InvalidInput("member name must not be empty".into()));
        }

        let member = Member {
            id: MemberId::new(),
            name: name.to_string(),
            role: spec.role,
            phone: spec.phone,
            email: spec.email,
            status: MemberStatus::Active,
        };

        let member = self.store.insert_member(member).await?;
        info!(member = %member.id, name = %member.name, "Member added");
        Ok(member)
    }

    /// Remove a member. Any asset whose `assigned_to` names them keeps the
    /// dangling reference — there is deliberately no cleanup pass.
    pub async fn remove_member(&self, id: &MemberId) -> Result<(), FleetError> {
        self.store.remove_member(id).await?;
        info!(member = %id, "Member removed");
        Ok(())
    }

    /// Wipe both collections. The caller owns any confirmation flow.
    pub async fn reset_all(&self) -> Result<(), FleetError> {
        self.store.clear().await?;
        info!("All fleet data reset");
        Ok(())
    }
}
