//! AgriFleet CLI — inspect and exercise a fleet store from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Seed a demo fleet into ./fleet_data
//! agrifleet seed
//!
//! # Rollups and alerts
//! agrifleet stats
//! agrifleet alerts
//!
//! # Forecast the next service for one machine
//! agrifleet predict --id <uuid>
//! ```
//!
//! # Environment Variables
//!
//! - `AGRIFLEET_CONFIG`: path to a TOML config file
//! - `RUST_LOG`: logging level (default: info)

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use agrifleet::{
    compute_alerts, compute_fleet_stats, AssetId, AssetStatus, FleetConfig, MaintenanceRecord,
    NewAsset, NewMember, ServiceForecast, SledStore, TelemetryEngine, Urgency,
};

#[derive(Parser, Debug)]
#[command(name = "agrifleet")]
#[command(about = "Cooperative equipment lifecycle and telemetry engine")]
#[command(version)]
struct CliArgs {
    /// Directory for the durable fleet database
    #[arg(long, env = "AGRIFLEET_DATA_DIR", default_value = "./fleet_data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// List all machines with status, fuel and hour meter
    List,

    /// Fleet-wide rollup statistics
    Stats,

    /// Machines currently needing attention
    Alerts,

    /// Forecast the next service date for one machine
    Predict {
        /// Asset id (uuid)
        #[arg(long)]
        id: String,
    },

    /// Seed a small demo fleet (three machines, two members)
    Seed,

    /// Delete ALL machines and members
    Reset {
        /// Required confirmation flag
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = CliArgs::parse();

    let config = FleetConfig::load();
    config.validate()?;

    let store = SledStore::open(&args.data_dir, config.store)
        .with_context(|| format!("opening fleet store at {}", args.data_dir.display()))?;
    let engine = TelemetryEngine::new(Arc::new(store), config.clone());

    match args.command {
        SubCommand::List => {
            let assets = engine.list_assets().await?;
            if assets.is_empty() {
                println!("No machines registered.");
            }
            for asset in assets {
                let assigned = match &asset.assignment.assigned_to {
                    Some(operator) => format!("out to {operator}"),
                    None => "available".to_string(),
                };
                println!(
                    "{}  {:<24} {:<12} {:?}  fuel {:>5.1}%  {:>6.1}/{:.0} h  {}",
                    asset.id,
                    asset.name,
                    asset.kind,
                    asset.status,
                    asset.fuel_level,
                    asset.usage.current_hours,
                    asset.usage.service_interval,
                    assigned
                );
            }
        }

        SubCommand::Stats => {
            let assets = engine.list_assets().await?;
            let stats = compute_fleet_stats(&assets);
            println!("Machines:      {}", stats.total);
            println!("  assigned:    {}", stats.assigned);
            println!("  available:   {}", stats.available);
            println!("  healthy:     {}", stats.healthy);
            println!("  needs repair:{}", stats.needs_repair);
            println!("  broken:      {}", stats.broken);
            println!("Availability:  {:.0}%", stats.availability_ratio * 100.0);
            println!("Lifetime cost: {:.0} (maintenance {:.0} + fuel {:.0})",
                stats.lifetime_cost, stats.lifetime_maintenance_cost, stats.lifetime_fuel_cost);
        }

        SubCommand::Alerts => {
            let assets = engine.list_assets().await?;
            let alerts = compute_alerts(&assets);
            if alerts.is_empty() {
                println!("All machines healthy and under their service intervals.");
            }
            for asset in alerts {
                println!(
                    "{}  {:<24} {:?}  {:.1}/{:.0} h",
                    asset.id, asset.name, asset.status, asset.usage.current_hours,
                    asset.usage.service_interval
                );
            }
        }

        SubCommand::Predict { id } => {
            let id: AssetId = id.parse().context("invalid asset id")?;
            let asset = engine.get_asset(&id).await?;
            match engine.predict_service(&id).await? {
                ServiceForecast::Overdue => {
                    println!("{}: OVERDUE for service", asset.name);
                }
                ServiceForecast::Scheduled {
                    forecast_date,
                    days_remaining,
                    urgency,
                } => {
                    let tag = match urgency {
                        Urgency::Urgent => " (URGENT)",
                        Urgency::Normal => "",
                    };
                    println!(
                        "{}: service due {} ({} days){}",
                        asset.name, forecast_date, days_remaining, tag
                    );
                }
            }
        }

        SubCommand::Seed => {
            seed_demo_fleet(&engine).await?;
            info!("Demo fleet seeded");
        }

        SubCommand::Reset { yes } => {
            if !yes {
                anyhow::bail!("refusing to wipe data without --yes");
            }
            engine.reset_all().await?;
            println!("All fleet data deleted.");
        }
    }

    Ok(())
}

/// Create a small, realistic demo fleet through the normal engine
/// operations so the histories and meters are internally consistent.
async fn seed_demo_fleet(engine: &TelemetryEngine) -> Result<()> {
    let tractor = engine
        .create_asset(NewAsset {
            name: "Massey Ferguson 375".to_string(),
            kind: Some("Tractor".to_string()),
            service_interval: Some(200.0),
            daily_average: Some(5.0),
            specs: None,
        })
        .await?;
    let pulper = engine
        .create_asset(NewAsset {
            name: "Coffee Pulper MK-4".to_string(),
            kind: Some("Processing".to_string()),
            service_interval: Some(300.0),
            daily_average: Some(8.0),
            specs: None,
        })
        .await?;
    engine
        .create_asset(NewAsset {
            name: "Rice Thresher Model X".to_string(),
            kind: Some("Harvesting".to_string()),
            service_interval: Some(100.0),
            daily_average: Some(2.0),
            specs: None,
        })
        .await?;

    engine
        .add_member(NewMember {
            name: "Jean Paul".to_string(),
            role: "Farmer".to_string(),
            ..Default::default()
        })
        .await?;
    engine
        .add_member(NewMember {
            name: "Marie Claire".to_string(),
            role: "Mechanic".to_string(),
            ..Default::default()
        })
        .await?;

    // Give the machines some life: hours, a refuel, a service, a checkout.
    engine.log_usage(&tractor.id, 8.0).await?;
    engine
        .log_fuel(&tractor.id, 45.0, 58_000.0, "Kobil Nyabugogo", Utc::now().date_naive())
        .await?;
    engine.check_out(&tractor.id, "Jean Paul", 3).await?;

    engine.log_usage(&pulper.id, 12.0).await?;
    engine
        .log_maintenance(
            &pulper.id,
            MaintenanceRecord {
                date: Utc::now().date_naive(),
                action: "Belt Tightening".to_string(),
                technician: "Marie Claire".to_string(),
                cost: 5_000.0,
                note: None,
            },
        )
        .await?;
    engine.set_status(&pulper.id, AssetStatus::NeedsRepair).await?;

    Ok(())
}
