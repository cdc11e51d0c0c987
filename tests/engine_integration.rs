//! Engine Integration Tests
//!
//! Exercises the full action interface against both store backends:
//! lifecycle scenarios, the fleet invariants under mixed operation
//! sequences, and the atomicity of composite transitions under real
//! task-level concurrency.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};

use agrifleet::{
    compute_alerts, compute_fleet_stats, needs_attention, AssetStatus, FleetConfig, FleetStore,
    MaintenanceRecord, MemoryStore, NewAsset, NewMember, ServiceForecast, SledStore,
    TelemetryEngine, Urgency,
};

fn memory_engine() -> TelemetryEngine {
    TelemetryEngine::new(
        Arc::new(MemoryStore::with_defaults()),
        FleetConfig::default(),
    )
}

fn sled_engine(dir: &tempfile::TempDir) -> TelemetryEngine {
    let config = FleetConfig::default();
    let store = SledStore::open(dir.path(), config.store).unwrap();
    TelemetryEngine::new(Arc::new(store), config)
}

fn maintenance(action: &str) -> MaintenanceRecord {
    MaintenanceRecord {
        date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
        action: action.to_string(),
        technician: "Garage Kigali".to_string(),
        cost: 15_000.0,
        note: Some("routine".to_string()),
    }
}

/// The canonical lifecycle: create, work, check out, return, service.
async fn end_to_end_scenario(engine: &TelemetryEngine) {
    let asset = engine
        .create_asset(NewAsset {
            name: "T1".to_string(),
            service_interval: Some(200.0),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(asset.fuel_level, 100.0);
    assert_eq!(asset.usage.current_hours, 0.0);

    let worked = engine.log_usage(&asset.id, 10.0).await.unwrap();
    assert_eq!(worked.usage.current_hours, 10.0);
    assert_eq!(worked.fuel_level, 50.0);

    let out = engine.check_out(&asset.id, "Alice", 3).await.unwrap();
    assert!(out.assignment.is_assigned);
    assert_eq!(out.assignment.assigned_to.as_deref(), Some("Alice"));
    assert_eq!(
        out.assignment.due_date,
        Some(Utc::now().date_naive() + Duration::days(3))
    );

    let back = engine.return_asset(&asset.id).await.unwrap();
    assert!(!back.assignment.is_assigned);
    assert!(back.assignment.assigned_to.is_none());
    assert!(back.assignment.due_date.is_none());

    let serviced = engine
        .log_maintenance(&asset.id, maintenance("Oil Change"))
        .await
        .unwrap();
    assert_eq!(serviced.usage.current_hours, 0.0);
    assert_eq!(serviced.status, AssetStatus::Healthy);
    assert_eq!(serviced.history.len(), 1);
}

#[tokio::test]
async fn test_end_to_end_scenario_memory() {
    end_to_end_scenario(&memory_engine()).await;
}

#[tokio::test]
async fn test_end_to_end_scenario_sled() {
    let dir = tempfile::tempdir().unwrap();
    end_to_end_scenario(&sled_engine(&dir)).await;
}

/// Two racing usage logs on the same machine must both land: composite
/// fuel+hours updates are atomic, never last-write-wins.
async fn concurrent_usage_is_atomic(engine: TelemetryEngine) {
    let asset = engine
        .create_asset(NewAsset {
            name: "T1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let e1 = engine.clone();
    let e2 = engine.clone();
    let id = asset.id;
    let (r1, r2) = tokio::join!(
        tokio::spawn(async move { e1.log_usage(&id, 2.0).await }),
        tokio::spawn(async move { e2.log_usage(&id, 2.0).await }),
    );
    r1.unwrap().unwrap();
    r2.unwrap().unwrap();

    let settled = engine.get_asset(&asset.id).await.unwrap();
    assert_eq!(settled.usage.current_hours, 4.0);
    assert_eq!(settled.fuel_level, 90.0);
}

#[tokio::test]
async fn test_concurrent_usage_logging_memory() {
    concurrent_usage_is_atomic(memory_engine()).await;
}

#[tokio::test]
async fn test_concurrent_usage_logging_sled() {
    let dir = tempfile::tempdir().unwrap();
    concurrent_usage_is_atomic(sled_engine(&dir)).await;
}

/// Many racing increments still sum exactly — no lost updates. Retry
/// headroom is raised well past the racer count so exhaustion cannot occur
/// even if every attempt collides.
#[tokio::test]
async fn test_many_concurrent_usage_logs_never_lose_updates() {
    let mut config = FleetConfig::default();
    config.store.apply_max_attempts = 32;
    config.store.apply_backoff_ms = 1;
    config.store.apply_backoff_cap_ms = 10;
    let engine = TelemetryEngine::new(Arc::new(MemoryStore::new(config.store)), config);
    let asset = engine
        .create_asset(NewAsset {
            name: "T1".to_string(),
            service_interval: Some(1_000.0),
            ..Default::default()
        })
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = engine.clone();
        let id = asset.id;
        handles.push(tokio::spawn(async move { engine.log_usage(&id, 1.0).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let settled = engine.get_asset(&asset.id).await.unwrap();
    assert_eq!(settled.usage.current_hours, 8.0);
    assert_eq!(settled.fuel_level, 60.0); // 100 - 8h * 5%/h
}

/// Exactly one of two racing checkouts wins; the loser gets AlreadyAssigned.
#[tokio::test]
async fn test_concurrent_checkout_grants_one_winner() {
    let engine = memory_engine();
    let asset = engine
        .create_asset(NewAsset {
            name: "T1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let e1 = engine.clone();
    let e2 = engine.clone();
    let id = asset.id;
    let (r1, r2) = tokio::join!(
        tokio::spawn(async move { e1.check_out(&id, "Alice", 3).await }),
        tokio::spawn(async move { e2.check_out(&id, "Bob", 3).await }),
    );
    let r1 = r1.unwrap();
    let r2 = r2.unwrap();

    assert!(r1.is_ok() != r2.is_ok(), "exactly one checkout must win");

    let holder = engine
        .get_asset(&asset.id)
        .await
        .unwrap()
        .assignment
        .assigned_to
        .unwrap();
    assert!(holder == "Alice" || holder == "Bob");
}

/// Fuel stays within [0, 100] across an arbitrary mixed sequence.
#[tokio::test]
async fn test_fuel_bounds_hold_across_mixed_sequence() {
    let engine = memory_engine();
    let asset = engine
        .create_asset(NewAsset {
            name: "T1".to_string(),
            service_interval: Some(10_000.0),
            ..Default::default()
        })
        .await
        .unwrap();
    let date = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();

    let mut hours_total = 0.0;
    for round in 0..10 {
        let hours = 7.0 + round as f64 * 3.0;
        let after = engine.log_usage(&asset.id, hours).await.unwrap();
        hours_total += hours;
        assert!(after.fuel_level >= 0.0 && after.fuel_level <= 100.0);
        assert_eq!(after.usage.current_hours, hours_total);

        if round % 3 == 0 {
            let refueled = engine
                .log_fuel(&asset.id, 30.0, 39_000.0, "Kobil", date)
                .await
                .unwrap();
            assert_eq!(refueled.fuel_level, 100.0);
        }
    }

    let settled = engine.get_asset(&asset.id).await.unwrap();
    assert_eq!(settled.fuel_logs.len(), 4);
    // Hours are monotone: never reduced by any fuel event.
    assert_eq!(settled.usage.current_hours, hours_total);
}

/// Subscribers observe committed snapshots, and a failed command publishes
/// nothing.
#[tokio::test]
async fn test_subscription_delivers_committed_snapshots_only() {
    let engine = memory_engine();
    let mut rx = engine.subscribe();

    let asset = engine
        .create_asset(NewAsset {
            name: "T1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    rx.changed().await.unwrap();
    let seen = rx.borrow_and_update().clone();
    assert!(seen.asset(&asset.id).is_some());
    let version_after_create = seen.version;

    // A precondition failure commits nothing and fires no notification.
    engine.return_asset(&asset.id).await.unwrap_err();
    let current = rx.borrow().clone();
    assert_eq!(current.version, version_after_create);

    engine.log_usage(&asset.id, 2.0).await.unwrap();
    rx.changed().await.unwrap();
    let seen = rx.borrow_and_update().clone();
    assert!(seen.version > version_after_create);
    assert_eq!(seen.asset(&asset.id).unwrap().usage.current_hours, 2.0);
}

/// Scheduler and alert derivations over live engine state.
#[tokio::test]
async fn test_derivations_reflect_live_state() {
    let engine = memory_engine();

    let due_soon = engine
        .create_asset(NewAsset {
            name: "Due Soon".to_string(),
            service_interval: Some(200.0),
            daily_average: Some(5.0),
            ..Default::default()
        })
        .await
        .unwrap();
    engine.log_usage(&due_soon.id, 150.0).await.unwrap();

    let overdue = engine
        .create_asset(NewAsset {
            name: "Overdue".to_string(),
            service_interval: Some(100.0),
            ..Default::default()
        })
        .await
        .unwrap();
    engine.log_usage(&overdue.id, 100.0).await.unwrap();

    let fresh = engine
        .create_asset(NewAsset {
            name: "Fresh".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    match engine.predict_service(&due_soon.id).await.unwrap() {
        ServiceForecast::Scheduled {
            days_remaining,
            urgency,
            ..
        } => {
            assert_eq!(days_remaining, 10);
            assert_eq!(urgency, Urgency::Normal);
        }
        ServiceForecast::Overdue => panic!("expected a scheduled forecast"),
    }
    assert!(engine.predict_service(&overdue.id).await.unwrap().is_overdue());

    let assets = engine.list_assets().await.unwrap();
    let alerts = compute_alerts(&assets);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].id, overdue.id);
    let quiet = assets.iter().filter(|a| !needs_attention(a)).count();
    assert_eq!(alerts.len() + quiet, assets.len());
    assert!(!needs_attention(assets.iter().find(|a| a.id == fresh.id).unwrap()));
}

/// Stats roll up engine-produced history and assignment state.
#[tokio::test]
async fn test_stats_over_engine_state() {
    let engine = memory_engine();

    let a = engine
        .create_asset(NewAsset {
            name: "A".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let b = engine
        .create_asset(NewAsset {
            name: "B".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    engine.check_out(&a.id, "Alice", 5).await.unwrap();
    engine
        .log_maintenance(&b.id, maintenance("Tire Replacement"))
        .await
        .unwrap();
    engine
        .log_fuel(
            &b.id,
            40.0,
            52_000.0,
            "Kobil",
            NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
        )
        .await
        .unwrap();

    let stats = compute_fleet_stats(&engine.list_assets().await.unwrap());
    assert_eq!(stats.total, 2);
    assert_eq!(stats.assigned, 1);
    assert_eq!(stats.available, 1);
    assert_eq!(stats.availability_ratio, 0.5);
    assert_eq!(stats.lifetime_maintenance_cost, 15_000.0);
    assert_eq!(stats.lifetime_fuel_cost, 52_000.0);
    assert_eq!(stats.lifetime_cost, 67_000.0);
}

/// Deleting a member leaves assignments dangling; deleting an asset leaves
/// members untouched. Both are deliberate.
#[tokio::test]
async fn test_no_referential_integrity_between_collections() {
    let engine = memory_engine();

    let member = engine
        .add_member(NewMember {
            name: "Jean Paul".to_string(),
            role: "Farmer".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let asset = engine
        .create_asset(NewAsset {
            name: "T1".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    engine.check_out(&asset.id, "Jean Paul", 3).await.unwrap();

    engine.remove_member(&member.id).await.unwrap();
    let still_assigned = engine.get_asset(&asset.id).await.unwrap();
    assert_eq!(
        still_assigned.assignment.assigned_to.as_deref(),
        Some("Jean Paul")
    );

    engine.delete_asset(&asset.id).await.unwrap();
    assert!(engine.list_assets().await.unwrap().is_empty());
}

/// Direct store-level sanity: apply on different ids proceeds independently.
#[tokio::test]
async fn test_apply_on_different_assets_does_not_interfere() {
    let store = Arc::new(MemoryStore::with_defaults());
    let engine = TelemetryEngine::new(store.clone(), FleetConfig::default());

    let a = engine
        .create_asset(NewAsset {
            name: "A".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let b = engine
        .create_asset(NewAsset {
            name: "B".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let e = engine.clone();
        let id = a.id;
        handles.push(tokio::spawn(async move { e.log_usage(&id, 1.0).await }));
        let e = engine.clone();
        let id = b.id;
        handles.push(tokio::spawn(async move { e.log_usage(&id, 2.0).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.get_asset(&a.id).await.unwrap().usage.current_hours, 4.0);
    assert_eq!(store.get_asset(&b.id).await.unwrap().usage.current_hours, 8.0);
}
