//! Predictive Maintenance Scheduler
//!
//! Derives the forecasted service date for a machine from its usage trend.
//! A pure function over one asset snapshot: no I/O, no mutation, safe to
//! call concurrently and arbitrarily often.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::FleetConfig;
use crate::types::Asset;

/// How soon the forecast falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    Normal,
    Urgent,
}

/// Outcome of a service forecast.
///
/// A machine at or past its interval is `Overdue` — no date in the past is
/// fabricated for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ServiceForecast {
    Overdue,
    Scheduled {
        forecast_date: NaiveDate,
        days_remaining: i64,
        urgency: Urgency,
    },
}

impl ServiceForecast {
    pub fn is_overdue(&self) -> bool {
        matches!(self, ServiceForecast::Overdue)
    }
}

/// Forecast when `asset` will reach its service interval.
///
/// `hours_remaining / daily_average`, floored to whole days, mapped onto
/// the calendar from `today`. The daily average falls back to the
/// configured default when the asset has none set (or a non-positive one),
/// which also guards the division.
pub fn predict_service(asset: &Asset, config: &FleetConfig, today: NaiveDate) -> ServiceForecast {
    let hours_remaining = asset.usage.service_interval - asset.usage.current_hours;
    if hours_remaining <= 0.0 {
        return ServiceForecast::Overdue;
    }

    let daily_average = asset.daily_average_or(config.telemetry.default_daily_average);
    let days_remaining = (hours_remaining / daily_average).floor() as i64;

    let urgency = if days_remaining < config.scheduler.urgent_window_days {
        Urgency::Urgent
    } else {
        Urgency::Normal
    };

    ServiceForecast::Scheduled {
        forecast_date: today + Duration::days(days_remaining),
        days_remaining,
        urgency,
    }
}
