//! System-wide default constants.
//!
//! Centralises the tunables so every subsystem reads the same canonical
//! values. Grouped by subsystem for easy discovery.

// ============================================================================
// Telemetry
// ============================================================================

/// Fuel burned per engine hour, in percentage points of tank capacity.
///
/// 5.0 means a machine worked for 10 hours drops from a full tank to 50%.
pub const BURN_RATE_PCT_PER_HOUR: f64 = 5.0;

/// A full tank, as a percentage. Refueling always tops off to this value.
pub const FUEL_FULL_PCT: f64 = 100.0;

/// Daily usage estimate (hours/day) applied when an asset has none set.
pub const DEFAULT_DAILY_AVERAGE_HOURS: f64 = 5.0;

/// Service interval (engine hours) applied when a new asset specifies none.
pub const DEFAULT_SERVICE_INTERVAL_HOURS: f64 = 200.0;

/// Machine category applied when a new asset specifies none.
pub const DEFAULT_ASSET_KIND: &str = "Tractor";

// ============================================================================
// Store
// ============================================================================

/// Maximum compare-and-swap attempts per `apply` before surfacing
/// `Contended`. Bounded so contention becomes a visible transient failure
/// instead of a live-lock.
pub const APPLY_MAX_ATTEMPTS: u32 = 4;

/// Base backoff between CAS attempts (milliseconds). Doubles per attempt.
pub const APPLY_BACKOFF_BASE_MS: u64 = 20;

/// Upper bound on a single backoff sleep (milliseconds).
pub const APPLY_BACKOFF_CAP_MS: u64 = 200;

// ============================================================================
// Scheduler
// ============================================================================

/// A forecast closer than this many days is flagged `Urgent`.
pub const URGENT_WINDOW_DAYS: i64 = 7;
