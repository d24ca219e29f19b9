// matchlog - util/constants.rs
//
// Single source of truth for named constants, formats, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "matchlog";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Log formats
// =============================================================================

/// chrono format string for the server-log timestamp prefix,
/// e.g. `11/28/2021 - 20:05:10`.
pub const LOG_TS_FORMAT: &str = "%m/%d/%Y - %H:%M:%S";

/// chrono format string for the time-of-day part, e.g. `20:05:10`.
pub const LOG_TIME_FORMAT: &str = "%H:%M:%S";

// =============================================================================
// Round segmentation
// =============================================================================

/// Trigger slugs that open a round.
pub const ROUND_START_TRIGGERS: &[&str] = &["round_start"];

/// Trigger slugs that close a round. Several synonymous trigger names
/// appear across engine versions.
pub const ROUND_END_TRIGGERS: &[&str] = &["round_end", "round_officially_end", "round_ended"];

/// Trigger slugs that force an engine-level round reset.
pub const ROUND_RESTART_TRIGGERS: &[&str] = &["restart_round_1_second"];

// =============================================================================
// Rosters
// =============================================================================

/// Number of players expected on each side of a competitive match.
pub const ROSTER_SIZE_PER_SIDE: usize = 5;

// =============================================================================
// Default artifact file names (used by the `run` subcommand)
// =============================================================================

pub const WINDOW_ARTIFACT: &str = "match_window.json";
pub const LINES_ARTIFACT: &str = "match_lines.json";
pub const ROUNDS_ARTIFACT: &str = "match_round_events.json";
pub const SUMMARY_ARTIFACT: &str = "match_round_events_extended.json";
pub const ROSTER_ARTIFACT: &str = "match_roster_accolades.json";
pub const EVENTS_ARTIFACT: &str = "match_events.csv";

// =============================================================================
// Logging
// =============================================================================

/// Default tracing filter when neither RUST_LOG nor --debug is set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Process exit codes
// =============================================================================

/// Generic failure: I/O errors, missing input files.
pub const EXIT_FAILURE: i32 = 1;

/// A required upstream artifact was present but malformed
/// (invalid JSON, missing key, wrong shape).
pub const EXIT_BAD_ARTIFACT: i32 = 2;
