//! Application constants for the GCPV watcher
//!
//! File names, timing windows, and lookup tables shared across the
//! parsers, the reconciliation store and the watcher.

use std::time::Duration;

// =============================================================================
// FinishLynx Files
// =============================================================================

/// Race list file consumed by the timing system
pub const EVT_FILE_NAME: &str = "Lynx.evt";

/// Roster file used for display strings only
pub const ROSTER_FILE_NAME: &str = "Lynx.ppl";

/// Persisted files smaller than this are treated as empty
pub const MIN_EVT_FILE_BYTES: u64 = 10;

/// Timestamp format appended to backup file names
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// =============================================================================
// Race List Format
// =============================================================================

/// Number of fields in a race-info record
pub const RACE_INFO_FIELD_COUNT: usize = 13;

/// Field positions within a race-info record
pub mod race_info_fields {
    pub const RACE_NUMBER: usize = 0;
    pub const TITLE: usize = 3;
    pub const LAPS: usize = 12;
}

/// Field positions within a racer record
pub mod racer_fields {
    pub const RACER_ID: usize = 1;
    pub const LANE: usize = 2;
}

/// Pattern a race number must match (digits then one uppercase letter)
pub const RACE_NUMBER_PATTERN: &str = r"^([0-9]+)([A-Z])$";

// =============================================================================
// Export Key Fields
// =============================================================================

/// Logical field names that must be configured for export parsing
pub mod key_fields {
    pub const TRACK_PARAMS: &str = "track_params";
    pub const RACE_GROUP: &str = "race_group";
    pub const STAGE: &str = "stage";
    pub const RACE_NUMBER: &str = "race_number";
    pub const LANE: &str = "lane";
    pub const RACER: &str = "racer";
    pub const AFFILIATION: &str = "affiliation";

    pub const ALL: &[&str] = &[
        TRACK_PARAMS,
        RACE_GROUP,
        STAGE,
        RACE_NUMBER,
        LANE,
        RACER,
        AFFILIATION,
    ];
}

/// Export glob used when the configuration leaves it blank
pub const DEFAULT_EXPORT_PATTERN: &str = "*.csv";

// =============================================================================
// Lap Calculation
// =============================================================================

/// Default track length in metres
pub const DEFAULT_TRACK_LENGTH: i64 = 100;

/// Track length when the parameters mention a 111m track
pub const SHORT_TRACK_LENGTH: i64 = 111;

/// Marker selecting the 111m track (matched case-insensitively)
pub const SHORT_TRACK_MARKER: &str = "111m";

/// Known race distances, scanned in this order; the first match wins
pub const RACE_DISTANCES: &[i64] = &[
    5000, 3000, 2000, 1500, 1000, 800, 777, 500, 400, 333, 300, 200, 100, 50,
];

// =============================================================================
// Watcher Timing
// =============================================================================

/// Repeat events for one path inside this window are ignored
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(2);

/// Delay before reading a changed file so the writer can finish
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Quiet period that coalesces bursts of deletions into one cleanup
pub const CLEANUP_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on parsing the persisted race list at startup
pub const SEED_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on parsing the roster at startup
pub const ROSTER_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Capacity of the notification broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 256;
