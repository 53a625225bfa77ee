//! Shared constants for end-to-end tests
//!
//! When backend routes or test credentials change, update only this file.

// ============================================================================
// Session
// ============================================================================

/// Bearer token the fake backend accepts
pub const TEST_TOKEN: &str = "test-session-token";

// ============================================================================
// Backend Routes
// ============================================================================

pub const MESSAGES_PATH: &str = "/api/communications/mine";
pub const PARTIAL_GRADES_PATH: &str = "/api/partial-grades/mine";
pub const REPORT_CARDS_PATH: &str = "/api/report-cards/mine";
pub const EXTERNAL_RESULTS_PATH: &str = "/api/exam-results/mine";

// ============================================================================
// Timeouts
// ============================================================================

/// Per-request timeout of the notifier under test
pub const REQUEST_TIMEOUT_SECS: u64 = 5;

/// Per-fetch deadline used by the aggregator under test
pub const FETCH_TIMEOUT_MS: u64 = 500;

/// Maximum time to wait for the fake backend to start (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness checks (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;
