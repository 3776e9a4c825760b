use std::time::Duration;

pub const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const LOG_LEVEL: &str = "INFO";

pub const SCAN_INTERVAL_SECS: u64 = 30;
pub const MIN_SCAN_INTERVAL_SECS: u64 = 10;
pub const MAX_SCAN_INTERVAL_SECS: u64 = 300;

/// Tokens are treated as expired this long before the vendor says they are.
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 300;

pub const SETUP_RETRY_MAX_ELAPSED: Duration = Duration::from_secs(120);

pub const REGION: &str = "europe";
