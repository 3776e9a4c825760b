pub const LOG_LEVEL: &str = "LOGGING_LEVEL";

pub const ACCESS_ID: &str = "TUYA_ACCESS_ID";
pub const ACCESS_SECRET: &str = "TUYA_ACCESS_SECRET";
pub const DEVICE_ID: &str = "TUYA_DEVICE_ID";
pub const REGION: &str = "TUYA_REGION";
pub const ENDPOINT: &str = "TUYA_ENDPOINT";

pub const SCAN_INTERVAL: &str = "SCAN_INTERVAL";
pub const ENTRY_ID: &str = "ENTRY_ID";
pub const ENTRY_TITLE: &str = "ENTRY_TITLE";
