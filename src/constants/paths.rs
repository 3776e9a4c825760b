pub const TOKEN: &str = "/v1.0/token?grant_type=1";
pub const DEVICES: &str = "/v1.0/devices";

pub fn device(device_id: &str) -> String {
    format!("{DEVICES}/{device_id}")
}

pub fn device_status(device_id: &str) -> String {
    format!("{DEVICES}/{device_id}/status")
}

pub fn device_commands(device_id: &str) -> String {
    format!("{DEVICES}/{device_id}/commands")
}
