use crate::helpers::Clock;
use crate::interfaces::tuya_api::{DeviceInfo, TuyaClient};

/// Devices in the cloud project that are not configured yet.
///
/// A listing failure is logged and treated as "nothing new".
pub fn find_new_devices<C: Clock, S: AsRef<str>>(
    client: &mut TuyaClient<C>,
    configured_ids: &[S],
) -> Vec<DeviceInfo> {
    let devices = match client.list_devices() {
        Ok(devices) => devices,
        Err(err) => {
            log::error!("Error listing devices: {}", err);
            return Vec::new();
        }
    };
    devices
        .into_iter()
        .filter(|device| !configured_ids.iter().any(|id| id.as_ref() == device.id))
        .collect()
}
