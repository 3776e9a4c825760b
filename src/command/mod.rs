mod check;
mod device;
mod entities;
mod list_devices;
mod poll;
mod set;

pub use check::check;
pub use device::{info, send_command, status};
pub use entities::entities;
pub use list_devices::list_devices;
pub use poll::poll;
pub use set::set;

use anyhow::Result;

use crate::interfaces::TuyaClient;
use crate::node_mgmt::config::EntrySet;

/// Load the configured entries and open a client for the primary device.
fn connect() -> Result<(EntrySet, TuyaClient)> {
    let entries = EntrySet::from_env()?;
    let client = TuyaClient::new(entries.primary.credentials.clone())?;
    Ok((entries, client))
}
