use std::time::Duration;

use thiserror::Error;

use crate::helpers::{backoff_retry, Clock};
use crate::interfaces::tuya_api::{ApiError, DeviceInfo, TuyaClient};

use super::config::EntryConfig;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("{0}")]
    CannotConnect(String),
}

/// Identity of one configured device, handed to everything that needs to
/// know which entry it is working for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryContext {
    pub entry_id: String,
    pub device_id: String,
    pub title: String,
}

impl EntryContext {
    pub fn new(entry: &EntryConfig, info: &DeviceInfo) -> Self {
        EntryContext {
            entry_id: entry.entry_id.clone(),
            device_id: entry.credentials.device_id.clone(),
            title: entry_title(entry, info),
        }
    }
}

pub fn entry_title(entry: &EntryConfig, info: &DeviceInfo) -> String {
    if let Some(title) = &entry.title {
        return title.clone();
    }
    match info.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            let short_id: String = entry.credentials.device_id.chars().take(8).collect();
            format!("Power Station ({short_id})")
        }
    }
}

fn cannot_connect(err: ApiError) -> SetupError {
    log::error!("Setup failed: {}", err);
    SetupError::CannotConnect(err.remediation())
}

/// Check that the credentials reach the device and work out the entry title.
pub fn validate_entry<C: Clock>(
    client: &mut TuyaClient<C>,
    entry: &EntryConfig,
) -> Result<(EntryContext, DeviceInfo), SetupError> {
    let info = client.get_device_info().map_err(cannot_connect)?;
    Ok((EntryContext::new(entry, &info), info))
}

/// Like [`validate_entry`], but keeps retrying while the failure is one that
/// can clear up on its own (offline device, network, token service).
pub fn validate_entry_with_retry<C: Clock>(
    client: &mut TuyaClient<C>,
    entry: &EntryConfig,
    max_elapsed: Option<Duration>,
) -> Result<(EntryContext, DeviceInfo), SetupError> {
    let info = backoff_retry(
        || {
            client.get_device_info().map_err(|err| {
                if err.is_transient() {
                    backoff::Error::transient(err)
                } else {
                    backoff::Error::permanent(err)
                }
            })
        },
        max_elapsed,
    )
    .map_err(|err| match err {
        backoff::Error::Permanent(err) => cannot_connect(err),
        backoff::Error::Transient { err, .. } => cannot_connect(err),
    })?;
    Ok((EntryContext::new(entry, &info), info))
}

/// Validate the devices listed after the primary one. Each gets its own
/// client; a device that cannot be reached is logged and left out instead of
/// failing the whole setup.
pub fn validate_additional(entries: &[EntryConfig]) -> Vec<(EntryContext, TuyaClient)> {
    let mut validated = Vec::new();
    for entry in entries {
        let device_id = &entry.credentials.device_id;
        let mut client = match TuyaClient::new(entry.credentials.clone()) {
            Ok(client) => client,
            Err(err) => {
                log::error!("Could not create client for device {}: {}", device_id, err);
                continue;
            }
        };
        match validate_entry(&mut client, entry) {
            Ok((context, _)) => {
                log::info!("Added device {} as '{}'", device_id, context.title);
                validated.push((context, client));
            }
            Err(err) => {
                log::warn!("Skipping device {}: {}", device_id, err);
                client.close();
            }
        }
    }
    validated
}
