use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::constants::{defaults, envvars, REGION_ENDPOINTS};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("unknown region '{0}'; expected one of europe, america, china, india")]
    UnknownRegion(String),
    #[error("invalid endpoint URL '{0}'")]
    InvalidEndpoint(String),
    #[error("scan interval must be between {min} and {max} seconds, got {got}")]
    ScanIntervalOutOfRange { got: u64, min: u64, max: u64 },
    #[error("could not parse {var}: '{value}'")]
    Parse { var: &'static str, value: String },
}

/// Everything needed to sign requests for one device.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_id: String,
    pub access_secret: String,
    pub device_id: String,
    pub endpoint: String,
}

impl Credentials {
    pub fn new(
        access_id: impl Into<String>,
        access_secret: impl Into<String>,
        device_id: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Credentials {
            access_id: access_id.into(),
            access_secret: access_secret.into(),
            device_id: device_id.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_id", &self.access_id)
            .field("access_secret", &"<redacted>")
            .field("device_id", &self.device_id)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Resolve a region name (or its short alias) to the regional base URL.
pub fn region_endpoint(region: &str) -> Result<&'static str, ConfigError> {
    let name = match region.trim().to_lowercase().as_str() {
        "eu" | "europe" => "europe",
        "us" | "america" => "america",
        "cn" | "china" => "china",
        "in" | "india" => "india",
        _ => return Err(ConfigError::UnknownRegion(region.to_string())),
    };
    REGION_ENDPOINTS
        .get(name)
        .copied()
        .ok_or_else(|| ConfigError::UnknownRegion(region.to_string()))
}

/// Accept either a region name or an explicit http(s) URL.
pub fn resolve_endpoint(region_or_url: &str) -> Result<String, ConfigError> {
    if let Ok(endpoint) = region_endpoint(region_or_url) {
        return Ok(endpoint.to_string());
    }
    match Url::parse(region_or_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(url.as_str().trim_end_matches('/').to_string())
        }
        Ok(_) => Err(ConfigError::InvalidEndpoint(region_or_url.to_string())),
        Err(_) if !region_or_url.contains("://") => {
            Err(ConfigError::UnknownRegion(region_or_url.to_string()))
        }
        Err(_) => Err(ConfigError::InvalidEndpoint(region_or_url.to_string())),
    }
}

pub fn scan_interval(secs: u64) -> Result<Duration, ConfigError> {
    if !(defaults::MIN_SCAN_INTERVAL_SECS..=defaults::MAX_SCAN_INTERVAL_SECS).contains(&secs) {
        return Err(ConfigError::ScanIntervalOutOfRange {
            got: secs,
            min: defaults::MIN_SCAN_INTERVAL_SECS,
            max: defaults::MAX_SCAN_INTERVAL_SECS,
        });
    }
    Ok(Duration::from_secs(secs))
}

/// One configured device: credentials plus the options that drive polling.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryConfig {
    pub entry_id: String,
    pub title: Option<String>,
    pub credentials: Credentials,
    pub scan_interval: Duration,
}

fn env_required(var: &'static str) -> Result<String, ConfigError> {
    env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(var))
}

fn env_optional(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

/// Split a device id list on commas or semicolons. Blank segments and
/// repeated ids are dropped; order is kept.
pub fn parse_device_ids(raw: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in raw.split(|c: char| c == ',' || c == ';').map(str::trim) {
        if id.is_empty() {
            continue;
        }
        if ids.iter().any(|existing| existing == id) {
            log::warn!("Device {} listed more than once; skipping repeat", id);
            continue;
        }
        ids.push(id.to_string());
    }
    ids
}

/// Every device configured through the environment. The first listed
/// device is the primary entry and takes the entry id and title overrides;
/// the others get their own entries keyed by device id.
#[derive(Clone, Debug, PartialEq)]
pub struct EntrySet {
    pub primary: EntryConfig,
    pub additional: Vec<EntryConfig>,
}

impl EntrySet {
    pub fn from_env() -> Result<Self, ConfigError> {
        let access_id = env_required(envvars::ACCESS_ID)?;
        let access_secret = env_required(envvars::ACCESS_SECRET)?;
        let mut device_ids = parse_device_ids(&env_required(envvars::DEVICE_ID)?).into_iter();
        let primary_id = device_ids
            .next()
            .ok_or(ConfigError::Missing(envvars::DEVICE_ID))?;

        let endpoint = match env_optional(envvars::ENDPOINT) {
            Some(endpoint) => resolve_endpoint(&endpoint)?,
            None => region_endpoint(
                &env_optional(envvars::REGION).unwrap_or_else(|| defaults::REGION.to_string()),
            )?
            .to_string(),
        };

        let scan_interval_secs = match env_optional(envvars::SCAN_INTERVAL) {
            Some(value) => value.trim().parse::<u64>().map_err(|_| ConfigError::Parse {
                var: envvars::SCAN_INTERVAL,
                value,
            })?,
            None => defaults::SCAN_INTERVAL_SECS,
        };
        let scan_interval = scan_interval(scan_interval_secs)?;

        let entry = |entry_id: String, title: Option<String>, device_id: String| EntryConfig {
            entry_id,
            title,
            credentials: Credentials::new(&access_id, &access_secret, device_id, &endpoint),
            scan_interval,
        };

        let primary = entry(
            env_optional(envvars::ENTRY_ID).unwrap_or_else(|| primary_id.clone()),
            env_optional(envvars::ENTRY_TITLE),
            primary_id,
        );
        let additional = device_ids
            .map(|device_id| entry(device_id.clone(), None, device_id))
            .collect();

        Ok(EntrySet {
            primary,
            additional,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntryConfig> {
        std::iter::once(&self.primary).chain(self.additional.iter())
    }

    pub fn device_ids(&self) -> Vec<&str> {
        self.iter()
            .map(|entry| entry.credentials.device_id.as_str())
            .collect()
    }
}
