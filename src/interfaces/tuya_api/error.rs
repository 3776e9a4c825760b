use thiserror::Error;

/// Vendor code returned when the device is not linked to the cloud project.
pub const CODE_PERMISSION_DENIED: i64 = 1106;
/// Vendor code returned when the device is not connected to the cloud.
pub const CODE_DEVICE_OFFLINE: i64 = 2001;

const OFFLINE_MESSAGE: &str = "device is offline";

pub const PERMISSION_REMEDIATION: &str = "Permission denied. Please authorize your device:\n\
    1. Go to Tuya IoT Platform\n\
    2. Cloud -> Development -> Link Tuya App Account\n\
    3. Add your device using Smart Life app credentials\n\
    4. Ensure device is visible in 'Devices' tab";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("failed to obtain access token: {msg} (code: {code:?})")]
    Authentication { code: Option<i64>, msg: String },
    #[error("permission denied for device {device_id}; it must be linked to the cloud project via app account authorization")]
    PermissionDenied { device_id: String },
    #[error("device is offline: {0}")]
    DeviceOffline(String),
    #[error("{msg} (code: {code})")]
    Device { code: i64, msg: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),
    /// `Mac::new_from_slice` is fallible by signature; HMAC itself takes keys
    /// of any length, so no secret string produces this today.
    #[error("invalid access secret")]
    InvalidSecret,
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

impl ApiError {
    /// Classify a failed envelope by its vendor code and message.
    pub fn from_vendor(device_id: &str, code: i64, msg: String) -> Self {
        if code == CODE_PERMISSION_DENIED {
            ApiError::PermissionDenied {
                device_id: device_id.to_string(),
            }
        } else if is_offline(code, &msg) {
            ApiError::DeviceOffline(msg)
        } else {
            ApiError::Device { code, msg }
        }
    }

    /// Whether retrying later can be expected to succeed without user action.
    ///
    /// A token failure carrying a vendor code means the credentials were
    /// rejected; one without a code is a transport or payload problem.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::Authentication { code: None, .. }
                | ApiError::DeviceOffline(_)
                | ApiError::Transport(_)
                | ApiError::Io(_)
        )
    }

    /// Human-readable text telling the user what to do about this failure.
    pub fn remediation(&self) -> String {
        match self {
            ApiError::PermissionDenied { .. } => PERMISSION_REMEDIATION.to_string(),
            ApiError::Authentication { .. } => format!(
                "{self}. Make sure Access ID and Access Secret are correct from Tuya IoT Platform"
            ),
            other => other.to_string(),
        }
    }
}

pub fn is_offline(code: i64, msg: &str) -> bool {
    code == CODE_DEVICE_OFFLINE || msg.to_lowercase().contains(OFFLINE_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_vendor_codes() {
        assert!(matches!(
            ApiError::from_vendor("dev1", 1106, "permission deny".into()),
            ApiError::PermissionDenied { device_id } if device_id == "dev1"
        ));
        assert!(matches!(
            ApiError::from_vendor("dev1", 2001, "whatever".into()),
            ApiError::DeviceOffline(_)
        ));
        assert!(matches!(
            ApiError::from_vendor("dev1", 1234, "The Device Is Offline".into()),
            ApiError::DeviceOffline(_)
        ));
        assert!(matches!(
            ApiError::from_vendor("dev1", 9999, "boom".into()),
            ApiError::Device { code: 9999, .. }
        ));
    }

    #[test]
    fn permission_error_is_permanent_with_instructions() {
        let err = ApiError::from_vendor("dev1", 1106, "permission deny".into());
        assert!(!err.is_transient());
        assert!(err.remediation().contains("Link Tuya App Account"));
    }

    #[test]
    fn rejected_credentials_are_permanent() {
        let rejected = ApiError::Authentication {
            code: Some(1004),
            msg: "sign invalid".into(),
        };
        assert!(!rejected.is_transient());
        assert!(rejected.remediation().contains("Access Secret"));

        let unreachable = ApiError::Authentication {
            code: None,
            msg: "transport error: connection refused".into(),
        };
        assert!(unreachable.is_transient());
    }

    #[test]
    fn offline_is_transient() {
        assert!(ApiError::DeviceOffline("device is offline".into()).is_transient());
        assert!(!ApiError::Device { code: 1, msg: "x".into() }.is_transient());
    }
}
