use crate::constants::defaults;

/// Bearer token plus the instant after which it must not be used.
///
/// The expiry already has the safety margin subtracted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at_ms: i64,
}

impl AccessToken {
    pub fn from_grant(value: String, expire_time_secs: i64, now_ms: i64) -> Self {
        let validity_secs = (expire_time_secs - defaults::TOKEN_EXPIRY_MARGIN_SECS).max(0);
        AccessToken {
            value,
            expires_at_ms: now_ms.saturating_add(validity_secs.saturating_mul(1000)),
        }
    }

    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at_ms
    }
}
