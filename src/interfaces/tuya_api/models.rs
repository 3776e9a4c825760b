use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::data_mgmt::models::DpValue;

/// Uniform wrapper around every vendor response.
#[derive(Debug, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub result: Value,
    #[serde(default, deserialize_with = "lenient_code")]
    pub code: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl Envelope {
    pub fn code_or_default(&self) -> i64 {
        self.code.unwrap_or_default()
    }

    pub fn msg_or_default(&self) -> String {
        self.msg
            .clone()
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

// Some gateways send the error code as a string.
fn lenient_code<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Deserialize)]
pub struct TokenResult {
    pub access_token: String,
    pub expire_time: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatusItem {
    pub code: String,
    pub value: DpValue,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct DeviceInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The project device listing comes back either as a bare array or paged
/// under `list`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DeviceListing {
    Plain(Vec<DeviceInfo>),
    Paged {
        #[serde(default)]
        list: Vec<DeviceInfo>,
    },
}

impl DeviceListing {
    pub fn into_devices(self) -> Vec<DeviceInfo> {
        match self {
            DeviceListing::Plain(devices) => devices,
            DeviceListing::Paged { list } => list,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn parse_failed_envelope() {
        let env: Envelope = serde_json::from_value(json!({
            "success": false, "code": 1106, "msg": "permission deny", "t": 1700000000000i64
        }))
        .unwrap();
        assert!(!env.success);
        assert_eq!(env.code_or_default(), 1106);
        assert_eq!(env.msg_or_default(), "permission deny");
        assert!(env.result.is_null());
    }

    #[test]
    fn parse_string_code() {
        let env: Envelope =
            serde_json::from_value(json!({"success": false, "code": "2001"})).unwrap();
        assert_eq!(env.code, Some(2001));
        assert_eq!(env.msg_or_default(), "Unknown error");
    }

    #[test]
    fn device_info_keeps_unknown_fields() {
        let info: DeviceInfo = serde_json::from_value(json!({
            "id": "bf123", "name": "Garage station", "online": true, "ip": "1.2.3.4"
        }))
        .unwrap();
        assert_eq!(info.name.as_deref(), Some("Garage station"));
        assert_eq!(info.extra.get("ip"), Some(&json!("1.2.3.4")));
    }

    #[test]
    fn device_listing_shapes() {
        let plain: DeviceListing = serde_json::from_value(json!([{"id": "a"}])).unwrap();
        assert_eq!(plain.into_devices().len(), 1);

        let paged: DeviceListing =
            serde_json::from_value(json!({"list": [{"id": "a"}, {"id": "b"}], "total": 2}))
                .unwrap();
        assert_eq!(paged.into_devices().len(), 2);
    }
}
