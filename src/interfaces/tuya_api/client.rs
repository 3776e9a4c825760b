use std::sync::Arc;

use serde_json::{json, Value};

use crate::constants::{defaults, paths};
use crate::data_mgmt::models::{DpValue, StatusMap};
use crate::helpers::{Clock, SystemClock};
use crate::node_mgmt::config::Credentials;

use super::error::{is_offline, ApiError};
use super::models::{DeviceInfo, DeviceListing, Envelope, StatusItem, TokenResult};
use super::sign::{self, Method, SIGN_METHOD};
use super::token::AccessToken;

/// Vendor code for a token the cloud no longer accepts.
const CODE_TOKEN_INVALID: i64 = 1010;

fn get_ureq_agent() -> Result<ureq::Agent, ApiError> {
    Ok(ureq::AgentBuilder::new()
        .tls_connector(Arc::new(native_tls::TlsConnector::new()?))
        .timeout(defaults::API_REQUEST_TIMEOUT)
        .build())
}

// Vendor errors come back as JSON envelopes even on non-2xx statuses.
fn read_envelope(response: Result<ureq::Response, ureq::Error>) -> Result<Envelope, ApiError> {
    let response = match response {
        Ok(response) => response,
        Err(ureq::Error::Status(status, response)) => {
            log::debug!("HTTP status {status} from {}", response.get_url());
            response
        }
        Err(err) => return Err(err.into()),
    };
    let body = response.into_string()?;
    Ok(serde_json::from_str(&body)?)
}

/// Signed client for one device in a cloud project.
///
/// Holds the cached access token, so every method that may touch the network
/// takes `&mut self`. The client is meant to have a single caller.
pub struct TuyaClient<C: Clock = SystemClock> {
    credentials: Credentials,
    agent: ureq::Agent,
    clock: C,
    token: Option<AccessToken>,
}

impl TuyaClient<SystemClock> {
    pub fn new(credentials: Credentials) -> Result<Self, ApiError> {
        Self::with_clock(credentials, SystemClock)
    }
}

impl<C: Clock> TuyaClient<C> {
    pub fn with_clock(credentials: Credentials, clock: C) -> Result<Self, ApiError> {
        log::debug!(
            "Initialized cloud API client - endpoint: {}",
            credentials.endpoint
        );
        Ok(TuyaClient {
            credentials,
            agent: get_ureq_agent()?,
            clock,
            token: None,
        })
    }

    pub fn device_id(&self) -> &str {
        &self.credentials.device_id
    }

    /// Return the cached token, fetching a new one if there is none or it has
    /// expired. A failed fetch leaves no token behind.
    pub fn get_token(&mut self) -> Result<&str, ApiError> {
        let now = self.clock.now_ms();
        let token = match self.token.take() {
            Some(token) if token.is_valid_at(now) => token,
            _ => self.fetch_token(now)?,
        };
        Ok(self.token.insert(token).value.as_str())
    }

    fn fetch_token(&self, now: i64) -> Result<AccessToken, ApiError> {
        let timestamp = now.to_string();
        let string_to_sign = sign::token_string_to_sign(&self.credentials.access_id, &timestamp);
        let signature = sign::sign(&self.credentials.access_secret, &string_to_sign)?;

        log::debug!(
            "Getting token - t: {}, signature: {}",
            timestamp,
            sign::redact(&signature)
        );

        let response = self
            .agent
            .get(&format!("{}{}", self.credentials.endpoint, paths::TOKEN))
            .set("client_id", &self.credentials.access_id)
            .set("sign", &signature)
            .set("t", &timestamp)
            .set("sign_method", SIGN_METHOD)
            .call();

        let envelope = read_envelope(response).map_err(|err| ApiError::Authentication {
            code: None,
            msg: err.to_string(),
        })?;

        if !envelope.success {
            log::error!(
                "Failed to get token: {} (code: {:?})",
                envelope.msg_or_default(),
                envelope.code
            );
            log::error!("Make sure Access ID and Access Secret are correct from Tuya IoT Platform");
            return Err(ApiError::Authentication {
                code: envelope.code,
                msg: envelope.msg_or_default(),
            });
        }

        let grant: TokenResult =
            serde_json::from_value(envelope.result).map_err(|err| ApiError::Authentication {
                code: None,
                msg: format!("unexpected token payload: {err}"),
            })?;

        log::debug!(
            "Token obtained successfully, expires in {} seconds",
            grant.expire_time
        );
        Ok(AccessToken::from_grant(
            grant.access_token,
            grant.expire_time,
            now,
        ))
    }

    /// Issue a signed call and return the raw envelope, whatever its `success`.
    pub fn send_signed(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Envelope, ApiError> {
        let token = self.get_token()?.to_string();
        let timestamp = self.clock.now_ms().to_string();
        let body = body.map(serde_json::to_string).transpose()?;

        let string_to_sign = sign::request_string_to_sign(
            &self.credentials.access_id,
            &token,
            &timestamp,
            method,
            body.as_deref().unwrap_or_default(),
            path,
        );
        let signature = sign::sign(&self.credentials.access_secret, &string_to_sign)?;

        log::debug!(
            "{} {} - signature: {}",
            method.as_str(),
            path,
            sign::redact(&signature)
        );

        let url = format!("{}{}", self.credentials.endpoint, path);
        let request = match method {
            Method::Get => self.agent.get(&url),
            Method::Post => self.agent.post(&url),
        }
        .set("client_id", &self.credentials.access_id)
        .set("access_token", &token)
        .set("sign", &signature)
        .set("t", &timestamp)
        .set("sign_method", SIGN_METHOD);

        let response = match &body {
            Some(body) => request
                .set("Content-Type", "application/json")
                .send_string(body),
            None => request.call(),
        };

        let envelope = read_envelope(response)?;
        if !envelope.success && envelope.code == Some(CODE_TOKEN_INVALID) {
            log::warn!("Access token rejected by the cloud; it will be refreshed on the next call");
            self.token = None;
        }
        Ok(envelope)
    }

    /// Issue a signed call and unwrap the envelope's `result`.
    pub fn request(
        &mut self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let envelope = self.send_signed(method, path, body)?;
        if envelope.success {
            Ok(envelope.result)
        } else {
            Err(ApiError::from_vendor(
                &self.credentials.device_id,
                envelope.code_or_default(),
                envelope.msg_or_default(),
            ))
        }
    }

    pub fn fetch_device_status(&mut self) -> Result<StatusMap, ApiError> {
        let path = paths::device_status(&self.credentials.device_id);
        let result = self.request(Method::Get, &path, None)?;
        if result.is_null() {
            return Ok(StatusMap::new());
        }
        let items: Vec<StatusItem> = serde_json::from_value(result)?;
        Ok(items
            .into_iter()
            .map(|item| (item.code, item.value))
            .collect())
    }

    /// Current status of every data point. Failures are logged and yield an
    /// empty map, so one missed poll does not take the integration down.
    pub fn get_device_status(&mut self) -> StatusMap {
        match self.fetch_device_status() {
            Ok(status) => status,
            Err(ApiError::DeviceOffline(msg)) => {
                log::warn!("Device offline: {}", msg);
                StatusMap::new()
            }
            Err(err) => {
                log::error!("Error getting status: {}", err);
                StatusMap::new()
            }
        }
    }

    pub fn get_device_info(&mut self) -> Result<DeviceInfo, ApiError> {
        let path = paths::device(&self.credentials.device_id);
        let result = match self.request(Method::Get, &path, None) {
            Ok(result) => result,
            Err(err @ ApiError::PermissionDenied { .. }) => {
                log::error!(
                    "Permission denied (1106) for device {}. Please ensure the device is linked to your Cloud Project via App Account authorization.",
                    self.credentials.device_id
                );
                return Err(err);
            }
            Err(err) => {
                log::error!("Error getting device info: {}", err);
                return Err(err);
            }
        };
        log::debug!("Device info response: {}", result);
        if result.is_null() {
            return Ok(DeviceInfo::default());
        }
        Ok(serde_json::from_value(result)?)
    }

    /// Send one data point command. Returns the envelope's `success`.
    pub fn send_command(&mut self, code: &str, value: impl Into<DpValue>) -> bool {
        let value: DpValue = value.into();
        let body = json!({ "commands": [{ "code": code, "value": value }] });
        let path = paths::device_commands(&self.credentials.device_id);
        match self.send_signed(Method::Post, &path, Some(&body)) {
            Ok(envelope) if envelope.success => true,
            Ok(envelope) => {
                let msg = envelope.msg_or_default();
                if is_offline(envelope.code_or_default(), &msg) {
                    log::warn!("Could not send command {} (device offline): {}", code, msg);
                } else {
                    log::error!(
                        "Error sending command {}: {} (code: {:?})",
                        code,
                        msg,
                        envelope.code
                    );
                }
                false
            }
            Err(err) => {
                log::error!("Error sending command {}: {}", code, err);
                false
            }
        }
    }

    /// Every device visible to the cloud project.
    pub fn list_devices(&mut self) -> Result<Vec<DeviceInfo>, ApiError> {
        let result = self.request(Method::Get, paths::DEVICES, None)?;
        if result.is_null() {
            return Ok(Vec::new());
        }
        let listing: DeviceListing = serde_json::from_value(result)?;
        Ok(listing.into_devices())
    }

    pub fn test_connection(&mut self) -> (bool, String) {
        match self.get_device_info() {
            Ok(_) => (true, String::new()),
            Err(err) => {
                log::error!("Connection test failed: {}", err);
                (false, err.remediation())
            }
        }
    }

    pub fn close(self) {
        log::debug!("Closing client for device {}", self.credentials.device_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use mockito::{Matcher, Mock, ServerGuard};

    use crate::helpers::ManualClock;

    const ACCESS_ID: &str = "4dx9kqnu7y3hzxwe8crv";
    const ACCESS_SECRET: &str = "0f1e2d3c4b5a69788796a5b4c3d2e1f0";
    const DEVICE_ID: &str = "bf0123456789abcdefgh";
    const START: i64 = 1_700_000_000_000;

    fn client_for(server: &ServerGuard, clock: ManualClock) -> TuyaClient<ManualClock> {
        let credentials = Credentials::new(ACCESS_ID, ACCESS_SECRET, DEVICE_ID, server.url());
        TuyaClient::with_clock(credentials, clock).unwrap()
    }

    fn token_body(token: &str, expire_time: i64) -> String {
        json!({
            "success": true,
            "result": {
                "access_token": token,
                "expire_time": expire_time,
                "refresh_token": "refresh",
                "uid": "uid-1"
            },
            "t": START
        })
        .to_string()
    }

    fn mock_token(server: &mut ServerGuard, token: &str, expire_time: i64) -> Mock {
        server
            .mock("GET", "/v1.0/token")
            .match_query(Matcher::UrlEncoded("grant_type".into(), "1".into()))
            .with_header("content-type", "application/json")
            .with_body(token_body(token, expire_time))
            .create()
    }

    #[test]
    fn token_request_is_signed() {
        let mut server = mockito::Server::new();
        let expected_sign =
            sign::sign(ACCESS_SECRET, &format!("{ACCESS_ID}{START}")).unwrap();
        let m = server
            .mock("GET", "/v1.0/token")
            .match_query(Matcher::UrlEncoded("grant_type".into(), "1".into()))
            .match_header("client_id", ACCESS_ID)
            .match_header("sign", expected_sign.as_str())
            .match_header("t", START.to_string().as_str())
            .match_header("sign_method", "HMAC-SHA256")
            .match_header("access_token", Matcher::Missing)
            .with_body(token_body("tok-1", 7200))
            .expect(1)
            .create();

        let mut client = client_for(&server, ManualClock::new(START));
        assert_eq!(client.get_token().unwrap(), "tok-1");
        m.assert();
    }

    #[test]
    fn token_is_reused_within_validity_window() {
        let mut server = mockito::Server::new();
        let m = mock_token(&mut server, "tok-1", 7200).expect(1);
        let clock = ManualClock::new(START);
        let mut client = client_for(&server, clock.clone());

        assert_eq!(client.get_token().unwrap(), "tok-1");
        clock.advance(Duration::from_secs(6899));
        assert_eq!(client.get_token().unwrap(), "tok-1");
        m.assert();
    }

    #[test]
    fn token_is_refreshed_after_margin() {
        let mut server = mockito::Server::new();
        let m = mock_token(&mut server, "tok-1", 7200).expect(2);
        let clock = ManualClock::new(START);
        let mut client = client_for(&server, clock.clone());

        client.get_token().unwrap();
        clock.advance(Duration::from_secs(7200 - 300));
        client.get_token().unwrap();
        client.get_token().unwrap();
        m.assert();
    }

    #[test]
    fn zero_lifetime_token_is_refetched_every_call() {
        let mut server = mockito::Server::new();
        let m = mock_token(&mut server, "tok-1", 0).expect(2);
        let mut client = client_for(&server, ManualClock::new(START));

        client.get_token().unwrap();
        client.get_token().unwrap();
        m.assert();
    }

    #[test]
    fn failed_token_fetch_is_authentication_error_and_caches_nothing() {
        let mut server = mockito::Server::new();
        let m = server
            .mock("GET", "/v1.0/token")
            .match_query(Matcher::Any)
            .with_body(r#"{"success":false,"code":1004,"msg":"sign invalid"}"#)
            .expect(2)
            .create();
        let mut client = client_for(&server, ManualClock::new(START));

        let err = client.get_token().unwrap_err();
        assert!(matches!(err, ApiError::Authentication { code: Some(1004), .. }));
        assert!(!err.is_transient());
        assert!(client.get_token().is_err());
        m.assert();
    }

    #[test]
    fn status_request_is_signed_with_token() {
        let mut server = mockito::Server::new();
        mock_token(&mut server, "tok-1", 7200);
        let path = format!("/v1.0/devices/{DEVICE_ID}/status");
        let expected_sign = sign::sign(
            ACCESS_SECRET,
            &format!("{ACCESS_ID}tok-1{START}GET\n\n\n{path}"),
        )
        .unwrap();
        let m = server
            .mock("GET", path.as_str())
            .match_header("access_token", "tok-1")
            .match_header("sign", expected_sign.as_str())
            .match_header("client_id", ACCESS_ID)
            .with_body(r#"{"success":true,"result":[]}"#)
            .expect(1)
            .create();

        let mut client = client_for(&server, ManualClock::new(START));
        assert!(client.fetch_device_status().unwrap().is_empty());
        m.assert();
    }

    #[test]
    fn status_list_becomes_map() {
        let mut server = mockito::Server::new();
        mock_token(&mut server, "tok-1", 7200);
        server
            .mock("GET", format!("/v1.0/devices/{DEVICE_ID}/status").as_str())
            .with_body(
                json!({
                    "success": true,
                    "result": [
                        {"code": "battery_percentage", "value": 87},
                        {"code": "switch_ac", "value": true},
                        {"code": "led_mode", "value": "lamp_off"},
                        {"code": "battery_percentage", "value": 88}
                    ]
                })
                .to_string(),
            )
            .create();

        let mut client = client_for(&server, ManualClock::new(START));
        let status = client.get_device_status();
        assert_eq!(status.len(), 3);
        assert_eq!(status["battery_percentage"], DpValue::Int(88));
        assert_eq!(status["switch_ac"], DpValue::Bool(true));
        assert_eq!(status["led_mode"], DpValue::String("lamp_off".into()));
    }

    #[test]
    fn failed_or_offline_status_is_empty() {
        let mut server = mockito::Server::new();
        mock_token(&mut server, "tok-1", 7200);
        let m = server
            .mock("GET", format!("/v1.0/devices/{DEVICE_ID}/status").as_str())
            .with_body(r#"{"success":false,"code":2001,"msg":"device is offline"}"#)
            .create();

        let mut client = client_for(&server, ManualClock::new(START));
        assert!(client.get_device_status().is_empty());
        assert!(matches!(
            client.fetch_device_status(),
            Err(ApiError::DeviceOffline(_))
        ));
        m.remove();

        server
            .mock("GET", format!("/v1.0/devices/{DEVICE_ID}/status").as_str())
            .with_status(500)
            .with_body("internal error")
            .create();
        assert!(client.get_device_status().is_empty());
    }

    #[test]
    fn device_info_distinguishes_permission_errors() {
        let mut server = mockito::Server::new();
        mock_token(&mut server, "tok-1", 7200);
        let m = server
            .mock("GET", format!("/v1.0/devices/{DEVICE_ID}").as_str())
            .with_body(r#"{"success":false,"code":1106,"msg":"permission deny"}"#)
            .create();

        let mut client = client_for(&server, ManualClock::new(START));
        assert!(matches!(
            client.get_device_info(),
            Err(ApiError::PermissionDenied { .. })
        ));
        m.remove();

        server
            .mock("GET", format!("/v1.0/devices/{DEVICE_ID}").as_str())
            .with_body(r#"{"success":false,"code":9999,"msg":"something else"}"#)
            .create();
        assert!(matches!(
            client.get_device_info(),
            Err(ApiError::Device { code: 9999, .. })
        ));
    }

    #[test]
    fn send_command_reports_envelope_success() {
        let mut server = mockito::Server::new();
        mock_token(&mut server, "tok-1", 7200);
        let path = format!("/v1.0/devices/{DEVICE_ID}/commands");
        let body = r#"{"commands":[{"code":"switch_ac","value":true}]}"#;
        let expected_sign = sign::sign(
            ACCESS_SECRET,
            &format!("{ACCESS_ID}tok-1{START}POST\n\n{body}\n{path}"),
        )
        .unwrap();
        let ok = server
            .mock("POST", path.as_str())
            .match_header("content-type", "application/json")
            .match_header("sign", expected_sign.as_str())
            .match_body(Matcher::JsonString(body.to_string()))
            .with_body(r#"{"success":true,"result":true}"#)
            .expect(1)
            .create();

        let mut client = client_for(&server, ManualClock::new(START));
        assert!(client.send_command("switch_ac", true));
        ok.assert();
        ok.remove();

        server
            .mock("POST", path.as_str())
            .with_body(r#"{"success":false,"code":2008,"msg":"command or value not support"}"#)
            .create();
        assert!(!client.send_command("switch_ac", true));
    }

    #[test]
    fn rejected_token_is_dropped() {
        let mut server = mockito::Server::new();
        let token = mock_token(&mut server, "tok-1", 7200).expect(2);
        server
            .mock("GET", format!("/v1.0/devices/{DEVICE_ID}").as_str())
            .with_body(r#"{"success":false,"code":1010,"msg":"token invalid"}"#)
            .create();

        let mut client = client_for(&server, ManualClock::new(START));
        assert!(client.get_device_info().is_err());
        client.get_token().unwrap();
        token.assert();
    }

    #[test]
    fn list_devices_accepts_paged_result() {
        let mut server = mockito::Server::new();
        mock_token(&mut server, "tok-1", 7200);
        server
            .mock("GET", "/v1.0/devices")
            .with_body(
                json!({
                    "success": true,
                    "result": {"list": [{"id": "a", "name": "One"}, {"id": "b"}], "total": 2}
                })
                .to_string(),
            )
            .create();

        let mut client = client_for(&server, ManualClock::new(START));
        let devices = client.list_devices().unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].name.as_deref(), Some("One"));
    }

    #[test]
    fn test_connection_round_trip() {
        let mut server = mockito::Server::new();
        mock_token(&mut server, "tok-1", 7200);
        let m = server
            .mock("GET", format!("/v1.0/devices/{DEVICE_ID}").as_str())
            .with_body(r#"{"success":true,"result":{"id":"bf0123456789abcdefgh","name":"Station"}}"#)
            .create();

        let mut client = client_for(&server, ManualClock::new(START));
        assert_eq!(client.test_connection(), (true, String::new()));
        m.remove();

        server
            .mock("GET", format!("/v1.0/devices/{DEVICE_ID}").as_str())
            .with_body(r#"{"success":false,"code":1106,"msg":"permission deny"}"#)
            .create();
        let (ok, message) = client.test_connection();
        assert!(!ok);
        assert!(message.contains("Link Tuya App Account"));
    }
}
