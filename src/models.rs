use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifetime assumed when the token endpoint omits `expire_time`.
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 7000;

/// Envelope wrapping every platform response.
///
/// Fields this crate does not know about are kept in `extra`, so echoing a
/// response back out loses nothing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformResponse<T = Value> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    /// Numeric on most endpoints, a string on some.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<T> PlatformResponse<T> {
    /// `code: msg` when the platform reported a failure, for error messages.
    pub fn failure_reason(&self) -> String {
        let code = self.code.as_ref().map(|code| match code {
            Value::String(code) => code.clone(),
            other => other.to_string(),
        });
        match (code, &self.msg) {
            (Some(code), Some(msg)) => format!("{}: {}", code, msg),
            (None, Some(msg)) => msg.clone(),
            (Some(code), None) => format!("code {}", code),
            (None, None) => "no reason given".to_string(),
        }
    }
}

impl PlatformResponse {
    /// Data points of a device status response, empty if the result has another shape.
    pub fn data_points(&self) -> Vec<DataPoint> {
        self.result
            .clone()
            .and_then(|result| serde_json::from_value(result).ok())
            .unwrap_or_default()
    }

    /// Boolean state of the named data point, if present.
    pub fn switch_state(&self, dp_code: &str) -> Option<bool> {
        self.data_points()
            .into_iter()
            .find(|dp| dp.code == dp_code)
            .and_then(|dp| dp.value.as_bool())
    }
}

/// `result` of `GET /v1.0/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Seconds until the token expires.
    #[serde(default)]
    pub expire_time: Option<u64>,
    /// Account the token was issued for.
    #[serde(default)]
    pub uid: Option<String>,
}

impl TokenGrant {
    pub fn lifetime_secs(&self) -> u64 {
        self.expire_time.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
    }
}

/// A single data point in a device status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataPoint {
    pub code: String,
    pub value: Value,
}

/// Body of `POST /v1.0/devices/{id}/commands`.
#[derive(Debug, Serialize)]
pub struct DeviceCommands {
    pub commands: Vec<DeviceCommand>,
}

#[derive(Debug, Serialize)]
pub struct DeviceCommand {
    pub code: String,
    pub value: bool,
}

impl DeviceCommands {
    pub fn switch(dp_code: &str, value: bool) -> Self {
        Self {
            commands: vec![DeviceCommand {
                code: dp_code.to_string(),
                value,
            }],
        }
    }
}
