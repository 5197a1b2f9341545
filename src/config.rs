use log::warn;
use std::fmt;

use crate::error::{Error, Result};

pub const ENV_CLIENT_ID: &str = "TUYA_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "TUYA_CLIENT_SECRET";
pub const ENV_DEVICE_ID: &str = "TUYA_DEVICE_ID";

pub const DEFAULT_REGION: &str = "eu";
pub const DEFAULT_DP_CODE: &str = "switch";

/// Tuya cloud data center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    Eu,
    Us,
    Cn,
    In,
}

impl Region {
    /// Look up a region by its code, case-insensitively. Unknown codes map to `Eu`.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "eu" => Region::Eu,
            "us" => Region::Us,
            "cn" => Region::Cn,
            "in" => Region::In,
            other => {
                warn!("Unknown region code '{}', falling back to eu", other);
                Region::Eu
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Region::Eu => "eu",
            Region::Us => "us",
            Region::Cn => "cn",
            Region::In => "in",
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Region::Eu => "https://openapi.tuyaeu.com",
            Region::Us => "https://openapi.tuyaus.com",
            Region::Cn => "https://openapi.tuyacn.com",
            Region::In => "https://openapi.tuyain.com",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Everything the service needs to talk to one device.
///
/// Built once at startup and shared by reference. Empty credentials are
/// accepted here and rejected by [`Settings::validate`] at first use.
#[derive(Clone)]
pub struct Settings {
    client_id: String,
    client_secret: String,
    device_id: String,
    region_code: String,
    region: Region,
    dp_code: String,
}

impl Settings {
    pub fn new(client_id: &str, client_secret: &str, device_id: &str) -> Self {
        Self {
            client_id: client_id.trim().to_string(),
            client_secret: client_secret.trim().to_string(),
            device_id: device_id.trim().to_string(),
            region_code: DEFAULT_REGION.to_string(),
            region: Region::default(),
            dp_code: DEFAULT_DP_CODE.to_string(),
        }
    }

    pub fn with_region(mut self, code: &str) -> Self {
        self.region_code = code.trim().to_string();
        self.region = Region::from_code(code);
        self
    }

    /// Empty codes keep the default.
    pub fn with_dp_code(mut self, dp_code: &str) -> Self {
        let dp_code = dp_code.trim();
        if !dp_code.is_empty() {
            self.dp_code = dp_code.to_string();
        }
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// The region code as configured, before fallback.
    pub fn region_code(&self) -> &str {
        &self.region_code
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn dp_code(&self) -> &str {
        &self.dp_code
    }

    /// Fail with every missing setting named, not only the first.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<String> = [
            (ENV_CLIENT_ID, &self.client_id),
            (ENV_CLIENT_SECRET, &self.client_secret),
            (ENV_DEVICE_ID, &self.device_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name.to_string())
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config { missing })
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("device_id", &self.device_id)
            .field("region", &self.region)
            .field("dp_code", &self.dp_code)
            .finish()
    }
}
