use log::debug;

use crate::client::{PlatformRequest, TuyaClient};
use crate::config::Settings;
use crate::error::Result;
use crate::models::{DeviceCommands, PlatformResponse};

/// The single switch this service controls.
pub struct Device {
    client: TuyaClient,
}

impl Device {
    pub fn new(client: TuyaClient) -> Self {
        Self { client }
    }

    pub fn settings(&self) -> &Settings {
        self.client.settings()
    }

    pub fn client(&self) -> &TuyaClient {
        &self.client
    }

    /// Set the configured data point to `value`.
    pub async fn switch(&self, value: bool) -> Result<PlatformResponse> {
        self.prepare().await?;

        let settings = self.settings();
        debug!(
            "Setting {} on device {} to {}",
            settings.dp_code(),
            settings.device_id(),
            value
        );

        let request = PlatformRequest::post(format!(
            "/v1.0/devices/{}/commands",
            settings.device_id()
        ))
        .json(&DeviceCommands::switch(settings.dp_code(), value))?;

        let body = self.client.execute(&request).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Current data points of the device.
    pub async fn status(&self) -> Result<PlatformResponse> {
        self.prepare().await?;

        let settings = self.settings();
        debug!("Fetching status for device {}", settings.device_id());

        let request =
            PlatformRequest::get(format!("/v1.0/devices/{}/status", settings.device_id()));

        let body = self.client.execute(&request).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Refuse to run with incomplete settings, then make sure a token is at hand.
    async fn prepare(&self) -> Result<()> {
        self.settings().validate()?;
        self.client.ensure_token().await?;
        Ok(())
    }
}
