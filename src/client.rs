use log::{debug, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::models::{PlatformResponse, TokenGrant};
use crate::signer::{self, CanonicalRequest, SIGN_METHOD};
use crate::token::TokenManager;

pub const TOKEN_PATH: &str = "/v1.0/token";

/// Upper bound for every outbound call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A call to the platform, before signing.
#[derive(Debug, Clone)]
pub struct PlatformRequest {
    method: Method,
    path: String,
    params: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    needs_token: bool,
}

impl PlatformRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            body: None,
            needs_token: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Serialize `body` as compact JSON. These exact bytes are hashed and sent.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    /// Send without an access token, as the token endpoint requires.
    pub fn without_token(mut self) -> Self {
        self.needs_token = false;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &[u8] {
        self.body.as_deref().unwrap_or_default()
    }

    pub fn needs_token(&self) -> bool {
        self.needs_token
    }

    /// `?k=v&...` with keys sorted, or an empty string when there are no params.
    pub fn query_string(&self) -> String {
        if self.params.is_empty() {
            return String::new();
        }

        let mut params: Vec<&(String, String)> = self.params.iter().collect();
        params.sort_by(|a, b| a.0.cmp(&b.0));

        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish();
        format!("?{}", encoded)
    }
}

/// Signed client for the Tuya cloud API
///
/// Keeps the access token, signs every request and re-authenticates once when
/// the platform answers 401.
pub struct TuyaClient {
    http: reqwest::Client,
    settings: Arc<Settings>,
    base_url: String,
    clock: Arc<dyn Clock>,
    tokens: TokenManager,
}

impl TuyaClient {
    /// Client for the region configured in `settings`.
    pub fn new(settings: Arc<Settings>) -> Result<Self> {
        let base_url = settings.region().base_url().to_string();
        Self::with_clock(settings, base_url, Arc::new(SystemClock))
    }

    pub fn new_with_base_url(settings: Arc<Settings>, base_url: String) -> Result<Self> {
        Self::with_clock(settings, base_url, Arc::new(SystemClock))
    }

    pub fn with_clock(
        settings: Arc<Settings>,
        base_url: String,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Ok(Self {
            http: build_http(REQUEST_TIMEOUT)?,
            settings,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens: TokenManager::new(clock.clone()),
            clock,
        })
    }

    /// Replace the default per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = build_http(timeout)?;
        Ok(self)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Current access token, fetched if missing or about to expire.
    pub async fn ensure_token(&self) -> Result<String> {
        self.tokens.ensure_token(|| self.fetch_token()).await
    }

    /// Sign and send `request`, returning the parsed JSON body.
    ///
    /// A 401 on a token-bearing request triggers exactly one forced refresh
    /// and one resend. Whatever the resend returns is final.
    pub async fn execute(&self, request: &PlatformRequest) -> Result<Value> {
        let token = if request.needs_token() {
            Some(self.ensure_token().await?)
        } else {
            None
        };

        let response = self.send_signed(request, token.as_deref()).await?;

        let response = match token {
            Some(rejected) if response.status() == StatusCode::UNAUTHORIZED => {
                warn!(
                    "{} {} rejected with 401, re-authenticating",
                    request.method(),
                    request.path()
                );
                let fresh = self
                    .tokens
                    .refresh_rejected(&rejected, || self.fetch_token())
                    .await?;
                self.send_signed(request, Some(&fresh)).await?
            }
            _ => response,
        };

        read_json(response).await
    }

    /// `GET /v1.0/token?grant_type=1`, signed without a token.
    async fn fetch_token(&self) -> Result<TokenGrant> {
        debug!("Requesting access token");

        let request = PlatformRequest::get(TOKEN_PATH)
            .param("grant_type", "1")
            .without_token();
        let body = read_json(self.send_signed(&request, None).await?).await?;

        let envelope: PlatformResponse = serde_json::from_value(body)?;
        if !envelope.success {
            return Err(Error::Token(envelope.failure_reason()));
        }

        let result = envelope
            .result
            .ok_or_else(|| Error::Protocol("token response has no result".to_string()))?;
        let grant: TokenGrant = serde_json::from_value(result)?;
        if let Some(uid) = &grant.uid {
            debug!("Access token issued for uid {}", uid);
        }
        Ok(grant)
    }

    async fn send_signed(
        &self,
        request: &PlatformRequest,
        access_token: Option<&str>,
    ) -> Result<reqwest::Response> {
        let query = request.query_string();
        let timestamp = self.clock.now_millis();
        let canonical = CanonicalRequest {
            method: request.method().as_str(),
            path: request.path(),
            query: &query,
            body: request.body(),
        };
        let sign = signer::sign(
            &canonical,
            timestamp,
            self.settings.client_id(),
            self.settings.client_secret(),
            access_token,
        );

        let url = format!("{}{}{}", self.base_url, request.path(), query);
        debug!("{} {}{}", request.method(), request.path(), query);

        let mut builder = self
            .http
            .request(request.method().clone(), &url)
            .header("client_id", self.settings.client_id())
            .header("sign", sign)
            .header("t", timestamp.to_string())
            .header("sign_method", SIGN_METHOD)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE);

        if let Some(token) = access_token {
            builder = builder.header("access_token", token);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        Ok(builder.send().await?)
    }
}

fn build_http(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

async fn read_json(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        debug!("Platform answered {}: {}", status, text);
        return Err(Error::Http {
            status: status.as_u16(),
            body: text,
        });
    }

    serde_json::from_str(&text)
        .map_err(|e| Error::Protocol(format!("response is not valid JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeviceCommands;

    fn settings() -> Arc<Settings> {
        Arc::new(Settings::new("cid123", "secret456", "vdevo123").with_region("us"))
    }

    #[test]
    fn test_client_creation() {
        let client = TuyaClient::new(settings()).unwrap();
        assert_eq!(client.base_url(), "https://openapi.tuyaus.com");
        assert_eq!(client.settings().device_id(), "vdevo123");
    }

    #[test]
    fn test_unknown_region_uses_eu() {
        let settings = Arc::new(Settings::new("cid", "secret", "dev").with_region("zz"));
        let client = TuyaClient::new(settings).unwrap();
        assert_eq!(client.base_url(), "https://openapi.tuyaeu.com");
    }

    #[test]
    fn test_client_with_custom_base_url() {
        let client =
            TuyaClient::new_with_base_url(settings(), "http://127.0.0.1:9000/".to_string())
                .unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_query_string_is_sorted_and_encoded() {
        let request = PlatformRequest::get("/v1.0/devices")
            .param("page_size", "20")
            .param("device_ids", "a,b")
            .param("grant_type", "1");
        assert_eq!(
            request.query_string(),
            "?device_ids=a%2Cb&grant_type=1&page_size=20"
        );

        assert_eq!(PlatformRequest::get("/v1.0/token").query_string(), "");
    }

    #[test]
    fn test_json_body_is_compact() {
        let request = PlatformRequest::post("/v1.0/devices/vdevo123/commands")
            .json(&DeviceCommands::switch("switch", true))
            .unwrap();
        assert_eq!(
            request.body(),
            br#"{"commands":[{"code":"switch","value":true}]}"#
        );
        assert!(request.needs_token());
        assert_eq!(request.method(), &Method::POST);
    }

    #[test]
    fn test_request_without_body_or_token() {
        let request = PlatformRequest::get(TOKEN_PATH).without_token();
        assert!(request.body().is_empty());
        assert!(!request.needs_token());
    }
}
