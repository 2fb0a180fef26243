//! TencentCloud Client
//!
//! Main client for calling TencentCloud API 3.0 actions, combining
//! credentials, signing, rate limiting, and the HTTP transport.

use super::auth::Credential;
use super::error::SdkError;
use super::http::{sanitize_for_log, ActionRequest, TcHttpClient};
use super::ratelimit::RateLimiter;
use serde_json::Value;
use url::Url;

pub const DEFAULT_REGION: &str = "ap-guangzhou";

/// API version of each supported service
pub fn api_version(service: &str) -> Option<&'static str> {
    match service {
        "clb" => Some("2018-03-17"),
        "cls" => Some("2020-10-16"),
        _ => None,
    }
}

/// Main TencentCloud client
#[derive(Clone)]
pub struct TencentCloudClient {
    credential: Credential,
    http: TcHttpClient,
    rate_limiter: RateLimiter,
    pub region: String,
    /// Base URL used for every service instead of `https://{service}.tencentcloudapi.com`
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for TencentCloudClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TencentCloudClient")
            .field("credential", &self.credential)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl TencentCloudClient {
    /// Create a new TencentCloud client
    pub fn new(credential: Credential, region: &str) -> Result<Self, SdkError> {
        Ok(Self {
            credential,
            http: TcHttpClient::new()?,
            rate_limiter: RateLimiter::default(),
            region: region.to_string(),
            endpoint: None,
        })
    }

    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.endpoint = endpoint.map(|e| e.trim_end_matches('/').to_string());
        self
    }

    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    /// Build the endpoint URL for a service
    pub fn service_url(&self, service: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/", endpoint),
            None => format!("https://{}.tencentcloudapi.com/", service),
        }
    }

    /// Call one API action with a JSON parameter object
    pub async fn call(&self, service: &str, action: &str, params: &Value) -> Result<Value, SdkError> {
        let version = api_version(service)
            .ok_or_else(|| SdkError::Decode(format!("unknown service: {}", service)))?;

        let url = self.service_url(service);
        let parsed = Url::parse(&url).map_err(|e| SdkError::Network(format!("invalid endpoint {}: {}", url, e)))?;
        let host = match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(SdkError::Network(format!("endpoint has no host: {}", url))),
        };

        let payload = serde_json::to_string(params)?;

        self.rate_limiter.check(action).await;

        let request = ActionRequest {
            url: &url,
            host: &host,
            service,
            version,
            action,
            region: &self.region,
            payload,
        };

        match self.http.post_action(&self.credential, &request).await {
            Ok(response) => {
                tracing::debug!(
                    "api[{}] success, request body [{}], response body [{}]",
                    action,
                    sanitize_for_log(&request.payload),
                    sanitize_for_log(&response.to_string())
                );
                Ok(response)
            },
            Err(e) => {
                tracing::warn!(
                    "api[{}] fail, request body [{}], reason[{}]",
                    action,
                    sanitize_for_log(&request.payload),
                    e
                );
                Err(e)
            },
        }
    }
}
