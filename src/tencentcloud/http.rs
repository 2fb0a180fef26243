//! HTTP utilities for TencentCloud API 3.0 calls

use super::auth::{self, Credential};
use super::error::SdkError;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Maximum length of request/response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 512;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Sanitize a body for logging
/// Truncates long bodies and strips non-printable characters
pub fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control() && c != ' ', "")
}

/// One signed API action
pub struct ActionRequest<'a> {
    pub url: &'a str,
    pub host: &'a str,
    pub service: &'a str,
    pub version: &'a str,
    pub action: &'a str,
    pub region: &'a str,
    pub payload: String,
}

/// HTTP client wrapper for TencentCloud API calls
#[derive(Clone)]
pub struct TcHttpClient {
    client: Client,
}

impl TcHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self, SdkError> {
        let client = Client::builder()
            .user_agent(concat!("tcprov/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client })
    }

    /// POST one action and unwrap the `Response` envelope
    pub async fn post_action(
        &self,
        credential: &Credential,
        request: &ActionRequest<'_>,
    ) -> Result<Value, SdkError> {
        let timestamp = chrono::Utc::now().timestamp();
        let authorization = auth::sign_tc3(
            credential,
            request.service,
            request.host,
            &request.payload,
            timestamp,
        );

        let mut builder = self
            .client
            .post(request.url)
            .header("Authorization", authorization)
            .header("Content-Type", auth::CONTENT_TYPE)
            .header("X-TC-Action", request.action)
            .header("X-TC-Version", request.version)
            .header("X-TC-Timestamp", timestamp.to_string())
            .header("X-TC-Region", request.region);

        if let Some(token) = &credential.token {
            builder = builder.header("X-TC-Token", token);
        }

        let response = builder.body(request.payload.clone()).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(SdkError::HttpStatus {
                status: status.as_u16(),
                body: sanitize_for_log(&body),
            });
        }

        parse_envelope(&body)
    }
}

/// Unwrap `{"Response": {...}}`, turning `Response.Error` into an API error
pub fn parse_envelope(body: &str) -> Result<Value, SdkError> {
    let mut parsed: Value = serde_json::from_str(body)?;

    let Some(response) = parsed.get_mut("Response").map(Value::take) else {
        return Err(SdkError::Decode(format!(
            "missing Response in body: {}",
            sanitize_for_log(body)
        )));
    };

    if let Some(error) = response.get("Error") {
        let field = |name: &str| {
            error
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let request_id = response
            .get("RequestId")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        return Err(SdkError::Api {
            code: field("Code"),
            message: field("Message"),
            request_id,
        });
    }

    Ok(response)
}
