//! TencentCloud API errors
//!
//! Every failure coming out of the API client is mapped onto a code string in
//! the same namespace the cloud uses (`InvalidParameter.LBIdNotFound`,
//! `ClientError.NetworkError`, ...), so retry classification only ever has to
//! look at codes.

use thiserror::Error;

pub const CLIENT_NETWORK_ERROR: &str = "ClientError.NetworkError";
pub const CLIENT_HTTP_STATUS_ERROR: &str = "ClientError.HttpStatusCodeError";
pub const CLIENT_PARSE_ERROR: &str = "ClientError.ParseJsonError";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SdkError {
    #[error("[TencentCloudSDKError] Code={code}, Message={message}, RequestId={request_id}")]
    Api {
        code: String,
        message: String,
        request_id: String,
    },

    #[error("[TencentCloudSDKError] Code=ClientError.NetworkError, Message={0}")]
    Network(String),

    #[error("[TencentCloudSDKError] Code=ClientError.HttpStatusCodeError, Message=unexpected status {status}")]
    HttpStatus { status: u16, body: String },

    #[error("[TencentCloudSDKError] Code=ClientError.ParseJsonError, Message={0}")]
    Decode(String),
}

impl SdkError {
    pub fn api(code: &str, message: &str, request_id: &str) -> Self {
        SdkError::Api {
            code: code.to_string(),
            message: message.to_string(),
            request_id: request_id.to_string(),
        }
    }

    /// The error code, including synthetic client-side codes
    pub fn code(&self) -> &str {
        match self {
            SdkError::Api { code, .. } => code,
            SdkError::Network(_) => CLIENT_NETWORK_ERROR,
            SdkError::HttpStatus { .. } => CLIENT_HTTP_STATUS_ERROR,
            SdkError::Decode(_) => CLIENT_PARSE_ERROR,
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            SdkError::Api { request_id, .. } if !request_id.is_empty() => Some(request_id),
            _ => None,
        }
    }

    /// Match the error code against `codes`, either exactly or by the part
    /// before the first `.` (`ResourceInUse.Listener` matches `ResourceInUse`).
    pub fn is_expect_error(&self, codes: &[&str]) -> bool {
        let long_code = self.code();
        if codes.contains(&long_code) {
            return true;
        }
        match long_code.split_once('.') {
            Some((short_code, _)) => codes.contains(&short_code),
            None => false,
        }
    }
}

impl From<reqwest::Error> for SdkError {
    fn from(error: reqwest::Error) -> Self {
        SdkError::Network(error.to_string())
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(error: serde_json::Error) -> Self {
        SdkError::Decode(error.to_string())
    }
}

/// Format an SDK error for display
/// Security: keeps the code and request id but drops raw server messages for auth failures
pub fn format_sdk_error(error: &SdkError) -> String {
    let code = error.code();

    if code.starts_with("AuthFailure") {
        return "Authentication failed. Check TENCENTCLOUD_SECRET_ID / TENCENTCLOUD_SECRET_KEY.".to_string();
    }
    if code.starts_with("UnauthorizedOperation") {
        return "Permission denied. Check your CAM policies.".to_string();
    }
    if code.starts_with("RequestLimitExceeded") {
        return "Rate limit exceeded. Please try again later.".to_string();
    }
    if code.starts_with("ResourceNotFound") {
        return "Resource not found.".to_string();
    }

    match error {
        SdkError::Network(_) => {
            "Request failed. Check your network connection and try again.".to_string()
        },
        SdkError::HttpStatus { status, .. } if *status >= 500 => {
            "TencentCloud service temporarily unavailable. Please try again.".to_string()
        },
        SdkError::Api {
            code,
            message,
            request_id,
        } => {
            let message: String = message
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(120)
                .collect();
            format!("{} ({}) [request {}]", message, code, request_id)
        },
        other => other.to_string(),
    }
}
