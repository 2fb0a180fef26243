//! TencentCloud Authentication
//!
//! Credentials come from the environment or the config file. Requests are
//! signed with TC3-HMAC-SHA256 (API 3.0 signature v3).

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::fmt;

pub const SIGN_ALGORITHM: &str = "TC3-HMAC-SHA256";
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";
const SIGNED_HEADERS: &str = "content-type;host";

type HmacSha256 = Hmac<Sha256>;

/// API key pair, optionally with a temporary STS token
#[derive(Clone)]
pub struct Credential {
    pub secret_id: String,
    secret_key: String,
    pub token: Option<String>,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"<redacted>")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credential {
    pub fn new(secret_id: &str, secret_key: &str) -> Self {
        Self {
            secret_id: secret_id.to_string(),
            secret_key: secret_key.to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Read credentials from TENCENTCLOUD_SECRET_ID / TENCENTCLOUD_SECRET_KEY
    /// (and TENCENTCLOUD_SECURITY_TOKEN when present)
    pub fn from_env() -> Option<Self> {
        let secret_id = std::env::var("TENCENTCLOUD_SECRET_ID").ok()?;
        let secret_key = std::env::var("TENCENTCLOUD_SECRET_KEY").ok()?;
        if secret_id.is_empty() || secret_key.is_empty() {
            tracing::warn!("Ignoring empty TencentCloud credentials from environment");
            return None;
        }
        let token = std::env::var("TENCENTCLOUD_SECURITY_TOKEN").ok();
        Some(Self::new(&secret_id, &secret_key).with_token(token))
    }
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Build the `Authorization` header value for a POST request with a JSON body
pub fn sign_tc3(
    credential: &Credential,
    service: &str,
    host: &str,
    payload: &str,
    timestamp: i64,
) -> String {
    let date = DateTime::<Utc>::from_timestamp(timestamp, 0)
        .unwrap_or_default()
        .format("%Y-%m-%d")
        .to_string();

    let canonical_request = format!(
        "POST\n/\n\ncontent-type:{}\nhost:{}\n\n{}\n{}",
        CONTENT_TYPE,
        host,
        SIGNED_HEADERS,
        sha256_hex(payload.as_bytes())
    );

    let credential_scope = format!("{}/{}/tc3_request", date, service);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        SIGN_ALGORITHM,
        timestamp,
        credential_scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let secret_date = hmac_sha256(
        format!("TC3{}", credential.secret_key).as_bytes(),
        date.as_bytes(),
    );
    let secret_service = hmac_sha256(&secret_date, service.as_bytes());
    let secret_signing = hmac_sha256(&secret_service, b"tc3_request");
    let signature = hex::encode(hmac_sha256(&secret_signing, string_to_sign.as_bytes()));

    format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        SIGN_ALGORITHM, credential.secret_id, credential_scope, SIGNED_HEADERS, signature
    )
}
