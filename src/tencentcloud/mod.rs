//! TencentCloud API interaction module
//!
//! This module provides the core functionality for calling TencentCloud API 3.0
//! actions: credentials and request signing, the HTTP transport, rate limiting,
//! and the error type shared by every service.
//!
//! # Module Structure
//!
//! - [`auth`] - Credentials and TC3-HMAC-SHA256 signing
//! - [`client`] - Main client for calling API actions
//! - [`error`] - SDK error type and code matching
//! - [`http`] - HTTP transport and response envelope parsing
//! - [`ratelimit`] - Per-action rate limiting
//!
//! # Example
//!
//! ```ignore
//! use tcprov::tencentcloud::{auth::Credential, client::TencentCloudClient};
//!
//! async fn example() -> Result<(), tcprov::tencentcloud::error::SdkError> {
//!     let client = TencentCloudClient::new(Credential::new("id", "key"), "ap-guangzhou")?;
//!     let listeners = client
//!         .call("clb", "DescribeListeners", &serde_json::json!({"LoadBalancerId": "lb-1"}))
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod ratelimit;
