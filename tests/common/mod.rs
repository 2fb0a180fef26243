//! Shared helpers for tests against a mocked TencentCloud endpoint

#![allow(dead_code)]

use serde_json::{json, Value};
use std::time::Duration;
use tcprov::provider::Provider;
use tcprov::retry::RetryPolicy;
use tcprov::schema::AttrMap;
use tcprov::tencentcloud::auth::Credential;
use tcprov::tencentcloud::client::TencentCloudClient;
use tcprov::tencentcloud::ratelimit::RateLimiter;
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

/// Provider pointed at `server` with short deadlines
pub fn provider(server: &MockServer) -> Provider {
    let client = TencentCloudClient::new(Credential::new("AKIDtest", "test-key"), "ap-guangzhou")
        .expect("client")
        .with_endpoint(Some(server.uri()))
        .with_rate_limiter(RateLimiter::disabled());

    Provider::new(client)
        .with_policies(
            RetryPolicy::new(Duration::from_secs(2)),
            RetryPolicy::new(Duration::from_secs(2)),
        )
        .with_task_polling(Duration::from_millis(10), Duration::from_secs(2))
}

/// Matcher for one API action
pub fn action(name: &str) -> MockBuilder {
    Mock::given(method("POST")).and(header("X-TC-Action", name))
}

/// 200 response wrapping `body` in the API envelope
pub fn ok(body: Value) -> ResponseTemplate {
    let mut body = body;
    if let Value::Object(map) = &mut body {
        map.entry("RequestId").or_insert_with(|| json!("req-test"));
    }
    ResponseTemplate::new(200).set_body_json(json!({ "Response": body }))
}

/// 200 response carrying an API error
pub fn api_error(code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "Response": {
            "Error": {"Code": code, "Message": message},
            "RequestId": "req-error"
        }
    }))
}

/// Mount a successful `DescribeTaskStatus`
pub async fn mount_task_success(server: &MockServer) {
    action("DescribeTaskStatus")
        .respond_with(ok(json!({"Status": 0})))
        .mount(server)
        .await;
}

pub fn attrs(value: Value) -> AttrMap {
    value.as_object().cloned().expect("object literal")
}
