//! Lifecycle scenarios against a mocked TencentCloud endpoint
//!
//! Each test mounts the API actions a resource needs and drives it through
//! [`Lifecycle`] the way the CLI does.

mod common;

use common::{action, api_error, attrs, mount_task_success, ok, provider};
use serde_json::{json, Value};
use tcprov::error::ProviderError;
use tcprov::resource::{read_data_source, Applied, Lifecycle, Plan};
use tcprov::schema::hash::ids_hash;
use tcprov::services::clb::{ClbService, RuleFilter};
use tcprov::state::InstanceState;
use wiremock::matchers::body_partial_json;
use wiremock::MockServer;

fn listener(rules: Value) -> Value {
    json!({
        "Listeners": [{
            "ListenerId": "lbl-1",
            "Protocol": "HTTP",
            "Port": 80,
            "Rules": rules,
        }],
        "TotalCount": 1
    })
}

fn rule(location_id: &str, domain: &str) -> Value {
    json!({
        "LocationId": location_id,
        "Domain": domain,
        "Url": "/",
        "Scheduler": "WRR",
        "SessionExpireTime": 30,
        "HealthCheck": {
            "HealthSwitch": 1,
            "IntervalTime": 5,
            "HealthNum": 3,
            "UnHealthNum": 3,
            "HttpCode": 2,
            "HttpCheckPath": "/",
            "HttpCheckDomain": domain,
            "HttpCheckMethod": "GET"
        }
    })
}

fn rule_config() -> serde_json::Map<String, Value> {
    attrs(json!({
        "clb_id": "lb-1",
        "listener_id": "lbl-1",
        "domain": "abc.com",
        "url": "/",
        "session_expire_time": 30,
        "scheduler": "WRR"
    }))
}

fn recharge_info(name: &str) -> Value {
    json!({
        "Id": "rc-1",
        "TopicId": "topic-1",
        "LogsetId": "logset-1",
        "Name": name,
        "Bucket": "logs-1250000000",
        "BucketRegion": "ap-guangzhou",
        "Prefix": "nginx/",
        "LogType": "json_log",
        "Compress": "gzip",
        "Status": 0,
        "Enable": 1,
        "CreateTime": "2024-01-01 00:00:00"
    })
}

fn recharge_config(name: &str) -> serde_json::Map<String, Value> {
    attrs(json!({
        "topic_id": "topic-1",
        "logset_id": "logset-1",
        "name": name,
        "bucket": "logs-1250000000",
        "bucket_region": "ap-guangzhou",
        "prefix": "nginx/",
        "log_type": "json_log",
        "compress": "gzip"
    }))
}

fn recharge_state(name: &str) -> InstanceState {
    let mut attributes = recharge_config(name);
    attributes.insert("recharge_id".into(), json!("rc-1"));
    attributes.insert("status".into(), json!(0));
    attributes.insert("enable".into(), json!(true));
    attributes.insert("create_time".into(), json!("2024-01-01 00:00:00"));
    InstanceState {
        resource_type: "tencentcloud_cls_cos_recharge".into(),
        id: "topic-1#rc-1".into(),
        attributes,
    }
}

mod listener_rule {
    use super::*;

    #[tokio::test]
    async fn test_create_reads_back_single_rule() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeListeners")
            .respond_with(ok(listener(json!([rule("loc-1", "abc.com"), rule("loc-2", "other.com")]))))
            .mount(&server)
            .await;
        action("CreateRule")
            .and(body_partial_json(json!({
                "LoadBalancerId": "lb-1",
                "ListenerId": "lbl-1",
                "Rules": [{"Domain": "abc.com", "Url": "/", "Scheduler": "WRR", "SessionExpireTime": 30}]
            })))
            .respond_with(ok(json!({"LocationIds": ["loc-1"], "RequestId": "task-1"})))
            .expect(1)
            .mount(&server)
            .await;
        mount_task_success(&server).await;

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_clb_listener_rule").unwrap();
        let state = lifecycle.create(&rule_config()).await.unwrap();

        assert_eq!(state.id, "lb-1#lbl-1#loc-1");
        assert_eq!(state.attributes["rule_id"], "loc-1");
        assert_eq!(state.attributes["scheduler"], "WRR");
        assert_eq!(state.attributes["session_expire_time"], 30);
        assert_eq!(state.attributes["health_check_switch"], true);

        let filter = RuleFilter {
            clb_id: "lb-1".into(),
            listener_id: "lbl-1".into(),
            domain: "abc.com".into(),
            url: "/".into(),
            ..Default::default()
        };
        let rules = ClbService::new(&provider).describe_rules_by_filter(&filter).await.unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_tcp_listener() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeListeners")
            .respond_with(ok(json!({"Listeners": [{"ListenerId": "lbl-1", "Protocol": "TCP"}]})))
            .mount(&server)
            .await;
        action("CreateRule").respond_with(ok(json!({}))).expect(0).mount(&server).await;

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_clb_listener_rule").unwrap();
        let err = lifecycle.create(&rule_config()).await.unwrap_err();

        assert!(matches!(err, ProviderError::Check { .. }));
    }

    #[tokio::test]
    async fn test_failed_task_fails_create() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeListeners")
            .respond_with(ok(listener(json!([]))))
            .mount(&server)
            .await;
        action("CreateRule")
            .respond_with(ok(json!({"LocationIds": ["loc-1"], "RequestId": "task-1"})))
            .mount(&server)
            .await;
        action("DescribeTaskStatus")
            .and(body_partial_json(json!({"TaskId": "task-1"})))
            .respond_with(ok(json!({"Status": 1})))
            .mount(&server)
            .await;

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_clb_listener_rule").unwrap();
        let err = lifecycle.create(&rule_config()).await.unwrap_err();

        assert!(matches!(err, ProviderError::Task { state: "failed", .. }));
    }

    #[tokio::test]
    async fn test_running_task_is_polled_until_success() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeListeners")
            .respond_with(ok(listener(json!([rule("loc-1", "abc.com")]))))
            .mount(&server)
            .await;
        action("CreateRule")
            .respond_with(ok(json!({"LocationIds": ["loc-1"], "RequestId": "task-1"})))
            .mount(&server)
            .await;
        action("DescribeTaskStatus")
            .respond_with(ok(json!({"Status": 2})))
            .up_to_n_times(3)
            .expect(3)
            .mount(&server)
            .await;
        mount_task_success(&server).await;

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_clb_listener_rule").unwrap();
        let state = lifecycle.create(&rule_config()).await.unwrap();
        assert_eq!(state.id, "lb-1#lbl-1#loc-1");
    }

    #[tokio::test]
    async fn test_clb_id_change_issues_no_mutation() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("ModifyRule").respond_with(ok(json!({}))).expect(0).mount(&server).await;
        action("DeleteRule").respond_with(ok(json!({}))).expect(0).mount(&server).await;

        let prior = InstanceState {
            resource_type: "tencentcloud_clb_listener_rule".into(),
            id: "lb-1#lbl-1#loc-1".into(),
            attributes: {
                let mut a = rule_config();
                a.insert("rule_id".into(), json!("loc-1"));
                a
            },
        };
        let mut config = rule_config();
        config.insert("clb_id".into(), json!("lb-2"));

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_clb_listener_rule").unwrap();
        let err = lifecycle.apply(Some(&prior), &config).await.unwrap_err();

        assert_eq!(err.to_string(), "argument `clb_id` cannot be changed");
    }

    #[tokio::test]
    async fn test_domain_change_plans_replace() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        let prior = InstanceState {
            resource_type: "tencentcloud_clb_listener_rule".into(),
            id: "lb-1#lbl-1#loc-1".into(),
            attributes: rule_config(),
        };
        let mut config = rule_config();
        config.insert("domain".into(), json!("xyz.com"));

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_clb_listener_rule").unwrap();
        assert_eq!(
            lifecycle.plan(Some(&prior), &config).unwrap(),
            Plan::Replace(vec!["domain".to_string()])
        );
    }

    #[tokio::test]
    async fn test_omitted_session_expire_time_plans_no_op() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        let mut backend_rule = rule("loc-1", "abc.com");
        backend_rule["SessionExpireTime"] = json!(0);
        action("DescribeListeners")
            .respond_with(ok(listener(json!([backend_rule]))))
            .mount(&server)
            .await;
        action("CreateRule")
            .respond_with(ok(json!({"LocationIds": ["loc-1"], "RequestId": "task-1"})))
            .expect(1)
            .mount(&server)
            .await;
        action("ModifyRule").respond_with(ok(json!({}))).expect(0).mount(&server).await;
        mount_task_success(&server).await;

        let config = attrs(json!({
            "clb_id": "lb-1",
            "listener_id": "lbl-1",
            "domain": "abc.com",
            "url": "/"
        }));
        let lifecycle = Lifecycle::new(&provider, "tencentcloud_clb_listener_rule").unwrap();
        let state = lifecycle.create(&config).await.unwrap();
        assert_eq!(state.attributes["session_expire_time"], 0);

        assert_eq!(lifecycle.plan(Some(&state), &config).unwrap(), Plan::NoOp);
        let applied = lifecycle.apply(Some(&state), &config).await.unwrap();
        assert!(matches!(applied, Applied::Unchanged(_)));
    }

    #[tokio::test]
    async fn test_replace_with_failed_create_reports_prior_deleted() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeListeners")
            .respond_with(ok(listener(json!([]))))
            .mount(&server)
            .await;
        action("DeleteRule")
            .and(body_partial_json(json!({"LocationIds": ["loc-1"]})))
            .respond_with(ok(json!({"RequestId": "task-3"})))
            .expect(1)
            .mount(&server)
            .await;
        action("CreateRule")
            .respond_with(api_error("InvalidParameterValue", "domain is illegal"))
            .expect(1)
            .mount(&server)
            .await;
        mount_task_success(&server).await;

        let prior = InstanceState {
            resource_type: "tencentcloud_clb_listener_rule".into(),
            id: "lb-1#lbl-1#loc-1".into(),
            attributes: {
                let mut a = rule_config();
                a.insert("rule_id".into(), json!("loc-1"));
                a
            },
        };
        let mut config = rule_config();
        config.insert("domain".into(), json!("xyz.com"));

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_clb_listener_rule").unwrap();
        let err = lifecycle.apply(Some(&prior), &config).await.unwrap_err();

        assert!(err.prior_deleted());
        match err {
            ProviderError::ReplaceFailed { id, source } => {
                assert_eq!(id, "lb-1#lbl-1#loc-1");
                assert!(matches!(*source, ProviderError::Sdk(ref e) if e.code() == "InvalidParameterValue"));
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_update_sends_only_changed_fields() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeListeners")
            .respond_with(ok(listener(json!([rule("loc-1", "abc.com")]))))
            .mount(&server)
            .await;
        action("ModifyRule")
            .and(body_partial_json(json!({
                "LoadBalancerId": "lb-1",
                "ListenerId": "lbl-1",
                "LocationId": "loc-1",
                "HealthCheck": {"IntervalTime": 10}
            })))
            .respond_with(ok(json!({"RequestId": "task-2"})))
            .expect(1)
            .mount(&server)
            .await;
        mount_task_success(&server).await;

        let prior = InstanceState {
            resource_type: "tencentcloud_clb_listener_rule".into(),
            id: "lb-1#lbl-1#loc-1".into(),
            attributes: {
                let mut a = rule_config();
                a.insert("rule_id".into(), json!("loc-1"));
                a.insert("health_check_interval_time".into(), json!(5));
                a
            },
        };
        let mut config = rule_config();
        config.insert("health_check_interval_time".into(), json!(10));

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_clb_listener_rule").unwrap();
        let applied = lifecycle.apply(Some(&prior), &config).await.unwrap();
        assert!(matches!(applied, Applied::Updated(_)));

        let requests = server.received_requests().await.unwrap_or_default();
        let modify = requests
            .iter()
            .find(|r| r.headers.get("X-TC-Action").map(|v| v.as_bytes()) == Some(b"ModifyRule".as_slice()))
            .expect("ModifyRule sent");
        let body: Value = serde_json::from_slice(&modify.body).unwrap();
        assert!(body.get("Scheduler").is_none());
        assert!(body.get("Domain").is_none());
    }

    #[tokio::test]
    async fn test_read_missing_rule_is_gone() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeListeners")
            .respond_with(ok(listener(json!([]))))
            .mount(&server)
            .await;

        let prior = InstanceState {
            resource_type: "tencentcloud_clb_listener_rule".into(),
            id: "lb-1#lbl-1#loc-1".into(),
            attributes: rule_config(),
        };
        let lifecycle = Lifecycle::new(&provider, "tencentcloud_clb_listener_rule").unwrap();
        assert_eq!(lifecycle.read(&prior).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_upgrades_legacy_id() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeListeners")
            .respond_with(ok(listener(json!([rule("loc-1", "abc.com")]))))
            .mount(&server)
            .await;

        let prior = InstanceState {
            resource_type: "tencentcloud_clb_listener_rule".into(),
            id: "loc-1".into(),
            attributes: rule_config(),
        };
        let lifecycle = Lifecycle::new(&provider, "tencentcloud_clb_listener_rule").unwrap();
        let state = lifecycle.read(&prior).await.unwrap().unwrap();
        assert_eq!(state.id, "lb-1#lbl-1#loc-1");
    }

    #[tokio::test]
    async fn test_import_and_delete() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeListeners")
            .respond_with(ok(listener(json!([rule("loc-1", "abc.com")]))))
            .mount(&server)
            .await;
        action("DeleteRule")
            .and(body_partial_json(json!({"LocationIds": ["loc-1"]})))
            .respond_with(ok(json!({"RequestId": "task-3"})))
            .expect(1)
            .mount(&server)
            .await;
        mount_task_success(&server).await;

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_clb_listener_rule").unwrap();
        let imported = lifecycle.import("lb-1#lbl-1#loc-1").await.unwrap();
        assert_eq!(imported.attributes["clb_id"], "lb-1");
        assert_eq!(imported.attributes["domain"], "abc.com");

        lifecycle.delete(&imported).await.unwrap();
    }
}

mod cos_recharge {
    use super::*;

    #[tokio::test]
    async fn test_create_sets_composite_id() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("CreateCosRecharge")
            .and(body_partial_json(json!({"TopicId": "topic-1", "Bucket": "logs-1250000000", "Compress": "gzip"})))
            .respond_with(ok(json!({"Id": "rc-1"})))
            .expect(1)
            .mount(&server)
            .await;
        action("DescribeCosRecharges")
            .respond_with(ok(json!({"Data": [recharge_info("nginx")]})))
            .mount(&server)
            .await;

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_cls_cos_recharge").unwrap();
        let state = lifecycle.create(&recharge_config("nginx")).await.unwrap();

        assert_eq!(state.id, "topic-1#rc-1");
        assert_eq!(state.attributes["recharge_id"], "rc-1");
        assert_eq!(state.attributes["enable"], true);
    }

    #[tokio::test]
    async fn test_immutable_change_issues_no_mutation() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("ModifyCosRecharge").respond_with(ok(json!({}))).expect(0).mount(&server).await;

        let mut config = recharge_config("nginx");
        config.insert("bucket".into(), json!("other-1250000000"));

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_cls_cos_recharge").unwrap();
        let err = lifecycle.update(&recharge_state("nginx"), &config).await.unwrap_err();

        assert!(matches!(err, ProviderError::Immutable(ref name) if name == "bucket"));
    }

    #[tokio::test]
    async fn test_name_update() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("ModifyCosRecharge")
            .and(body_partial_json(json!({"TopicId": "topic-1", "Id": "rc-1", "Name": "renamed"})))
            .respond_with(ok(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        action("DescribeCosRecharges")
            .respond_with(ok(json!({"Data": [recharge_info("renamed")]})))
            .mount(&server)
            .await;

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_cls_cos_recharge").unwrap();
        let applied = lifecycle
            .apply(Some(&recharge_state("nginx")), &recharge_config("renamed"))
            .await
            .unwrap();

        assert!(matches!(applied, Applied::Updated(_)));
        assert_eq!(applied.state().attributes["name"], "renamed");
    }

    #[tokio::test]
    async fn test_read_is_idempotent() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeCosRecharges")
            .respond_with(ok(json!({"Data": [recharge_info("nginx")]})))
            .mount(&server)
            .await;

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_cls_cos_recharge").unwrap();
        let first = lifecycle.read(&recharge_state("nginx")).await.unwrap().unwrap();
        let second = lifecycle.read(&first).await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(lifecycle.plan(Some(&second), &recharge_config("nginx")).unwrap(), Plan::NoOp);
    }

    #[tokio::test]
    async fn test_missing_recharge_is_gone() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeCosRecharges")
            .respond_with(ok(json!({"Data": [], "Total": 0})))
            .mount(&server)
            .await;

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_cls_cos_recharge").unwrap();
        assert_eq!(lifecycle.read(&recharge_state("nginx")).await.unwrap(), None);

        let err = lifecycle.import("topic-1#rc-1").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_topic_not_found_is_gone() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeCosRecharges")
            .respond_with(api_error("ResourceNotFound.TopicNotExist", "topic not exist"))
            .mount(&server)
            .await;

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_cls_cos_recharge").unwrap();
        assert_eq!(lifecycle.read(&recharge_state("nginx")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_import_id() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_cls_cos_recharge").unwrap();
        let err = lifecycle.import("topic-1").await.unwrap_err();

        assert!(matches!(err, ProviderError::Id(_)));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_delete_disables_recharge() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("ModifyCosRecharge")
            .and(body_partial_json(json!({"TopicId": "topic-1", "Id": "rc-1", "Enable": 0})))
            .respond_with(ok(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_cls_cos_recharge").unwrap();
        lifecycle.delete(&recharge_state("nginx")).await.unwrap();
    }
}

mod log_set {
    use super::*;

    fn logsets(id: &str) -> Value {
        json!({
            "Logsets": [{
                "LogsetId": id,
                "LogsetName": "clb_logset",
                "CreateTime": "2024-01-01 00:00:00",
                "TopicCount": 2
            }],
            "TotalCount": 1
        })
    }

    #[tokio::test]
    async fn test_create_adopts_existing_logset() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeClsLogSet")
            .respond_with(ok(json!({"LogsetId": "ls-access", "HealthLogsetId": "ls-health"})))
            .mount(&server)
            .await;
        action("CreateClsLogSet").respond_with(ok(json!({}))).expect(0).mount(&server).await;
        action("DescribeLogsets")
            .respond_with(ok(logsets("ls-health")))
            .mount(&server)
            .await;

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_clb_log_set").unwrap();
        let state = lifecycle
            .create(&attrs(json!({"logset_type": "HEALTH"})))
            .await
            .unwrap();

        assert_eq!(state.id, "ls-health");
        assert_eq!(state.attributes["name"], "clb_logset");
        assert_eq!(state.attributes["period"], 7);
    }

    #[tokio::test]
    async fn test_create_new_logset() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeClsLogSet")
            .respond_with(ok(json!({"LogsetId": "", "HealthLogsetId": ""})))
            .mount(&server)
            .await;
        action("CreateClsLogSet")
            .and(body_partial_json(json!({"Period": 30, "LogsetType": "ACCESS"})))
            .respond_with(ok(json!({"LogsetId": "ls-new"})))
            .expect(1)
            .mount(&server)
            .await;
        action("DescribeLogsets")
            .and(body_partial_json(json!({"Filters": [{"Key": "logsetId", "Values": ["ls-new"]}]})))
            .respond_with(ok(logsets("ls-new")))
            .mount(&server)
            .await;

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_clb_log_set").unwrap();
        let state = lifecycle.create(&attrs(json!({"period": 30}))).await.unwrap();

        assert_eq!(state.id, "ls-new");
        assert_eq!(state.attributes["logset_type"], "ACCESS");
        assert_eq!(state.attributes["topic_count"], 2);
    }

    #[tokio::test]
    async fn test_import_infers_type() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeLogsets")
            .respond_with(ok(logsets("ls-health")))
            .mount(&server)
            .await;
        action("DescribeClsLogSet")
            .respond_with(ok(json!({"LogsetId": "ls-access", "HealthLogsetId": "ls-health"})))
            .mount(&server)
            .await;

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_clb_log_set").unwrap();
        let state = lifecycle.import("ls-health").await.unwrap();
        assert_eq!(state.attributes["logset_type"], "HEALTH");
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_serialised() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeClsLogSet")
            .respond_with(ok(json!({"LogsetId": "ls-access"})))
            .mount(&server)
            .await;
        action("DescribeLogsets")
            .respond_with(ok(logsets("ls-access")))
            .mount(&server)
            .await;

        let lifecycle = Lifecycle::new(&provider, "tencentcloud_clb_log_set").unwrap();
        let config = attrs(json!({}));
        let (a, b) = tokio::join!(lifecycle.create(&config), lifecycle.create(&config));

        assert_eq!(a.unwrap().id, "ls-access");
        assert_eq!(b.unwrap().id, "ls-access");
    }
}

mod listener_rules {
    use super::*;

    #[tokio::test]
    async fn test_query_filters_by_domain() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeListeners")
            .respond_with(ok(listener(json!([rule("loc-1", "abc.com"), rule("loc-2", "other.com")]))))
            .mount(&server)
            .await;

        let config = attrs(json!({"clb_id": "lb-1", "listener_id": "lbl-1", "domain": "abc.com"}));
        let result = read_data_source(&provider, "tencentcloud_clb_listener_rules", &config)
            .await
            .unwrap();

        let rules = result.attributes["rule_list"].as_array().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0]["rule_id"], "loc-1");
        assert_eq!(rules[0]["clb_id"], "lb-1");
        assert_eq!(rules[0]["health_check_http_method"], "GET");
        assert_eq!(result.id, ids_hash(&["loc-1"]));
    }

    #[tokio::test]
    async fn test_query_writes_result_file() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeListeners")
            .respond_with(ok(listener(json!([rule("loc-1", "abc.com")]))))
            .mount(&server)
            .await;

        let path = std::env::temp_dir().join(format!("tcprov-query-{}.json", uuid::Uuid::new_v4()));
        let config = attrs(json!({
            "clb_id": "lb-1",
            "listener_id": "lbl-1",
            "result_output_file": path.to_str().unwrap()
        }));
        read_data_source(&provider, "tencentcloud_clb_listener_rules", &config)
            .await
            .unwrap();

        let written: Vec<Value> = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.len(), 1);
        std::fs::remove_file(path).unwrap();
    }

    #[tokio::test]
    async fn test_missing_clb_is_empty() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        action("DescribeListeners")
            .respond_with(api_error("InvalidParameter.LBIdNotFound", "lb not found"))
            .mount(&server)
            .await;

        let config = attrs(json!({"clb_id": "lb-x", "listener_id": "lbl-1"}));
        let result = read_data_source(&provider, "tencentcloud_clb_listener_rules", &config)
            .await
            .unwrap();

        assert_eq!(result.attributes["rule_list"], json!([]));
    }

    #[tokio::test]
    async fn test_resource_type_is_not_a_data_source() {
        let server = MockServer::start().await;
        let provider = provider(&server);

        let err = read_data_source(&provider, "tencentcloud_clb_listener_rule", &attrs(json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }
}
