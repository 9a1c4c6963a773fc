//! Integration tests for the watcher API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;
use watcher_lib::{
    api::{create_router, AppState},
    observability::{StructuredLogger, WatcherMetrics},
    provider::{
        async_trait, Bucket, BucketSummary, CloudProvider, Instance, LoadBalancer,
        ProviderConnector, ProviderError, ProviderResult, PublicIp, ShapeConfig, StaticConnector,
        Volume,
    },
    UsageAggregator,
};

/// Provider with a fixed set of resources
struct FixedProvider {
    arm_ocpus: f64,
    arm_memory_gb: f64,
    boot_volume_gb: i64,
    public_ips: usize,
}

impl Default for FixedProvider {
    fn default() -> Self {
        Self {
            arm_ocpus: 1.0,
            arm_memory_gb: 6.0,
            boot_volume_gb: 50,
            public_ips: 0,
        }
    }
}

#[async_trait]
impl CloudProvider for FixedProvider {
    async fn list_running_instances(&self, _compartment_id: &str) -> ProviderResult<Vec<Instance>> {
        Ok(vec![Instance {
            display_name: Some("arm-box".to_string()),
            shape: "VM.Standard.A1.Flex".to_string(),
            lifecycle_state: Some("RUNNING".to_string()),
            shape_config: Some(ShapeConfig {
                ocpus: Some(self.arm_ocpus),
                memory_in_gbs: Some(self.arm_memory_gb),
            }),
        }])
    }

    async fn list_boot_volumes(&self, _compartment_id: &str) -> ProviderResult<Vec<Volume>> {
        Ok(vec![Volume {
            display_name: Some("arm-box (Boot Volume)".to_string()),
            size_in_gbs: Some(self.boot_volume_gb),
        }])
    }

    async fn list_block_volumes(&self, _compartment_id: &str) -> ProviderResult<Vec<Volume>> {
        Ok(Vec::new())
    }

    async fn list_public_ips(&self, _compartment_id: &str) -> ProviderResult<Vec<PublicIp>> {
        Ok(vec![PublicIp::default(); self.public_ips])
    }

    async fn get_namespace(&self) -> ProviderResult<String> {
        Ok("tenancyns".to_string())
    }

    async fn list_buckets(
        &self,
        _namespace: &str,
        _compartment_id: &str,
    ) -> ProviderResult<Vec<BucketSummary>> {
        Ok(Vec::new())
    }

    async fn get_bucket(&self, _namespace: &str, bucket_name: &str) -> ProviderResult<Bucket> {
        Ok(Bucket {
            name: bucket_name.to_string(),
            approximate_size: None,
        })
    }

    async fn list_load_balancers(&self, _compartment_id: &str) -> ProviderResult<Vec<LoadBalancer>> {
        Ok(Vec::new())
    }
}

struct BrokenKeyConnector;

#[async_trait]
impl ProviderConnector for BrokenKeyConnector {
    async fn connect(&self) -> ProviderResult<Arc<dyn CloudProvider>> {
        Err(ProviderError::InvalidKey("no RSA key found".to_string()))
    }
}

fn aggregator(connector: Arc<dyn ProviderConnector>) -> UsageAggregator {
    UsageAggregator::new(
        connector,
        "ocid1.tenancy.oc1..test",
        WatcherMetrics::new(),
        StructuredLogger::new("test-region"),
    )
}

fn app_with(provider: FixedProvider, api_key: Option<&str>) -> Router {
    let connector = Arc::new(StaticConnector::new(Arc::new(provider)));
    let state = AppState::new(
        Some(aggregator(connector)),
        api_key.map(str::to_string),
    );
    create_router(Arc::new(state))
}

fn unconfigured_app() -> Router {
    create_router(Arc::new(AppState::new(None, None)))
}

async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_returns_ok() {
    let (status, body) = get(unconfigured_app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_limits_returns_free_tier_limits() {
    let (status, body) = get(unconfigured_app(), "/limits").await;

    assert_eq!(status, StatusCode::OK);
    let limits = &body["freeTierLimits"];
    assert_eq!(limits["compute"]["arm"]["ocpus"], 4.0);
    assert_eq!(limits["compute"]["arm"]["memoryGB"], 24.0);
    assert_eq!(limits["compute"]["amd"]["maxInstances"], 2);
    assert_eq!(limits["blockStorage"]["totalGB"], 200);
    assert_eq!(limits["objectStorage"]["totalGB"], 10);
    assert_eq!(limits["bandwidth"]["egressTBPerMonth"], 10);
    assert_eq!(limits["loadBalancer"]["instances"], 1);
}

#[tokio::test]
async fn test_usage_not_configured() {
    let (status, body) = get(unconfigured_app(), "/usage").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "NOT_CONFIGURED");
    assert_eq!(body["configured"], false);
    assert_eq!(body["error"], "OCI not configured");
    assert_eq!(
        body["message"],
        "Please configure your OCI credentials in the .env file"
    );
    assert_eq!(body["maxUsagePercentage"], 0);
    assert_eq!(body["warnings"], serde_json::json!([]));
    assert!(body["freeTierLimits"].is_object());
    assert!(body.get("usage").is_none());
}

#[tokio::test]
async fn test_status_not_configured() {
    let (status, body) = get(unconfigured_app(), "/status").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "NOT_CONFIGURED");
    assert_eq!(body["message"], "OCI credentials not configured");
}

#[tokio::test]
async fn test_usage_reports_snapshot() {
    let provider = FixedProvider {
        arm_ocpus: 4.0,
        arm_memory_gb: 24.0,
        boot_volume_gb: 100,
        public_ips: 1,
    };

    let (status, body) = get(app_with(provider, None), "/usage").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CRITICAL");
    assert_eq!(body["configured"], true);
    assert_eq!(body["maxUsagePercentage"], 100);
    assert_eq!(
        body["warnings"],
        serde_json::json!(["ARM OCPUs at 100%", "ARM Memory at 100%"])
    );

    let usage = &body["usage"];
    assert_eq!(usage["compute"]["arm"]["ocpus"]["used"], 4.0);
    assert_eq!(usage["compute"]["arm"]["instances"], 1);
    assert_eq!(usage["blockStorage"]["bootVolumes"]["sizeGB"], 100);
    assert_eq!(usage["blockStorage"]["total"]["percentage"], 50);
    assert_eq!(usage["publicIPs"]["percentage"], 50);
    assert!(usage["compute"].get("error").is_none());
}

#[tokio::test]
async fn test_status_reports_ok_without_empty_fields() {
    // 1 of 4 OCPUs, 6 of 24 GB, 50 of 200 GB: everything at 25%
    let (status, body) = get(app_with(FixedProvider::default(), None), "/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["maxUsagePercentage"], 25);
    assert!(body.get("warnings").is_none());
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn test_status_reports_attention() {
    let provider = FixedProvider {
        arm_ocpus: 3.0,
        ..Default::default()
    };

    let (status, body) = get(app_with(provider, None), "/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ATTENTION");
    assert_eq!(body["maxUsagePercentage"], 75);
    assert!(body.get("warnings").is_none());
}

#[tokio::test]
async fn test_status_reports_critical_with_warnings() {
    let provider = FixedProvider {
        arm_ocpus: 3.6,
        ..Default::default()
    };

    let (status, body) = get(app_with(provider, None), "/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CRITICAL");
    assert_eq!(body["maxUsagePercentage"], 90);
    assert_eq!(body["warnings"], serde_json::json!(["ARM OCPUs at 90%"]));
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn test_provider_failure_returns_500() {
    let connector: Arc<dyn ProviderConnector> = Arc::new(BrokenKeyConnector);
    let state = AppState::new(Some(aggregator(connector)), None);
    let app = create_router(Arc::new(state));

    let (status, body) = get(app.clone(), "/usage").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "ERROR");
    assert_eq!(body["configured"], true);
    assert!(body["error"].as_str().unwrap().contains("no RSA key found"));
    assert!(body["freeTierLimits"].is_object());

    let (status, body) = get(app, "/status").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "ERROR");
    assert!(body["message"].as_str().unwrap().contains("no RSA key found"));
}

#[tokio::test]
async fn test_non_get_methods_are_rejected() {
    for uri in ["/health", "/limits", "/usage", "/status"] {
        let response = unconfigured_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{uri}");
    }
}

#[tokio::test]
async fn test_api_key_is_required_when_configured() {
    let (status, body) = get(app_with(FixedProvider::default(), Some("s3cret")), "/status").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let response = app_with(FixedProvider::default(), Some("s3cret"))
        .oneshot(
            Request::builder()
                .uri("/limits")
                .header("X-API-Key", "wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_api_key_is_accepted() {
    let response = app_with(FixedProvider::default(), Some("s3cret"))
        .oneshot(
            Request::builder()
                .uri("/status")
                .header("X-API-Key", "s3cret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_is_exempt_from_api_key() {
    let (status, body) = get(app_with(FixedProvider::default(), Some("s3cret")), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    // Take a snapshot first so the usage gauges exist
    let (status, _) = get(app_with(FixedProvider::default(), None), "/usage").await;
    assert_eq!(status, StatusCode::OK);

    let response = app_with(FixedProvider::default(), None)
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("tier_watcher_query_latency_seconds_bucket"));
    assert!(metrics_text.contains("tier_watcher_usage_percentage"));
    assert!(metrics_text.contains("tier_watcher_snapshots_total"));
}
