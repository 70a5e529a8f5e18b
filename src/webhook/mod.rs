//! Mutating Admission Webhook for APM agent injection
//!
//! The API server sends an AdmissionReview for every Pod create. The webhook
//! answers with a JSON patch that injects the agent, or allows the pod
//! unchanged when there is nothing it can patch.

pub mod pod;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AgentConfig;

/// Shared state for webhook handlers
#[derive(Clone, Debug)]
pub struct WebhookState {
    /// Agent configuration applied to every admitted pod
    pub config: Arc<AgentConfig>,
}

impl WebhookState {
    /// Create a new webhook state with the given agent configuration
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Create the webhook router
///
/// - POST /mutate - Inject the agent into admitted Pods
/// - GET /healthz - Liveness check
pub fn webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/mutate", post(pod::mutate_handler))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn router() -> Router {
        let config = AgentConfig::new().with_env("LOG_LEVEL", "debug");
        webhook_router(Arc::new(WebhookState::new(config)))
    }

    async fn post_review(review: Value) -> (StatusCode, Value) {
        let response = router()
            .oneshot(
                Request::post("/mutate")
                    .header("content-type", "application/json")
                    .body(Body::from(review.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn healthz_returns_ok() {
        let response = router()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"ok");
    }

    /// Story: The API server posts a Pod review and gets a JSON patch back
    #[tokio::test]
    async fn story_pod_review_returns_json_patch() {
        let review = json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
                "kind": {"group": "", "version": "v1", "kind": "Pod"},
                "resource": {"group": "", "version": "v1", "resource": "pods"},
                "namespace": "shop",
                "operation": "CREATE",
                "userInfo": {"username": "system:serviceaccount:kube-system:replicaset-controller"},
                "object": {
                    "apiVersion": "v1",
                    "kind": "Pod",
                    "metadata": {"name": "checkout-7d9f", "namespace": "shop"},
                    "spec": {"containers": [{"name": "app", "image": "checkout:2.1"}]}
                },
                "dryRun": false
            }
        });

        let (status, body) = post_review(review).await;
        assert_eq!(status, StatusCode::OK);

        let response = &body["response"];
        assert_eq!(response["uid"], "705ab4f5-6393-11e8-b7cc-42010a800002");
        assert_eq!(response["allowed"], true);
        assert_eq!(response["patchType"], "JSONPatch");
        assert!(!response["patch"].is_null());
    }

    /// Story: A malformed review is answered, not dropped
    #[tokio::test]
    async fn story_review_without_request_is_rejected() {
        let review = json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview"
        });

        let (status, body) = post_review(review).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"]["allowed"], false);
    }
}
