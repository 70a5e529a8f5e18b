//! Pod Mutation Webhook
//!
//! Handles AdmissionReview requests for Pods, answering with the agent
//! injection patch. The webhook never denies a pod: anything it cannot patch
//! is allowed through unchanged.

use std::sync::Arc;

use axum::{extract::State, Json};
use k8s_openapi::api::core::v1::PodSpec;
use kube::core::{
    admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, SerializePatchError},
    DynamicObject,
};
use tracing::{debug, error, info, warn};

use super::WebhookState;
use crate::{create_patch, AgentConfig};

/// Kind of the objects this webhook patches
const POD_KIND: &str = "Pod";

/// Error type for webhook operations
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The admission review did not carry a request
    #[error("invalid admission review: {0}")]
    InvalidReview(String),

    /// The admitted object's spec is not a valid PodSpec
    #[error("invalid pod spec: {0}")]
    InvalidPodSpec(#[from] serde_json::Error),

    /// The generated patch could not be embedded in the response
    #[error("failed to serialize patch: {0}")]
    SerializePatch(#[from] SerializePatchError),
}

/// Handle mutating admission review for Pods
pub async fn mutate_handler(
    State(state): State<Arc<WebhookState>>,
    Json(body): Json<AdmissionReview<DynamicObject>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let req: AdmissionRequest<DynamicObject> = match body.try_into() {
        Ok(req) => req,
        Err(e) => {
            let err = WebhookError::InvalidReview(e.to_string());
            error!(error = %err, "Failed to parse admission request");
            return Json(AdmissionResponse::invalid(err.to_string()).into_review());
        }
    };

    Json(mutate_pod(&state.config, &req).into_review())
}

/// Build the admission response for a single request
///
/// This:
/// 1. Extracts the pod spec from the admitted object
/// 2. Generates the agent injection patch
/// 3. Returns the response carrying the patch
pub fn mutate_pod(
    config: &AgentConfig,
    request: &AdmissionRequest<DynamicObject>,
) -> AdmissionResponse {
    let uid = &request.uid;

    let spec = match pod_spec(request) {
        Ok(Some(spec)) => spec,
        Ok(None) => {
            debug!(
                uid = %uid,
                kind = %request.kind.kind,
                "No pod spec in request, allowing unchanged"
            );
            return AdmissionResponse::from(request);
        }
        Err(e) => {
            warn!(uid = %uid, error = %e, "Failed to decode pod spec, allowing unchanged");
            return AdmissionResponse::from(request);
        }
    };

    let patch_ops = create_patch(config, &spec);

    info!(
        uid = %uid,
        namespace = ?request.namespace,
        pod = ?pod_name(request),
        containers = spec.containers.len(),
        patch_ops = patch_ops.len(),
        "Injecting APM agent"
    );

    match AdmissionResponse::from(request).with_patch(json_patch::Patch(patch_ops)) {
        Ok(response) => response,
        Err(e) => {
            let err = WebhookError::from(e);
            error!(uid = %uid, error = %err, "Failed to attach patch, allowing unchanged");
            AdmissionResponse::from(request)
        }
    }
}

/// The admitted object's spec, if the request is for a Pod that has one
fn pod_spec(request: &AdmissionRequest<DynamicObject>) -> Result<Option<PodSpec>, WebhookError> {
    if request.kind.kind != POD_KIND {
        return Ok(None);
    }
    let Some(spec) = request.object.as_ref().and_then(|obj| obj.data.get("spec")) else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_value(spec.clone())?))
}

/// Pod name, falling back to `generateName` for controller-created pods
fn pod_name(request: &AdmissionRequest<DynamicObject>) -> Option<&str> {
    let meta = &request.object.as_ref()?.metadata;
    meta.name.as_deref().or(meta.generate_name.as_deref())
}
