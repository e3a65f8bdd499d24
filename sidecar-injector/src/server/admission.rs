//! The `/mutate` endpoint of the admission webhook.

use axum::{Json, Router, extract::State, routing::post};
use kube::core::{
    DynamicObject,
    admission::{AdmissionRequest, AdmissionResponse, AdmissionReview},
};
use sidecar_injector_engine::{Decision, Injector};

pub fn router(injector: Injector) -> Router {
    Router::new().route("/mutate", post(mutate)).with_state(injector)
}

async fn mutate(
    State(injector): State<Injector>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> Json<AdmissionReview<DynamicObject>> {
    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(request) => request,
        Err(err) => {
            tracing::error!("Failed to convert admission review: {err}");
            return Json(AdmissionResponse::invalid(err.to_string()).into_review());
        }
    };

    Json(admit(&injector, &request).into_review())
}

fn admit(injector: &Injector, request: &AdmissionRequest<DynamicObject>) -> AdmissionResponse {
    let response = AdmissionResponse::from(request);
    let Some(object) = request.object.as_ref() else {
        return response;
    };

    let original = match serde_json::to_value(object) {
        Ok(original) => original,
        Err(err) => return response.deny(format!("Failed to encode object, error: {err}")),
    };

    match injector.decide_value(original) {
        Decision::Allow { reason } => {
            tracing::debug!(uid = %request.uid, "Allow without patch, {reason}");
            response
        }
        Decision::Patch { patch } => response.with_patch(patch).unwrap_or_else(|err| {
            tracing::error!(uid = %request.uid, "Failed to serialize patch: {err}");
            AdmissionResponse::from(request).deny(err.to_string())
        }),
        Decision::Reject { status, message } => {
            let mut denied = response.deny(message);
            denied.result.code = status;
            denied
        }
    }
}
