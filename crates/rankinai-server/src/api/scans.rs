use axum::{
    extract::{Path, State},
    Extension, Json,
};
use rankinai_core::Platform;
use rankinai_scanner::{CompleteScanOutcome, ScanOutcome};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_scan_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ScanRequest {
    pub platform: String,
}

pub(super) async fn scan_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<i64>,
    Json(body): Json<ScanRequest>,
) -> Result<Json<ApiResponse<ScanOutcome>>, ApiError> {
    let platform: Platform = body.platform.parse().map_err(|_| {
        ApiError::new(
            req_id.0.clone(),
            "validation_error",
            format!(
                "unknown platform '{}'; expected CHATGPT or GEMINI",
                body.platform
            ),
        )
    })?;

    let outcome = state
        .engine
        .run_scan(product_id, platform)
        .await
        .map_err(|e| map_scan_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, outcome)))
}

pub(super) async fn scan_product_complete(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<i64>,
) -> Result<Json<ApiResponse<CompleteScanOutcome>>, ApiError> {
    let outcome = state
        .engine
        .run_complete_scan(product_id)
        .await
        .map_err(|e| map_scan_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, outcome)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use rankinai_scanner::Providers;
    use serde_json::json;

    use crate::api::test_support::{app_with, chatgpt_only, seeded_store, send};

    #[tokio::test]
    async fn scan_returns_cited_outcome_and_charges_one_credit() {
        let store = seeded_store(5);
        let app = app_with(&store, chatgpt_only());

        let (status, json) = send(
            app,
            "POST",
            "/api/v1/products/2/scans",
            Some(json!({ "platform": "CHATGPT" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["scan"]["is_cited"], true);
        assert_eq!(json["data"]["credits_remaining"], 4);
        assert!(json["meta"]["request_id"].is_string());
        assert_eq!(store.shop(1).expect("shop").credits, 4);
    }

    #[tokio::test]
    async fn unknown_platform_is_a_validation_error() {
        let store = seeded_store(5);
        let (status, json) = send(
            app_with(&store, chatgpt_only()),
            "POST",
            "/api/v1/products/2/scans",
            Some(json!({ "platform": "claude" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
        assert_eq!(store.shop(1).expect("shop").credits, 5);
    }

    #[tokio::test]
    async fn empty_balance_is_payment_required() {
        let store = seeded_store(0);
        let (status, json) = send(
            app_with(&store, chatgpt_only()),
            "POST",
            "/api/v1/products/2/scans",
            Some(json!({ "platform": "CHATGPT" })),
        )
        .await;

        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(json["error"]["code"], "insufficient_credits");
    }

    #[tokio::test]
    async fn unconfigured_platform_is_service_unavailable_and_refunded() {
        let store = seeded_store(5);
        let (status, json) = send(
            app_with(&store, Providers::new()),
            "POST",
            "/api/v1/products/2/scans",
            Some(json!({ "platform": "GEMINI" })),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"]["code"], "provider_unavailable");
        assert_eq!(store.shop(1).expect("shop").credits, 5);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let store = seeded_store(5);
        let (status, _) = send(
            app_with(&store, chatgpt_only()),
            "POST",
            "/api/v1/products/999/scans",
            Some(json!({ "platform": "CHATGPT" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn complete_scan_reports_each_platform() {
        let store = seeded_store(10);
        let (status, json) = send(
            app_with(&store, chatgpt_only()),
            "POST",
            "/api/v1/products/2/scans/complete",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["chatgpt"]["status"], "completed");
        assert_eq!(json["data"]["gemini"]["status"], "failed");
        assert_eq!(json["data"]["gemini"]["code"], "provider_unavailable");
        assert!(json["data"]["recommendations"].is_object());
    }
}
