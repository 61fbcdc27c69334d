use axum::{
    extract::{Path, State},
    Extension, Json,
};
use rankinai_core::Optimization;

use crate::middleware::RequestId;

use super::{map_scan_error, ApiError, ApiResponse, AppState};

pub(super) async fn generate_recommendations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<i64>,
) -> Result<Json<ApiResponse<Optimization>>, ApiError> {
    let optimization = state
        .engine
        .generate_recommendations(product_id)
        .await
        .map_err(|e| map_scan_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, optimization)))
}

pub(super) async fn apply_optimization(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(optimization_id): Path<i64>,
) -> Result<Json<ApiResponse<Optimization>>, ApiError> {
    let optimization = state
        .engine
        .apply_optimization(optimization_id)
        .await
        .map_err(|e| map_scan_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, optimization)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::api::test_support::{app_with, chatgpt_only, seeded_store, send};

    #[tokio::test]
    async fn unparseable_reply_falls_back_and_refunds() {
        let store = seeded_store(5);
        let (status, json) = send(
            app_with(&store, chatgpt_only()),
            "POST",
            "/api/v1/products/2/recommendations",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["source"], "fallback");
        assert_eq!(json["data"]["applied"], false);
        assert_eq!(store.shop(1).expect("shop").credits, 5);
    }

    #[tokio::test]
    async fn recommendations_need_a_credit() {
        let store = seeded_store(0);
        let (status, json) = send(
            app_with(&store, chatgpt_only()),
            "POST",
            "/api/v1/products/2/recommendations",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(json["error"]["code"], "insufficient_credits");
    }

    #[tokio::test]
    async fn applying_twice_conflicts() {
        let store = seeded_store(5);
        let app = app_with(&store, chatgpt_only());
        let (_, created) = send(
            app.clone(),
            "POST",
            "/api/v1/products/2/recommendations",
            None,
        )
        .await;
        let id = created["data"]["id"].as_i64().expect("optimization id");
        let uri = format!("/api/v1/optimizations/{id}/apply");

        let (first, json) = send(app.clone(), "POST", &uri, None).await;
        assert_eq!(first, StatusCode::OK);
        assert_eq!(json["data"]["applied"], true);

        let (second, json) = send(app, "POST", &uri, None).await;
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(json["error"]["code"], "conflict");
    }

    #[tokio::test]
    async fn unknown_optimization_is_not_found() {
        let store = seeded_store(5);
        let (status, _) = send(
            app_with(&store, chatgpt_only()),
            "POST",
            "/api/v1/optimizations/404/apply",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
