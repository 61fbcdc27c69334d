use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use rankinai_core::AnalyticsWindow;
use rankinai_scanner::{ProductStats, ShopAnalytics};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_scan_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct AnalyticsQuery {
    pub window: Option<String>,
}

pub(super) async fn product_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<i64>,
) -> Result<Json<ApiResponse<ProductStats>>, ApiError> {
    let stats = state
        .engine
        .product_stats(product_id)
        .await
        .map_err(|e| map_scan_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, stats)))
}

pub(super) async fn shop_analytics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(shop_id): Path<i64>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<ShopAnalytics>>, ApiError> {
    let window = match query.window.as_deref() {
        None => AnalyticsWindow::default(),
        Some(raw) => raw.parse().map_err(|_| {
            ApiError::new(
                req_id.0.clone(),
                "validation_error",
                format!("unknown window '{raw}'; expected 7d, 30d or all"),
            )
        })?,
    };

    let analytics = state
        .engine
        .shop_analytics(shop_id, window)
        .await
        .map_err(|e| map_scan_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(req_id.0, analytics)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::test_support::{app_with, chatgpt_only, seeded_store, send};

    #[tokio::test]
    async fn stats_reflect_a_fresh_scan() {
        let store = seeded_store(5);
        let app = app_with(&store, chatgpt_only());
        send(
            app.clone(),
            "POST",
            "/api/v1/products/2/scans",
            Some(json!({ "platform": "CHATGPT" })),
        )
        .await;

        let (status, json) = send(app, "GET", "/api/v1/products/2/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["total_scans"], 1);
        assert_eq!(json["data"]["citation_rate"], 100.0);
    }

    #[tokio::test]
    async fn analytics_defaults_to_thirty_days() {
        let store = seeded_store(5);
        let (status, json) = send(
            app_with(&store, chatgpt_only()),
            "GET",
            "/api/v1/shops/1/analytics",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["window"], "30d");
        assert_eq!(json["data"]["product_count"], 1);
    }

    #[tokio::test]
    async fn invalid_window_is_rejected() {
        let store = seeded_store(5);
        let (status, json) = send(
            app_with(&store, chatgpt_only()),
            "GET",
            "/api/v1/shops/1/analytics?window=90d",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn unknown_shop_is_not_found() {
        let store = seeded_store(5);
        let (status, _) = send(
            app_with(&store, chatgpt_only()),
            "GET",
            "/api/v1/shops/77/analytics?window=all",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
