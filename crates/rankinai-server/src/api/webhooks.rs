use axum::{extract::State, Extension, Json};
use rankinai_scanner::lifecycle;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct UninstallPayload {
    #[serde(alias = "myshopify_domain")]
    pub domain: String,
}

#[derive(Debug, Serialize)]
pub(super) struct UninstallResult {
    domain: String,
    reset: bool,
}

/// Unknown domains are acknowledged with `reset: false` so the sender does
/// not retry.
pub(super) async fn app_uninstalled(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(payload): Json<UninstallPayload>,
) -> Result<Json<ApiResponse<UninstallResult>>, ApiError> {
    let domain = payload.domain.trim().to_ascii_lowercase();
    if domain.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "domain must not be empty",
        ));
    }

    let engine = &state.engine;
    let shop = lifecycle::reset_shop_to_trial(engine.store().as_ref(), engine.pricing(), &domain)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, domain = %domain, "uninstall reset failed");
            ApiError::new(req_id.0.clone(), "internal_error", "persistence failure")
        })?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        UninstallResult {
            domain,
            reset: shop.is_some(),
        },
    )))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use rankinai_core::Plan;
    use rankinai_scanner::Providers;
    use serde_json::json;

    use crate::api::test_support::{app_with, seeded_store, send};

    #[tokio::test]
    async fn uninstall_resets_shop_to_trial() {
        let store = seeded_store(40);
        let (status, json) = send(
            app_with(&store, Providers::new()),
            "POST",
            "/api/v1/webhooks/app-uninstalled",
            Some(json!({ "myshopify_domain": "acme.myshopify.com" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["reset"], true);
        let shop = store.shop(1).expect("shop");
        assert_eq!(shop.plan, Plan::Trial);
        assert_eq!(shop.credits, 0);
        assert!(!shop.installed);
    }

    #[tokio::test]
    async fn unknown_domain_is_acknowledged() {
        let store = seeded_store(40);
        let (status, json) = send(
            app_with(&store, Providers::new()),
            "POST",
            "/api/v1/webhooks/app-uninstalled",
            Some(json!({ "domain": "other.myshopify.com" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["reset"], false);
        assert_eq!(store.shop(1).expect("shop").credits, 40);
    }
}
