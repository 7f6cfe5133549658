//! HTTP surface for bulk uploads

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::domain::aggregates::UploadResult;
use crate::mapping::SpreadsheetProductMapper;
use crate::submit::{BatchCreateResponse, ProductServiceClient};
use crate::ImportError;

#[derive(Clone)]
pub struct AppState {
    pub mapper: Arc<SpreadsheetProductMapper>,
    pub products: Option<ProductServiceClient>,
    pub default_locale: String,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "opensase-product-import"})) }))
        .route("/api/v1/products/bulk-upload", post(upload))
        .route("/api/v1/products/bulk-upload/template", get(template))
        .route("/api/v1/products/bulk-upload/submit", post(upload_and_submit))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state)
}

#[derive(Debug, Deserialize)] pub struct LocaleParams { pub locale: Option<String> }

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub upload_id: Uuid,
    pub result: UploadResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<BatchCreateResponse>,
}

#[derive(Debug, Serialize)] pub struct TemplateResponse { pub locale: String, pub headers: Vec<String> }

impl AppState {
    fn locale_for(&self, params: LocaleParams) -> String {
        params.locale.filter(|l| !l.trim().is_empty()).unwrap_or_else(|| self.default_locale.clone())
    }
}

async fn template(State(s): State<AppState>, Query(p): Query<LocaleParams>) -> Json<TemplateResponse> {
    let locale = s.mapper.config().locale(&s.locale_for(p));
    Json(TemplateResponse { locale: locale.code.clone(), headers: locale.template_headers() })
}

async fn upload(State(s): State<AppState>, Query(p): Query<LocaleParams>, body: Bytes) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let (upload_id, result) = map_upload(&s, p, body).await?;
    Ok(Json(UploadResponse { upload_id, result, submission: None }))
}

async fn upload_and_submit(State(s): State<AppState>, Query(p): Query<LocaleParams>, body: Bytes) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let client = s.products.clone().ok_or((StatusCode::SERVICE_UNAVAILABLE, "Product service is not configured".to_string()))?;
    let (upload_id, result) = map_upload(&s, p, body).await?;
    if result.valid_products().is_empty() {
        tracing::info!(%upload_id, "no valid rows, nothing submitted");
        return Ok(Json(UploadResponse { upload_id, result, submission: None }));
    }
    let reply = client.create_batch(result.valid_products()).await.map_err(|e| {
        tracing::error!(%upload_id, error = %e, "batch submission failed");
        (StatusCode::BAD_GATEWAY, e.to_string())
    })?;
    tracing::info!(%upload_id, success = reply.success_count, failed = reply.failed_count, "batch submitted");
    Ok(Json(UploadResponse { upload_id, result, submission: Some(reply) }))
}

/// Runs the mapper off the async runtime. Unreadable files are a 422.
async fn map_upload(s: &AppState, p: LocaleParams, body: Bytes) -> Result<(Uuid, UploadResult), (StatusCode, String)> {
    let locale = s.locale_for(p);
    let upload_id = Uuid::now_v7();
    let span = tracing::info_span!("bulk_upload", %upload_id, %locale, bytes = body.len());
    let mapper = s.mapper.clone();
    let result = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        mapper.parse_bytes(&body, &locale)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, ImportError::Task(e.to_string()).to_string()))?
    .map_err(|e| {
        tracing::warn!(%upload_id, error = %e, "upload rejected");
        (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    })?;
    Ok((upload_id, result))
}
