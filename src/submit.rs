//! Client for the product service's batch creation endpoint.
//!
//! Counts and messages in the reply are passed through untouched.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::domain::aggregates::ProductRow;

pub const BATCH_PATH: &str = "/api/v1/products/batch";

#[derive(Debug, Serialize)]
pub struct BatchCreateRequest<'a> {
    pub products: &'a [ProductRow],
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateResponse {
    pub success_count: u64,
    pub failed_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("Request to product service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Product service answered {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Clone, Debug)]
pub struct ProductServiceClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ProductServiceClient {
    pub fn new(base_url: &str) -> Result<Self, SubmitError> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self { http, endpoint: format!("{}{}", base_url.trim_end_matches('/'), BATCH_PATH) }
    }

    pub fn endpoint(&self) -> &str { &self.endpoint }

    pub async fn create_batch(&self, products: &[ProductRow]) -> Result<BatchCreateResponse, SubmitError> {
        let response = self.http.post(&self.endpoint).json(&BatchCreateRequest { products }).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Status { status: status.as_u16(), body });
        }
        Ok(response.json::<BatchCreateResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}/", addr)
    }

    fn products() -> Vec<ProductRow> {
        serde_json::from_value(json!([{"name": "T恤", "price": 99.5}, {"name": "裤子", "price": 120}])).unwrap()
    }

    #[test]
    fn test_endpoint_and_request_shape() {
        let client = ProductServiceClient::new("http://products:8080/").unwrap();
        assert_eq!(client.endpoint(), "http://products:8080/api/v1/products/batch");
        let products = products();
        let body = serde_json::to_value(BatchCreateRequest { products: &products }).unwrap();
        assert_eq!(body["products"][1], json!({"name": "裤子", "price": 120}));
    }

    #[test]
    fn test_reply_without_errors() {
        let reply: BatchCreateResponse = serde_json::from_str(r#"{"successCount": 2, "failedCount": 0}"#).unwrap();
        assert_eq!(reply, BatchCreateResponse { success_count: 2, failed_count: 0, errors: None });
    }

    #[tokio::test]
    async fn test_create_batch_passes_reply_through() {
        let app = Router::new().route(BATCH_PATH, post(|Json(body): Json<Value>| async move {
            let sent = body["products"].as_array().map(|p| p.len()).unwrap_or(0);
            Json(json!({"successCount": sent - 1, "failedCount": 1, "errors": ["裤子: duplicate sku"]}))
        }));
        let client = ProductServiceClient::new(&serve(app).await).unwrap();
        let reply = client.create_batch(&products()).await.unwrap();
        assert_eq!(reply.success_count, 1);
        assert_eq!(reply.failed_count, 1);
        assert_eq!(reply.errors, Some(vec!["裤子: duplicate sku".to_string()]));
    }

    #[tokio::test]
    async fn test_create_batch_reports_status() {
        let app = Router::new().route(BATCH_PATH, post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }));
        let client = ProductServiceClient::new(&serve(app).await).unwrap();
        match client.create_batch(&products()).await {
            Err(SubmitError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
