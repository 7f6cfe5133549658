//! OpenSASE Product Import - spreadsheet bulk upload service

use anyhow::Result;
use opensase_product_import::{api, Config, ProductServiceClient, SpreadsheetProductMapper};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Config::from_env()?;
    let mapping = config.load_mapping()?;
    tracing::info!(locales = ?mapping.codes(), source = ?config.field_mapping_path, "field mappings loaded");

    let products = config.product_service_url.as_deref().map(ProductServiceClient::new).transpose()?;
    if products.is_none() {
        tracing::warn!("PRODUCT_SERVICE_URL not set, submission endpoint disabled");
    }
    let state = api::AppState { mapper: Arc::new(SpreadsheetProductMapper::new(mapping)), products, default_locale: config.default_locale.clone() };
    let app = api::router(state, config.max_upload_bytes as usize);

    tracing::info!("🚀 OpenSASE Product Import listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}
