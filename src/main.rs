// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use tracing::info;

use drover::api::ApiClient;
use drover::config::Config;
use drover::controllers::AppController;
use drover::credentials::Credentials;
use drover::types::app::AppManifest;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting drover");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: app={} image={}",
        config.app_name, config.app_image
    );

    // Resolve cluster credentials once; everything below borrows them.
    let credentials = Credentials::resolve()?;
    info!(
        "Resolved credentials for {} (namespace {})",
        credentials.server,
        credentials.namespace()
    );

    let client = ApiClient::new(credentials)?;
    let controller = AppController::new(client);

    let manifest = AppManifest::minimal(&config.app_name, &config.app_image);
    let url = controller.create(&manifest, config.wait_timeout).await?;
    info!("App created, serving at {}", url);

    controller
        .wait_ready(&config.app_name, config.wait_timeout)
        .await?;
    info!("App is ready");

    Ok(())
}
