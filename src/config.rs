// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 300;

/// Deployment configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the app to deploy
    pub app_name: String,
    /// Container image to run
    pub app_image: String,
    /// Upper bound for each wait operation (URL assignment, readiness)
    pub wait_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app_name =
            env::var("DROVER_APP_NAME").context("DROVER_APP_NAME environment variable not set")?;
        let app_image = env::var("DROVER_APP_IMAGE")
            .context("DROVER_APP_IMAGE environment variable not set")?;
        let wait_timeout_secs: u64 = env::var("DROVER_WAIT_TIMEOUT_SECS")
            .unwrap_or_default()
            .parse()
            .unwrap_or(DEFAULT_WAIT_TIMEOUT_SECS);

        Ok(Config {
            app_name,
            app_image,
            wait_timeout: Duration::from_secs(wait_timeout_secs),
        })
    }
}
