// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubeconfig parsing and resolution of the selected context.

use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{DroverError, Result};

use super::Credentials;

#[derive(Debug, Default, Deserialize)]
pub struct Kubeconfig {
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    #[serde(default)]
    pub users: Vec<NamedUser>,
    #[serde(rename = "current-context", default)]
    pub current_context: String,
}

#[derive(Debug, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    #[serde(default)]
    pub cluster: Cluster,
}

#[derive(Debug, Default, Deserialize)]
pub struct Cluster {
    #[serde(default)]
    pub server: String,
    /// Path to a PEM file with the cluster CA.
    #[serde(rename = "certificate-authority", default)]
    pub certificate_authority: Option<String>,
    /// Inline CA material, either literal PEM or base64-encoded PEM.
    #[serde(rename = "certificate-authority-data", default)]
    pub certificate_authority_data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NamedContext {
    pub name: String,
    #[serde(default)]
    pub context: Context,
}

#[derive(Debug, Default, Deserialize)]
pub struct Context {
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub user: String,
}

#[derive(Debug, Deserialize)]
pub struct NamedUser {
    pub name: String,
    #[serde(default)]
    pub user: User,
}

#[derive(Debug, Default, Deserialize)]
pub struct User {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(rename = "auth-provider", default)]
    pub auth_provider: Option<AuthProvider>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthProvider {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub config: AuthProviderConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthProviderConfig {
    #[serde(rename = "client-id", default)]
    pub client_id: Option<String>,
    #[serde(rename = "client-secret", default)]
    pub client_secret: Option<String>,
    #[serde(rename = "id-token", default)]
    pub id_token: Option<String>,
    #[serde(rename = "refresh-token", default)]
    pub refresh_token: Option<String>,
}

/// Read and parse a kubeconfig file and resolve its current context.
pub fn from_file(path: &Path) -> Result<Credentials> {
    let raw = fs::read_to_string(path).map_err(|source| DroverError::KubeconfigRead {
        path: path.display().to_string(),
        source,
    })?;
    let config: Kubeconfig =
        serde_yaml::from_str(&raw).map_err(|source| DroverError::KubeconfigParse {
            path: path.display().to_string(),
            source,
        })?;
    resolve_current(&config, path.parent())
}

/// Resolve the context named by `current-context` into credentials.
///
/// `base_dir` anchors relative `certificate-authority` paths, matching
/// how kubectl resolves them against the kubeconfig's own directory.
pub fn resolve_current(config: &Kubeconfig, base_dir: Option<&Path>) -> Result<Credentials> {
    let context = config
        .contexts
        .iter()
        .find(|c| c.name == config.current_context)
        .ok_or_else(|| DroverError::ContextNotFound(config.current_context.clone()))?;

    let cluster = config
        .clusters
        .iter()
        .find(|c| c.name == context.context.cluster)
        .ok_or_else(|| DroverError::ClusterNotFound(context.context.cluster.clone()))?;

    let user = config
        .users
        .iter()
        .find(|u| u.name == context.context.user)
        .ok_or_else(|| DroverError::UserNotFound(context.context.user.clone()))?;

    if cluster.cluster.server.is_empty() {
        return Err(DroverError::MissingCredential("server URL"));
    }
    let server =
        Url::parse(&cluster.cluster.server).map_err(|source| DroverError::InvalidServerUrl {
            url: cluster.cluster.server.clone(),
            source,
        })?;

    // The auth-provider id-token wins; the direct token field is only
    // consulted when no id-token is present.
    let id_token = user
        .user
        .auth_provider
        .as_ref()
        .and_then(|p| p.config.id_token.as_deref())
        .filter(|t| !t.is_empty());
    let token = id_token
        .or(user.user.token.as_deref())
        .filter(|t| !t.is_empty())
        .ok_or(DroverError::MissingCredential("bearer token"))?
        .to_string();

    let ca_bundle = load_ca(&cluster.cluster, base_dir)?;
    debug!(
        context = %context.name,
        cluster = %cluster.name,
        user = %user.name,
        has_ca = ca_bundle.is_some(),
        "Resolved kubeconfig context"
    );

    Credentials {
        server,
        namespace: context.context.namespace.clone().filter(|n| !n.is_empty()),
        token,
        ca_bundle,
    }
    .validated()
}

/// Load the cluster CA as PEM bytes from whichever form the cluster
/// entry carries. Inline data takes precedence over a file path.
fn load_ca(cluster: &Cluster, base_dir: Option<&Path>) -> Result<Option<Vec<u8>>> {
    if let Some(data) = cluster
        .certificate_authority_data
        .as_deref()
        .filter(|d| !d.is_empty())
    {
        let bytes = if data.trim_start().starts_with("-----BEGIN") {
            data.as_bytes().to_vec()
        } else {
            STANDARD
                .decode(data.trim())
                .map_err(|e| DroverError::InvalidCaCertificate(e.to_string()))?
        };
        return Ok(Some(bytes));
    }

    if let Some(path) = cluster
        .certificate_authority
        .as_deref()
        .filter(|p| !p.is_empty())
    {
        let full = match base_dir {
            Some(dir) if Path::new(path).is_relative() => dir.join(path),
            _ => PathBuf::from(path),
        };
        let bytes = fs::read(&full).map_err(|source| DroverError::KubeconfigRead {
            path: full.display().to_string(),
            source,
        })?;
        return Ok(Some(bytes));
    }

    Ok(None)
}
