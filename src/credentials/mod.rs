// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster credential discovery and parsing.
//!
//! Credentials come from exactly one of two sources: a kubeconfig file
//! (explicit `KUBECONFIG` path, or `~/.kube/config` when it exists) or
//! the in-cluster service account mount. A set-but-unusable
//! `KUBECONFIG` is fatal; there is no fallthrough to the next source.

pub mod incluster;
pub mod kubeconfig;

use std::path::{Path, PathBuf};

use tracing::info;
use url::Url;

use crate::constants::{service_account, DEFAULT_NAMESPACE, KUBECONFIG_ENV};
use crate::error::{DroverError, Result};

/// Immutable connection material for the control-plane API server.
///
/// Built once by [`Credentials::resolve`] and never mutated afterwards,
/// so it is safe to share across tasks.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub server: Url,
    /// Namespace from the credential source; callers fall back to
    /// "default" via [`Credentials::namespace`].
    pub namespace: Option<String>,
    pub token: String,
    /// PEM certificate bundle. When set, the transport trusts only
    /// this bundle and never the system roots.
    pub ca_bundle: Option<Vec<u8>>,
}

impl Credentials {
    /// Discover and parse credentials from the first available source.
    pub fn resolve() -> Result<Self> {
        if let Some(path) = std::env::var_os(KUBECONFIG_ENV).filter(|v| !v.is_empty()) {
            let path = PathBuf::from(path);
            info!("Resolving credentials from kubeconfig {}", path.display());
            return kubeconfig::from_file(&path);
        }

        if let Some(path) = default_kubeconfig_path() {
            info!("Resolving credentials from kubeconfig {}", path.display());
            return kubeconfig::from_file(&path);
        }

        let mount = Path::new(service_account::MOUNT_PATH);
        if mount.is_dir() {
            info!("Resolving in-cluster credentials from {}", mount.display());
            return incluster::from_mount(mount);
        }

        Err(DroverError::NoCredentialSource)
    }

    /// Re-run source discovery, producing a fresh value. There is no
    /// implicit refresh; callers decide when a reload happens.
    pub fn reload() -> Result<Self> {
        Self::resolve()
    }

    /// Namespace to address resources in, defaulting to "default".
    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }

    /// Reject credentials that cannot back an authenticated call.
    pub(crate) fn validated(self) -> Result<Self> {
        if self.token.is_empty() {
            return Err(DroverError::MissingCredential("bearer token"));
        }
        Ok(self)
    }
}

/// `~/.kube/config`, when it exists.
fn default_kubeconfig_path() -> Option<PathBuf> {
    let path = dirs::home_dir()?.join(".kube").join("config");
    path.is_file().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_defaults_when_absent() {
        let credentials = Credentials {
            server: Url::parse("https://example.com").unwrap(),
            namespace: None,
            token: "tok".to_string(),
            ca_bundle: None,
        };
        assert_eq!(credentials.namespace(), "default");
    }

    #[test]
    fn test_namespace_from_source_wins() {
        let credentials = Credentials {
            server: Url::parse("https://example.com").unwrap(),
            namespace: Some("workloads".to_string()),
            token: "tok".to_string(),
            ca_bundle: None,
        };
        assert_eq!(credentials.namespace(), "workloads");
    }

    #[test]
    fn test_validated_rejects_empty_token() {
        let credentials = Credentials {
            server: Url::parse("https://example.com").unwrap(),
            namespace: None,
            token: String::new(),
            ca_bundle: None,
        };
        assert!(matches!(
            credentials.validated(),
            Err(DroverError::MissingCredential("bearer token"))
        ));
    }

    #[test]
    fn test_resolve_fails_for_missing_override_path() {
        // Serialized through the env var; no other test touches it.
        std::env::set_var(KUBECONFIG_ENV, "/nonexistent/kubeconfig");
        let result = Credentials::resolve();
        std::env::remove_var(KUBECONFIG_ENV);

        match result {
            Err(DroverError::KubeconfigRead { path, .. }) => {
                assert_eq!(path, "/nonexistent/kubeconfig");
            }
            other => panic!("expected KubeconfigRead error, got {:?}", other.map(|_| ())),
        }
    }
}
