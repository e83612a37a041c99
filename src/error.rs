// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DroverError {
    #[error("no credential source found: KUBECONFIG is unset, ~/.kube/config does not exist and there is no service account mount")]
    NoCredentialSource,

    #[error("failed to read kubeconfig {path}: {source}")]
    KubeconfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse kubeconfig {path}: {source}")]
    KubeconfigParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("current context '{0}' not found in kubeconfig")]
    ContextNotFound(String),

    #[error("cluster '{0}' not found in kubeconfig")]
    ClusterNotFound(String),

    #[error("user '{0}' not found in kubeconfig")]
    UserNotFound(String),

    #[error("credentials are missing {0}")]
    MissingCredential(&'static str),

    #[error("failed to read service account file {path}: {source}")]
    ServiceAccountRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid certificate authority data: {0}")]
    InvalidCaCertificate(String),

    #[error("invalid server URL '{url}': {source}")]
    InvalidServerUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse API response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout { waited: Duration, what: String },
}

impl DroverError {
    /// Whether this error came from credential resolution. These are
    /// fatal at startup and never produced by API operations.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            DroverError::NoCredentialSource
                | DroverError::KubeconfigRead { .. }
                | DroverError::KubeconfigParse { .. }
                | DroverError::ContextNotFound(_)
                | DroverError::ClusterNotFound(_)
                | DroverError::UserNotFound(_)
                | DroverError::MissingCredential(_)
                | DroverError::ServiceAccountRead { .. }
                | DroverError::InvalidCaCertificate(_)
                | DroverError::InvalidServerUrl { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DroverError>;
