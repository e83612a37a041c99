// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! In-cluster credentials from the service account mount.

use std::fs;
use std::path::Path;

use url::Url;

use crate::constants::service_account;
use crate::error::{DroverError, Result};

use super::Credentials;

/// Build credentials from the three fixed files under the mount.
/// Every file is required; a missing one is a config error naming it.
pub fn from_mount(mount: &Path) -> Result<Credentials> {
    let namespace = read_trimmed(&mount.join(service_account::NAMESPACE_FILE))?;
    let ca_bundle = read_file(&mount.join(service_account::CA_FILE))?;
    let token = read_trimmed(&mount.join(service_account::TOKEN_FILE))?;

    let server =
        Url::parse(service_account::SERVER).map_err(|source| DroverError::InvalidServerUrl {
            url: service_account::SERVER.to_string(),
            source,
        })?;

    Credentials {
        server,
        namespace: Some(namespace).filter(|n| !n.is_empty()),
        token,
        ca_bundle: Some(ca_bundle),
    }
    .validated()
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| DroverError::ServiceAccountRead {
        path: path.display().to_string(),
        source,
    })
}

fn read_trimmed(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path).map_err(|source| DroverError::ServiceAccountRead {
        path: path.display().to_string(),
        source,
    })?;
    Ok(raw.trim().to_string())
}
