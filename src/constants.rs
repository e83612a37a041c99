// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Knative serving API surface targeted by the app controller.
pub mod serving {
    pub const API_GROUP_VERSION: &str = "serving.knative.dev/v1";
    pub const KIND: &str = "Service";
    pub const RESOURCE: &str = "services";
}

/// Fixed layout of the in-cluster service account mount.
pub mod service_account {
    /// Directory where the orchestrator injects workload identity.
    pub const MOUNT_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount";
    pub const NAMESPACE_FILE: &str = "namespace";
    pub const CA_FILE: &str = "ca.crt";
    pub const TOKEN_FILE: &str = "token";
    /// Server address when running inside the cluster.
    pub const SERVER: &str = "https://kubernetes.default.svc:443";
}

/// Environment variable naming an explicit kubeconfig path.
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// Namespace used when neither credential source provides one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Polling configuration
pub mod poll {
    use std::time::Duration;

    /// Interval between GETs while waiting for a created app's URL.
    pub const URL_INTERVAL: Duration = Duration::from_millis(500);
    /// Interval between status polls while waiting for readiness.
    pub const READY_INTERVAL: Duration = Duration::from_secs(1);
}
