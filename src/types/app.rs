// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::serving;
use crate::error::Result;

/// A deployed app (Knative Service) as returned by the API server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct App {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: Value,
    #[serde(default)]
    pub status: Option<AppStatus>,
}

impl App {
    /// Whether the Ready condition reports True.
    pub fn is_ready(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.is_ready())
    }

    /// The externally routable URL, once the server has assigned one.
    pub fn url(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.url.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub resource_version: Option<String>,
    #[serde(default)]
    pub creation_timestamp: Option<String>,
    #[serde(default)]
    pub deletion_timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub latest_created_revision_name: Option<String>,
    #[serde(default)]
    pub latest_ready_revision_name: Option<String>,
    #[serde(default)]
    pub observed_generation: Option<i64>,
}

impl AppStatus {
    /// Missing or empty conditions read as not ready.
    pub fn is_ready(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.condition_type == "Ready" && c.status == "True")
    }
}

/// In-cluster address of the app.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    /// "True", "False" or "Unknown"
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One entry from a watch stream.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchEvent {
    #[serde(rename = "type")]
    pub event_type: WatchEventType,
    #[serde(default)]
    pub object: Value,
}

impl WatchEvent {
    /// Decode the carried object. ERROR events carry a Status object
    /// instead of an app; decoding one yields empty fields.
    pub fn app(&self) -> Result<App> {
        Ok(serde_json::from_value(self.object.clone())?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchEventType {
    Added,
    Modified,
    Deleted,
    Error,
}

/// Builder for the creation payload POSTed to the services collection.
/// The minimal form embeds only a name and an image; the optional
/// knobs cover the autoscaling and runtime settings the server
/// understands on the revision template.
#[derive(Debug, Clone)]
pub struct AppManifest {
    name: String,
    image: String,
    min_scale: Option<u32>,
    max_scale: Option<u32>,
    env: Vec<(String, String)>,
    cpu: Option<String>,
    memory: Option<String>,
    container_concurrency: Option<u32>,
    timeout_seconds: Option<u32>,
}

impl AppManifest {
    pub fn minimal(name: &str, image: &str) -> Self {
        Self {
            name: name.to_string(),
            image: image.to_string(),
            min_scale: None,
            max_scale: None,
            env: Vec::new(),
            cpu: None,
            memory: None,
            container_concurrency: None,
            timeout_seconds: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min_scale(mut self, replicas: u32) -> Self {
        self.min_scale = Some(replicas);
        self
    }

    pub fn max_scale(mut self, replicas: u32) -> Self {
        self.max_scale = Some(replicas);
        self
    }

    pub fn env(mut self, name: &str, value: &str) -> Self {
        self.env.push((name.to_string(), value.to_string()));
        self
    }

    /// CPU and memory applied as both request and limit.
    pub fn resources(mut self, cpu: &str, memory: &str) -> Self {
        self.cpu = Some(cpu.to_string());
        self.memory = Some(memory.to_string());
        self
    }

    pub fn container_concurrency(mut self, concurrency: u32) -> Self {
        self.container_concurrency = Some(concurrency);
        self
    }

    pub fn timeout_seconds(mut self, seconds: u32) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Serialize to the wire shape the collection endpoint accepts.
    pub fn to_json(&self) -> Value {
        let mut container = json!({ "image": self.image });
        if !self.env.is_empty() {
            container["env"] = self
                .env
                .iter()
                .map(|(name, value)| json!({ "name": name, "value": value }))
                .collect();
        }
        if let (Some(cpu), Some(memory)) = (&self.cpu, &self.memory) {
            let quantities = json!({ "cpu": cpu, "memory": memory });
            container["resources"] = json!({
                "requests": quantities.clone(),
                "limits": quantities,
            });
        }

        let mut template_spec = json!({ "containers": [container] });
        if let Some(concurrency) = self.container_concurrency {
            template_spec["containerConcurrency"] = json!(concurrency);
        }
        if let Some(seconds) = self.timeout_seconds {
            template_spec["timeoutSeconds"] = json!(seconds);
        }

        let mut template = json!({ "spec": template_spec });
        // Autoscaling bounds ride on template annotations, as strings.
        let mut annotations = serde_json::Map::new();
        if let Some(replicas) = self.min_scale {
            annotations.insert(
                "autoscaling.knative.dev/minScale".to_string(),
                json!(replicas.to_string()),
            );
        }
        if let Some(replicas) = self.max_scale {
            annotations.insert(
                "autoscaling.knative.dev/maxScale".to_string(),
                json!(replicas.to_string()),
            );
        }
        if !annotations.is_empty() {
            template["metadata"] = json!({ "annotations": annotations });
        }

        json!({
            "apiVersion": serving::API_GROUP_VERSION,
            "kind": serving::KIND,
            "metadata": { "name": self.name },
            "spec": { "template": template },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_status(conditions: Vec<Condition>) -> AppStatus {
        AppStatus {
            conditions,
            ..Default::default()
        }
    }

    fn make_condition(condition_type: &str, status: &str) -> Condition {
        Condition {
            condition_type: condition_type.to_string(),
            status: status.to_string(),
            last_transition_time: None,
            reason: None,
            message: None,
        }
    }

    #[test]
    fn test_is_ready_with_ready_condition() {
        let status = make_status(vec![
            make_condition("ConfigurationsReady", "True"),
            make_condition("Ready", "True"),
            make_condition("RoutesReady", "True"),
        ]);
        assert!(status.is_ready());
    }

    #[test]
    fn test_is_ready_with_not_ready_condition() {
        let status = make_status(vec![make_condition("Ready", "False")]);
        assert!(!status.is_ready());
    }

    #[test]
    fn test_is_ready_with_unknown_condition() {
        let status = make_status(vec![make_condition("Ready", "Unknown")]);
        assert!(!status.is_ready());
    }

    #[test]
    fn test_is_ready_with_no_conditions() {
        assert!(!make_status(Vec::new()).is_ready());
    }

    #[test]
    fn test_app_without_status_is_not_ready() {
        let app: App = serde_json::from_str(r#"{"metadata":{"name":"a"}}"#).unwrap();
        assert!(!app.is_ready());
        assert!(app.url().is_none());
    }

    #[test]
    fn test_status_deserializes_from_server_shape() {
        let app: App = serde_json::from_str(
            r#"{
                "apiVersion": "serving.knative.dev/v1",
                "kind": "Service",
                "metadata": { "name": "echo", "namespace": "prod" },
                "status": {
                    "address": { "url": "http://echo.prod.svc.cluster.local" },
                    "conditions": [
                        { "lastTransitionTime": "2021-04-08T00:52:26Z", "status": "True", "type": "Ready" }
                    ],
                    "latestReadyRevisionName": "echo-00001",
                    "observedGeneration": 1,
                    "url": "http://echo.example.com"
                }
            }"#,
        )
        .unwrap();

        assert!(app.is_ready());
        assert_eq!(app.url(), Some("http://echo.example.com"));
        let status = app.status.unwrap();
        assert_eq!(
            status.address.unwrap().url.as_deref(),
            Some("http://echo.prod.svc.cluster.local")
        );
        assert_eq!(status.latest_ready_revision_name.as_deref(), Some("echo-00001"));
    }

    #[test]
    fn test_minimal_manifest_shape() {
        let manifest = AppManifest::minimal("echo2", "duglin/echo").to_json();
        assert_eq!(
            manifest,
            serde_json::json!({
                "apiVersion": "serving.knative.dev/v1",
                "kind": "Service",
                "metadata": { "name": "echo2" },
                "spec": {
                    "template": {
                        "spec": {
                            "containers": [{ "image": "duglin/echo" }]
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_full_manifest_options() {
        let manifest = AppManifest::minimal("echo2", "duglin/echo")
            .min_scale(1)
            .max_scale(10)
            .env("myvar", "some-value")
            .resources("100m", "256M")
            .container_concurrency(100)
            .timeout_seconds(300)
            .to_json();

        let annotations = &manifest["spec"]["template"]["metadata"]["annotations"];
        assert_eq!(annotations["autoscaling.knative.dev/minScale"], "1");
        assert_eq!(annotations["autoscaling.knative.dev/maxScale"], "10");

        let template_spec = &manifest["spec"]["template"]["spec"];
        assert_eq!(template_spec["containerConcurrency"], 100);
        assert_eq!(template_spec["timeoutSeconds"], 300);

        let container = &template_spec["containers"][0];
        assert_eq!(container["env"][0]["name"], "myvar");
        assert_eq!(container["env"][0]["value"], "some-value");
        assert_eq!(container["resources"]["requests"]["cpu"], "100m");
        assert_eq!(container["resources"]["limits"]["memory"], "256M");
    }

    #[test]
    fn test_watch_event_types() {
        let event: WatchEvent = serde_json::from_str(
            r#"{"type":"MODIFIED","object":{"metadata":{"name":"echo2"}}}"#,
        )
        .unwrap();
        assert_eq!(event.event_type, WatchEventType::Modified);
        assert_eq!(event.app().unwrap().metadata.name.as_deref(), Some("echo2"));
    }
}
