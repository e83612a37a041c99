// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking control-plane API responses.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

use crate::credentials::Credentials;

/// Scripted responses keyed by method and path. Multiple responses on
/// the same route are served in order; the last one repeats.
#[derive(Clone, Default)]
pub struct MockResponses {
    routes: Arc<Mutex<HashMap<(String, String), VecDeque<(u16, String)>>>>,
}

impl MockResponses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back((status, body.to_string()));
        self
    }

    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    fn next_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let mut routes = self.routes.lock().unwrap();
        let queue = routes.get_mut(&(method.to_string(), path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

/// One request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
}

/// A real HTTP server on a loopback port, serving scripted responses.
pub struct MockServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn start(responses: MockResponses) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::new(Mutex::new(Vec::new()));

        let recorded = requests.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let responses = responses.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        handle_request(req, responses.clone(), recorded.clone())
                    });
                    let _ = hyper::server::conn::http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });

        Self {
            addr,
            requests,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Credentials pointing at this server, namespace "test".
    pub fn credentials(&self) -> Credentials {
        test_credentials(&self.url())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, method: &str, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_request(
    req: Request<Incoming>,
    responses: MockResponses,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let content_type = header("content-type");
    let authorization = header("authorization");

    let body = req.into_body().collect().await?.to_bytes();
    recorded.lock().unwrap().push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        body: String::from_utf8_lossy(&body).to_string(),
        content_type,
        authorization,
    });

    let (status, body) = responses
        .next_response(&method, &path)
        .unwrap_or_else(|| (404, not_found_json("requests", &path)));

    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap())
}

/// Credentials for a mock endpoint, no CA pinning.
pub fn test_credentials(server: &str) -> Credentials {
    Credentials {
        server: Url::parse(server).unwrap(),
        namespace: Some("test".to_string()),
        token: "test-token".to_string(),
        ca_bundle: None,
    }
}

/// A service object as the API server would return it. `conditions`
/// pairs are (type, status); `url` lands in `status.url` when set.
pub fn service_json(name: &str, url: Option<&str>, conditions: &[(&str, &str)]) -> String {
    let mut object = serde_json::json!({
        "apiVersion": "serving.knative.dev/v1",
        "kind": "Service",
        "metadata": {
            "name": name,
            "namespace": "test",
            "uid": "test-uid"
        }
    });
    if url.is_some() || !conditions.is_empty() {
        let condition_objects: Vec<_> = conditions
            .iter()
            .map(|(condition_type, status)| {
                serde_json::json!({
                    "type": condition_type,
                    "status": status,
                    "lastTransitionTime": "2021-04-08T00:52:26Z"
                })
            })
            .collect();
        object["status"] = serde_json::json!({ "conditions": condition_objects });
        if let Some(url) = url {
            object["status"]["url"] = serde_json::json!(url);
        }
    }
    object.to_string()
}

/// A 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}
