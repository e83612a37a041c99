// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Create/delete/status/wait operations against the services
//! collection. All readiness is observed by polling; there is no push
//! channel, and every wait takes an explicit timeout.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use http::Method;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use crate::api::ApiClient;
use crate::constants::{poll, serving};
use crate::error::{DroverError, Result};
use crate::types::app::{App, AppManifest, WatchEvent};

/// Poll cadence for the wait operations.
#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Interval between GETs while waiting for a created app's URL.
    pub url_interval: Duration,
    /// Interval between status polls while waiting for readiness.
    pub ready_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            url_interval: poll::URL_INTERVAL,
            ready_interval: poll::READY_INTERVAL,
        }
    }
}

pub struct AppController {
    client: ApiClient,
    poll: PollSettings,
}

impl AppController {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            poll: PollSettings::default(),
        }
    }

    pub fn with_poll_settings(client: ApiClient, poll: PollSettings) -> Self {
        Self { client, poll }
    }

    fn collection_path(&self) -> String {
        format!(
            "/apis/{}/namespaces/{}/{}",
            serving::API_GROUP_VERSION,
            self.client.namespace(),
            serving::RESOURCE
        )
    }

    fn app_path(&self, name: &str) -> String {
        format!("{}/{}", self.collection_path(), name)
    }

    /// Create the app, then poll until the server assigns it a URL.
    /// Returns the routable form of that URL.
    #[instrument(skip(self, manifest, timeout), fields(name = %manifest.name()))]
    pub async fn create(&self, manifest: &AppManifest, timeout: Duration) -> Result<String> {
        let response = self
            .client
            .call(
                Method::POST,
                &self.collection_path(),
                Some(manifest.to_json().to_string()),
            )
            .await?;
        if !response.is_success() {
            return Err(DroverError::Api {
                status: response.status,
                body: response.body,
            });
        }

        info!("Create accepted, waiting for URL assignment");
        self.wait_for_url(manifest.name(), timeout).await
    }

    /// Poll the app until `status.url` appears.
    ///
    /// Transport errors and 404/409 responses are retried each
    /// interval until the deadline, since a just-accepted object is
    /// often briefly unreadable. Any other non-2xx fails fast.
    async fn wait_for_url(&self, name: &str, timeout: Duration) -> Result<String> {
        let path = self.app_path(name);
        let deadline = Instant::now() + timeout;

        loop {
            match self.client.call(Method::GET, &path, None).await {
                Ok(response) if response.is_success() => {
                    let app: App = serde_json::from_str(&response.body)?;
                    if let Some(url) = app.url() {
                        let url = routable_url(url);
                        info!(%url, "App URL assigned");
                        return Ok(url);
                    }
                    debug!("App visible, URL not assigned yet");
                }
                Ok(response) if matches!(response.status, 404 | 409) => {
                    debug!(status = response.status, "App not visible yet");
                }
                Ok(response) => {
                    return Err(DroverError::Api {
                        status: response.status,
                        body: response.body,
                    });
                }
                Err(DroverError::Transport(e)) => {
                    warn!("Transport error while waiting for URL: {}", e);
                }
                Err(e) => return Err(e),
            }

            if Instant::now() + self.poll.url_interval > deadline {
                return Err(DroverError::Timeout {
                    waited: timeout,
                    what: format!("URL assignment for app '{name}'"),
                });
            }
            sleep(self.poll.url_interval).await;
        }
    }

    /// Delete the app. A 404 for an already-deleted app surfaces as an
    /// API error; repeating the call is safe.
    #[instrument(skip(self))]
    pub async fn delete(&self, name: &str) -> Result<()> {
        let response = self
            .client
            .call(Method::DELETE, &self.app_path(name), None)
            .await?;
        if !response.is_success() {
            return Err(DroverError::Api {
                status: response.status,
                body: response.body,
            });
        }
        info!("App deleted");
        Ok(())
    }

    /// Fetch the full object.
    pub async fn get(&self, name: &str) -> Result<App> {
        let response = self
            .client
            .call(Method::GET, &self.app_path(name), None)
            .await?;
        if !response.is_success() {
            return Err(DroverError::Api {
                status: response.status,
                body: response.body,
            });
        }
        Ok(serde_json::from_str(&response.body)?)
    }

    /// Whether the app's Ready condition reports True. A missing
    /// status object or empty conditions list reads as not ready;
    /// only an unparsable body is a hard error.
    pub async fn status(&self, name: &str) -> Result<bool> {
        Ok(self.get(name).await?.is_ready())
    }

    /// Poll [`AppController::status`] until it reports ready. The
    /// first hard error propagates immediately.
    #[instrument(skip(self, timeout))]
    pub async fn wait_ready(&self, name: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;

        loop {
            if self.status(name).await? {
                info!("App is ready");
                return Ok(());
            }

            if Instant::now() + self.poll.ready_interval > deadline {
                return Err(DroverError::Timeout {
                    waited: timeout,
                    what: format!("readiness of app '{name}'"),
                });
            }
            sleep(self.poll.ready_interval).await;
        }
    }

    /// Open a watch on a single app and decode its event stream. The
    /// caller drains events until the server closes the stream or the
    /// stream is dropped.
    #[instrument(skip(self))]
    pub async fn watch(&self, name: &str) -> Result<WatchStream> {
        let path = format!(
            "{}?watch=true&fieldSelector=metadata.name={}",
            self.collection_path(),
            name
        );
        let stream = self.client.stream(Method::GET, &path, None).await?;
        if stream.status / 100 != 2 {
            return Err(DroverError::Api {
                status: stream.status,
                body: String::new(),
            });
        }
        Ok(WatchStream::new(stream.body))
    }
}

/// The server reports in-cluster URLs with an http scheme; the
/// routable form is https.
fn routable_url(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

/// Decodes a newline-delimited watch body into [`WatchEvent`]s.
pub struct WatchStream {
    inner: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
    buffer: Vec<u8>,
    done: bool,
}

impl std::fmt::Debug for WatchStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchStream")
            .field("buffer", &self.buffer)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl WatchStream {
    fn new(inner: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            done: false,
        }
    }

    /// Pop the next complete line out of the buffer, skipping blanks.
    fn next_line(&mut self) -> Option<Vec<u8>> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if !line.is_empty() {
                return Some(line);
            }
        }
        None
    }
}

impl Stream for WatchStream {
    type Item = Result<WatchEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(line) = self.next_line() {
                return Poll::Ready(Some(
                    serde_json::from_slice(&line).map_err(DroverError::from),
                ));
            }
            if self.done {
                return Poll::Ready(None);
            }

            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => self.buffer.extend_from_slice(&chunk),
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e.into()))),
                Poll::Ready(None) => {
                    self.done = true;
                    // A final event without a trailing newline still counts.
                    if !self.buffer.is_empty() && !self.buffer.ends_with(b"\n") {
                        self.buffer.push(b'\n');
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
