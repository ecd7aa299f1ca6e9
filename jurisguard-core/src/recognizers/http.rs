// jurisguard-core/src/recognizers/http.rs
//! An [`EntityAnalyzer`] backed by a Presidio-compatible analyzer service.
//!
//! `POST {endpoint}/analyze` with `{"text", "language", "entities"}` returns a
//! JSON array of `{entity_type, start, end, score}` in character offsets.
//! `GET {endpoint}/health` is probed once while the engine is built so that a
//! missing service fails engine construction instead of the first document.
//!
//! License: MIT OR APACHE 2.0

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, error, info};
use reqwest::{Client, Request, StatusCode};
use serde::Serialize;
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::AnalyzerConfig;
use crate::entity::EntityType;
use crate::errors::RedactorError;
use crate::recognizer::{AnalyzerResult, EntityAnalyzer};

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
    language: &'a str,
    entities: Vec<&'a str>,
}

type Reply = std_mpsc::SyncSender<reqwest::Result<(StatusCode, String)>>;

/// One request handed to the I/O thread, with the channel its outcome goes back on.
struct Exchange {
    request: Request,
    reply: Reply,
}

/// Calls are synchronous, but the HTTP client is async and runs on a
/// current-thread runtime owned by a dedicated I/O thread. Callers only block
/// on a std channel, so the analyzer can be built, used and dropped from
/// inside or outside a tokio runtime. The thread exits when the last clone of
/// the analyzer is dropped.
#[derive(Debug, Clone)]
pub struct HttpAnalyzer {
    client: Client,
    endpoint: String,
    timeout: Duration,
    exchanges: mpsc::UnboundedSender<Exchange>,
}

impl HttpAnalyzer {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, RedactorError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("jurisguard-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RedactorError::EngineUnavailable(format!("failed to build analyzer HTTP client: {}", e)))?;
        let exchanges = spawn_io_thread(client.clone())?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout,
            exchanges,
        })
    }

    /// Builds the client from configuration and runs the health probe if enabled.
    /// Returns `None` when no endpoint is configured.
    pub fn from_config(config: &AnalyzerConfig) -> Result<Option<Self>, RedactorError> {
        let Some(endpoint) = config.endpoint.as_deref() else {
            return Ok(None);
        };
        let analyzer = Self::new(endpoint, Duration::from_millis(config.timeout_ms))?;
        if config.health_check {
            analyzer.health_check()?;
        }
        info!("Using external analyzer at {}.", analyzer.endpoint);
        Ok(Some(analyzer))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fails with `EngineUnavailable` unless `GET /health` answers with a 2xx status.
    pub fn health_check(&self) -> Result<(), RedactorError> {
        let url = format!("{}/health", self.endpoint);
        debug!("Probing analyzer health at {}", url);
        let unreachable_err = |e: &dyn std::fmt::Display| {
            RedactorError::EngineUnavailable(format!("analyzer at {} is unreachable: {}", self.endpoint, e))
        };
        let request = self.client.get(&url).build().map_err(|e| unreachable_err(&e))?;
        let (status, _) = self.exchange(request).map_err(|e| unreachable_err(&format!("{:#}", e)))?;
        if !status.is_success() {
            return Err(RedactorError::EngineUnavailable(format!(
                "analyzer health check at {} returned {}",
                self.endpoint, status
            )));
        }
        Ok(())
    }

    /// Sends `request` on the I/O thread and waits for the status and body.
    fn exchange(&self, request: Request) -> Result<(StatusCode, String)> {
        let (reply, outcome) = std_mpsc::sync_channel(1);
        self.exchanges
            .send(Exchange { request, reply })
            .map_err(|_| anyhow!("analyzer I/O thread is not running"))?;
        let response = outcome
            .recv()
            .map_err(|_| anyhow!("analyzer I/O thread stopped before answering"))?;
        Ok(response?)
    }
}

/// Starts the I/O thread and waits until its runtime is up.
fn spawn_io_thread(client: Client) -> Result<mpsc::UnboundedSender<Exchange>, RedactorError> {
    let (exchanges, mut pending) = mpsc::unbounded_channel::<Exchange>();
    let (started, startup) = std_mpsc::sync_channel::<std::io::Result<()>>(1);

    thread::Builder::new()
        .name("jurisguard-analyzer-io".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => {
                    let _ = started.send(Ok(()));
                    runtime
                }
                Err(e) => {
                    let _ = started.send(Err(e));
                    return;
                }
            };
            runtime.block_on(async move {
                while let Some(Exchange { request, reply }) = pending.recv().await {
                    let client = client.clone();
                    tokio::spawn(async move {
                        let outcome = async {
                            let response = client.execute(request).await?;
                            let status = response.status();
                            Ok::<_, reqwest::Error>((status, response.text().await?))
                        }
                        .await;
                        let _ = reply.send(outcome);
                    });
                }
            });
            debug!("Analyzer I/O thread stopped.");
        })
        .map_err(|e| RedactorError::EngineUnavailable(format!("failed to start analyzer I/O thread: {}", e)))?;

    match startup.recv() {
        Ok(Ok(())) => Ok(exchanges),
        Ok(Err(e)) => {
            error!("Analyzer runtime failed to start: {}", e);
            Err(RedactorError::EngineUnavailable(format!("failed to start analyzer runtime: {}", e)))
        }
        Err(_) => Err(RedactorError::EngineUnavailable(
            "analyzer I/O thread exited during startup".to_string(),
        )),
    }
}

impl EntityAnalyzer for HttpAnalyzer {
    fn analyze(&self, text: &str, entity_types: &[EntityType], language: &str) -> Result<Vec<AnalyzerResult>> {
        self.analyze_within(text, entity_types, language, None)
    }

    /// The request timeout is the configured one, shortened to `budget`.
    fn analyze_within(
        &self,
        text: &str,
        entity_types: &[EntityType],
        language: &str,
        budget: Option<Duration>,
    ) -> Result<Vec<AnalyzerResult>> {
        let body = AnalyzeRequest {
            text,
            language,
            entities: entity_types.iter().map(EntityType::as_str).collect(),
        };
        let timeout = budget.map_or(self.timeout, |budget| budget.min(self.timeout));
        if timeout.is_zero() {
            bail!("no time left for the analyze request to {}", self.endpoint);
        }
        let request = self
            .client
            .post(format!("{}/analyze", self.endpoint))
            .json(&body)
            .timeout(timeout)
            .build()
            .with_context(|| format!("could not build the analyze request for {}", self.endpoint))?;
        let (status, payload) = self
            .exchange(request)
            .with_context(|| format!("analyze request to {} failed", self.endpoint))?;
        if !status.is_success() {
            bail!("analyzer at {} rejected the request with {}", self.endpoint, status);
        }
        serde_json::from_str(&payload).with_context(|| format!("analyzer at {} returned malformed JSON", self.endpoint))
    }
}
