//! Live mode: one GET per synthesized URL, each on its own task.

use std::fmt;

use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::sink::OutputSink;

/// Builds the client shared by the description fetch and every dispatch.
///
/// Redirects and timeouts are left at reqwest's defaults.
pub fn build_client(headers: &[(String, String)], ignore_cert: bool) -> Result<Client> {
    let mut default_headers = HeaderMap::new();
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| Error::InvalidHeader(key.clone()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::InvalidHeader(format!("{}: {}", key, value)))?;
        default_headers.append(name, value);
    }

    Client::builder()
        .default_headers(default_headers)
        .danger_accept_invalid_certs(ignore_cert)
        .build()
        .map_err(Error::Client)
}

/// The result of a single probe, rendered as one output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Status { status: u16, url: String },
    Failed { error: String, url: String },
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::Status { status, url } => write!(f, "[{}] {}", status, url),
            DispatchOutcome::Failed { error, url } => write!(f, "{} - {}", error, url),
        }
    }
}

/// Sends one GET to `url`. Transport errors become a `Failed` outcome.
pub async fn probe(client: &Client, url: &str) -> DispatchOutcome {
    match client.get(url).send().await {
        Ok(response) => DispatchOutcome::Status {
            status: response.status().as_u16(),
            url: url.to_string(),
        },
        Err(e) => DispatchOutcome::Failed {
            error: e.to_string(),
            url: url.to_string(),
        },
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub dispatched: usize,
    pub failed: usize,
    pub panicked: usize,
}

/// Spawns probes and waits for all of them in [`Dispatcher::finish`].
pub struct Dispatcher {
    client: Client,
    sink: OutputSink,
    tasks: Vec<JoinHandle<bool>>,
}

impl Dispatcher {
    pub fn new(client: Client, sink: OutputSink) -> Self {
        Dispatcher {
            client,
            sink,
            tasks: Vec::new(),
        }
    }

    pub fn dispatch(&mut self, url: String) {
        let client = self.client.clone();
        let sink = self.sink.clone();

        debug!("Dispatching {}", url);
        self.tasks.push(tokio::spawn(async move {
            let outcome = probe(&client, &url).await;
            let ok = matches!(outcome, DispatchOutcome::Status { .. });
            if let Err(e) = sink.write_line(&outcome.to_string()).await {
                error!("Failed to write result for {}: {}", url, e);
            }
            ok
        }));
    }

    /// Waits for every spawned probe, then flushes the sink.
    pub async fn finish(self) -> Result<DispatchSummary> {
        let mut summary = DispatchSummary {
            dispatched: self.tasks.len(),
            ..Default::default()
        };

        for result in join_all(self.tasks).await {
            match result {
                Ok(true) => {}
                Ok(false) => summary.failed += 1,
                Err(e) => {
                    error!("Dispatch task failed: {}", e);
                    summary.panicked += 1;
                }
            }
        }

        self.sink.flush().await?;
        Ok(summary)
    }
}
