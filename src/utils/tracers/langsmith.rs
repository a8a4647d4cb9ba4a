use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

use crate::utils::tracers::{Run, Tracer};

/// Timeout of each request to the tracing service (in seconds)
pub const DEFAULT_LANGSMITH_TIMEOUT_SECS: u64 = 10;

/// Body of `POST /runs`.
#[derive(Debug, Serialize)]
pub(crate) struct CreateRun<'a> {
    id: Uuid,
    name: &'a str,
    run_type: &'a str,
    inputs: &'a Value,
    start_time: DateTime<Utc>,
    session_name: &'a str,
}

/// Body of `PATCH /runs/{id}`.
#[derive(Debug, Serialize)]
pub(crate) struct UpdateRun<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    outputs: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    end_time: DateTime<Utc>,
}

/// HTTP side of the LangSmith tracer.
#[derive(Debug)]
pub(crate) struct LangSmithClient {
    http: reqwest::Client,
    api_key: String,
    /// Always ends with `/` so that [Url::join] appends instead of replacing the last segment.
    endpoint: Url,
    project: String,
}

impl LangSmithClient {
    pub(crate) fn runs_url(&self) -> Result<Url> {
        Ok(self.endpoint.join("runs")?)
    }

    pub(crate) fn run_url(&self, id: Uuid) -> Result<Url> {
        Ok(self.endpoint.join(&format!("runs/{id}"))?)
    }

    pub(crate) fn create_body<'a>(&'a self, run: &'a Run) -> CreateRun<'a> {
        CreateRun {
            id: run.id,
            name: run.name.as_str(),
            run_type: run.run_type.as_str(),
            inputs: &run.inputs,
            start_time: run.start_time,
            session_name: self.project.as_str(),
        }
    }

    pub(crate) fn update_body(run: &Run) -> UpdateRun<'_> {
        UpdateRun {
            outputs: run.outputs.as_ref(),
            error: run.error.as_deref(),
            end_time: run.end_time.unwrap_or_else(Utc::now),
        }
    }

    pub(crate) async fn create_run(&self, run: &Run) -> Result<()> {
        self.http
            .post(self.runs_url()?)
            .header("x-api-key", self.api_key.as_str())
            .json(&self.create_body(run))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub(crate) async fn update_run(&self, run: &Run) -> Result<()> {
        self.http
            .patch(self.run_url(run.id)?)
            .header("x-api-key", self.api_key.as_str())
            .json(&Self::update_body(run))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Sends runs to the LangSmith tracing service.
///
/// Reports are delivered by background tasks, so the traced request never waits on the service.
/// The end report of a run is sent only after its start report has completed.
#[derive(Debug, Clone)]
pub struct LangSmithTracer {
    client: Arc<LangSmithClient>,
    /// Start reports still in flight, by run id.
    pending: Arc<Mutex<HashMap<Uuid, JoinHandle<()>>>>,
}

impl LangSmithTracer {
    pub fn new(api_key: impl Into<String>, endpoint: Url, project: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_key, endpoint, project, Duration::from_secs(DEFAULT_LANGSMITH_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        api_key: impl Into<String>,
        mut endpoint: Url,
        project: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client: Arc::new(LangSmithClient {
                http,
                api_key: api_key.into(),
                endpoint,
                project: project.into(),
            }),
            pending: Arc::new(Mutex::new(HashMap::new())),
        })
    }
}

#[async_trait]
impl Tracer for LangSmithTracer {
    async fn on_run_start(&self, run: &Run) {
        let client = self.client.clone();
        let run = run.clone();
        let id = run.id;
        let handle = tokio::spawn(async move {
            if let Err(e) = client.create_run(&run).await {
                warn!("Failed to send run {} to LangSmith: {}", run.id, e);
            }
        });
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        // runs whose end was never reported (cancelled requests) must not pile up
        pending.retain(|_, started| !started.is_finished());
        pending.insert(id, handle);
    }

    async fn on_run_end(&self, run: &Run) {
        let started = self.pending.lock().unwrap_or_else(PoisonError::into_inner).remove(&run.id);
        let client = self.client.clone();
        let run = run.clone();
        tokio::spawn(async move {
            if let Some(started) = started {
                let _ = started.await;
            }
            if let Err(e) = client.update_run(&run).await {
                warn!("Failed to update run {} on LangSmith: {}", run.id, e);
            }
        });
    }
}
