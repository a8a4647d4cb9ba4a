//! # Run tracing
//!
//! A [Run] records one invocation of a traced [Runnable](crate::chain::Runnable): its inputs,
//! outputs or error, and when it started and ended. A [Tracer] receives the run twice, once when
//! it starts and once when it ends. Tracers must never fail the run they observe, so their
//! methods do not return errors; implementations log their own failures.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::TracingConfig;

#[cfg(feature = "langsmith")]
pub mod langsmith;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    pub id: Uuid,
    pub name: String,
    pub run_type: String,
    pub inputs: Value,
    pub outputs: Option<Value>,
    pub error: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Runs are keyed by name, so scalar values are wrapped into an object under `key`.
fn to_object(value: &impl Serialize, key: &str) -> Value {
    match serde_json::to_value(value) {
        Ok(value @ Value::Object(_)) => value,
        Ok(value) => json!({ key: value }),
        Err(e) => json!({ "serialization_error": e.to_string() }),
    }
}

impl Run {
    /// Start a run of type `chain`.
    pub fn chain(name: impl Into<String>, inputs: &impl Serialize) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            run_type: "chain".to_string(),
            inputs: to_object(inputs, "input"),
            outputs: None,
            error: None,
            start_time: Utc::now(),
            end_time: None,
        }
    }

    pub fn finish_ok(&mut self, outputs: &impl Serialize) {
        self.outputs = Some(to_object(outputs, "output"));
        self.end_time = Some(Utc::now());
    }

    pub fn finish_err(&mut self, error: &anyhow::Error) {
        self.error = Some(error.to_string());
        self.end_time = Some(Utc::now());
    }

    pub fn latency(&self) -> Option<Duration> {
        self.end_time.map(|end| end - self.start_time)
    }
}

#[async_trait]
pub trait Tracer: Send + Sync {
    async fn on_run_start(&self, run: &Run);
    async fn on_run_end(&self, run: &Run);
}

/// Writes runs to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

#[async_trait]
impl Tracer for LogTracer {
    async fn on_run_start(&self, run: &Run) {
        info!("run {} ({}) started", run.id, run.name);
    }

    async fn on_run_end(&self, run: &Run) {
        let latency_ms = run.latency().map_or(0, |latency| latency.num_milliseconds());
        match &run.error {
            None => info!("run {} ({}) succeeded in {} ms", run.id, run.name, latency_ms),
            Some(error) => warn!("run {} ({}) failed in {} ms: {}", run.id, run.name, latency_ms, error),
        }
    }
}

/// Pick the tracer for the given settings.
///
/// LangSmith is used when tracing is enabled and an API key is present; otherwise runs are only logged.
pub fn tracer_from_config(config: &TracingConfig) -> Arc<dyn Tracer> {
    if !config.enabled {
        info!("Tracing disabled, runs are only logged");
        return Arc::new(LogTracer);
    }
    match &config.api_key {
        #[cfg(feature = "langsmith")]
        Some(api_key) => {
            match langsmith::LangSmithTracer::new(api_key.clone(), config.endpoint.clone(), config.project.clone()) {
                Ok(tracer) => {
                    info!("Tracing runs to LangSmith project {} at {}", config.project, config.endpoint);
                    Arc::new(tracer)
                }
                Err(e) => {
                    warn!("Failed to set up LangSmith tracing, runs are only logged: {}", e);
                    Arc::new(LogTracer)
                }
            }
        }
        #[cfg(not(feature = "langsmith"))]
        Some(_) => {
            warn!("LANGCHAIN_API_KEY is set but this build has no LangSmith support, runs are only logged");
            Arc::new(LogTracer)
        }
        None => {
            warn!("Tracing is enabled but LANGCHAIN_API_KEY is not set, runs are only logged");
            Arc::new(LogTracer)
        }
    }
}
