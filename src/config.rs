//! Credentials and tracing settings, read from the environment once at startup.
//!
//! Real environment variables win over values from a `.env` file, which [load_dotenv] loads
//! without overriding anything already set.

use std::error::Error;
use std::fmt;
use std::fmt::Formatter;

use anyhow::{Context, Result};
use log::{info, warn};
use url::Url;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_API_BASE: &str = "OPENAI_API_BASE";
pub const LANGCHAIN_API_KEY: &str = "LANGCHAIN_API_KEY";
pub const LANGCHAIN_TRACING_V2: &str = "LANGCHAIN_TRACING_V2";
pub const LANGCHAIN_ENDPOINT: &str = "LANGCHAIN_ENDPOINT";
pub const LANGCHAIN_PROJECT: &str = "LANGCHAIN_PROJECT";

const DEFAULT_LANGCHAIN_ENDPOINT: &str = "https://api.smith.langchain.com";
const DEFAULT_LANGCHAIN_PROJECT: &str = "default";

/// Error when a required credential is not set.
#[derive(Debug, Clone)]
pub struct MissingCredential {
    pub variable: String,
}

impl fmt::Display for MissingCredential {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "MissingCredential: environment variable {} is not set or empty", self.variable)
    }
}

impl Error for MissingCredential {}

/// Load variables from `.env` in the working directory. A missing file is not an error.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment variables from {}", path.display()),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to load .env file: {}", e),
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, variable: &str) -> Option<String> {
    lookup(variable).filter(|value| !value.trim().is_empty())
}

fn process_env(variable: &str) -> Option<String> {
    std::env::var(variable).ok()
}

#[derive(Clone)]
pub struct Credentials {
    pub openai_api_key: String,
    pub openai_api_base: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &"<redacted>")
            .field("openai_api_base", &self.openai_api_base)
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, MissingCredential> {
        Self::from_lookup(process_env)
    }

    /// Read credentials through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MissingCredential> {
        let openai_api_key = non_empty(&lookup, OPENAI_API_KEY).ok_or_else(|| MissingCredential {
            variable: OPENAI_API_KEY.to_string(),
        })?;
        Ok(Self {
            openai_api_key,
            openai_api_base: non_empty(&lookup, OPENAI_API_BASE),
        })
    }
}

/// Where and whether to send run traces.
#[derive(Clone, PartialEq)]
pub struct TracingConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub endpoint: Url,
    pub project: String,
}

impl fmt::Debug for TracingConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracingConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint.as_str())
            .field("project", &self.project)
            .finish()
    }
}

impl TracingConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(process_env)
    }

    /// Tracing is on unless `LANGCHAIN_TRACING_V2` is set to a false value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let enabled = match non_empty(&lookup, LANGCHAIN_TRACING_V2) {
            Some(flag) => !matches!(flag.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no" | "off"),
            None => true,
        };
        let endpoint = non_empty(&lookup, LANGCHAIN_ENDPOINT).unwrap_or_else(|| DEFAULT_LANGCHAIN_ENDPOINT.to_string());
        let endpoint = Url::parse(endpoint.trim())
            .with_context(|| format!("{} is not a valid URL: {}", LANGCHAIN_ENDPOINT, endpoint))?;
        Ok(Self {
            enabled,
            api_key: non_empty(&lookup, LANGCHAIN_API_KEY),
            endpoint,
            project: non_empty(&lookup, LANGCHAIN_PROJECT).unwrap_or_else(|| DEFAULT_LANGCHAIN_PROJECT.to_string()),
        })
    }
}
