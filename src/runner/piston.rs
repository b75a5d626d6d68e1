//! HTTP client for a Piston-compatible execution provider

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{RunOutcome, Runner, RunnerError};
use crate::languages::LanguageProfile;

/// Public Piston instance; override with RUNNER_API_URL in production
pub const DEFAULT_BASE_URL: &str = "https://emkc.org/api/v2/piston";

/// Default outbound timeout. The provider runs arbitrary user code, so a
/// hung submission must not pin a gateway connection indefinitely.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Client for the provider's `/execute` endpoint
#[derive(Clone)]
pub struct PistonClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    language: &'a str,
    version: &'a str,
    files: Vec<FilePayload<'a>>,
    stdin: &'a str,
}

#[derive(Debug, Serialize)]
struct FilePayload<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    run: RunPayload,
}

#[derive(Debug, Deserialize)]
struct RunPayload {
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    /// Absent when the program was killed by a signal
    code: Option<i32>,
    #[serde(default)]
    output: String,
}

/// Error responses carry at most a message; everything else about the
/// body shape is unreliable.
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: Option<String>,
}

impl PistonClient {
    /// Create a client for the given provider base URL
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl Runner for PistonClient {
    async fn execute(
        &self,
        profile: &LanguageProfile,
        source: &str,
        stdin: &str,
    ) -> Result<RunOutcome, RunnerError> {
        let url = format!("{}/execute", self.base_url);
        let body = ExecuteRequest {
            language: &profile.runtime,
            version: &profile.version,
            files: vec![FilePayload { content: source }],
            stdin,
        };

        debug!(
            "Submitting to provider: runtime={} version={} source_len={}",
            profile.runtime,
            profile.version,
            source.len()
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(RunnerError::Network)?;

        let status = response.status();
        if !status.is_success() {
            // Extract the provider's message defensively; error bodies are
            // not guaranteed to be JSON or to carry one at all.
            let message = response
                .json::<ErrorPayload>()
                .await
                .ok()
                .and_then(|payload| payload.message)
                .unwrap_or_else(|| "Unknown Error".to_string());

            warn!(
                "Provider rejected execution: status={} message={}",
                status, message
            );

            return Err(RunnerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: ExecuteResponse = response
            .json()
            .await
            .map_err(|e| RunnerError::Malformed(e.to_string()))?;

        Ok(RunOutcome {
            stdout: payload.run.stdout,
            stderr: payload.run.stderr,
            exit_code: payload.run.code.unwrap_or(-1),
            output: payload.run.output,
        })
    }
}
