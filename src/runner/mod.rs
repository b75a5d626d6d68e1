//! Runner module - remote execution provider abstraction
//!
//! This module provides the boundary to the third-party execution service:
//! - `Runner`: trait the orchestrator calls through (mockable in tests)
//! - `PistonClient`: HTTP client for a Piston-compatible provider
//!
//! The runner module does NOT:
//! - Inject shims or rewrite source (the transformer's job)
//! - Compare outputs or grade submissions (the orchestrator's job)
//! - Retry failed calls; executing arbitrary user code is not safely
//!   idempotent, so the first failure is surfaced as-is

pub mod piston;

use async_trait::async_trait;
use thiserror::Error;

use crate::languages::LanguageProfile;

/// Outcome of one remote execution
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Raw stdout, not trimmed
    pub stdout: String,
    /// Raw stderr, not trimmed
    pub stderr: String,
    /// Exit code; 0 means success, -1 when the provider reports none
    /// (signal-killed programs)
    pub exit_code: i32,
    /// Provider's merged stdout/stderr stream, used for grading
    pub output: String,
}

impl RunOutcome {
    /// Check if execution was successful (exited with code 0)
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Errors at the provider boundary.
///
/// Tagged instead of duck-typed: callers match on the variant, and the
/// three-level message fallback (body message, transport message, "Unknown
/// Error") happens once, inside the client.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Transport-level failure: DNS, connection reset, timeout
    #[error("execution provider unreachable: {0}")]
    Network(#[source] reqwest::Error),
    /// Provider answered with a non-2xx status
    #[error("execution provider rejected the request ({status}): {message}")]
    Api { status: u16, message: String },
    /// Provider answered 2xx with a body we could not decode
    #[error("execution provider returned a malformed response: {0}")]
    Malformed(String),
}

/// Runner trait for submitting prepared source to the provider
#[async_trait]
pub trait Runner: Send + Sync {
    /// Execute prepared source under the given runtime profile
    async fn execute(
        &self,
        profile: &LanguageProfile,
        source: &str,
        stdin: &str,
    ) -> Result<RunOutcome, RunnerError>;
}

// Re-exports
pub use piston::PistonClient;

#[cfg(test)]
pub mod mock {
    //! In-process `Runner` stand-in for orchestrator and HTTP-layer tests

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{RunOutcome, Runner, RunnerError};
    use crate::languages::LanguageProfile;

    /// Scripted runner: hands out queued responses and records everything
    /// it was called with.
    pub struct MockRunner {
        calls: AtomicUsize,
        responses: Mutex<VecDeque<Result<RunOutcome, RunnerError>>>,
        pub seen_profiles: Mutex<Vec<LanguageProfile>>,
        pub seen_sources: Mutex<Vec<String>>,
        pub seen_stdin: Mutex<Vec<String>>,
    }

    impl MockRunner {
        pub fn returning(responses: Vec<Result<RunOutcome, RunnerError>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                responses: Mutex::new(VecDeque::from(responses)),
                seen_profiles: Mutex::new(Vec::new()),
                seen_sources: Mutex::new(Vec::new()),
                seen_stdin: Mutex::new(Vec::new()),
            }
        }

        /// Runner that always has nothing to say; for tests asserting no
        /// call is made.
        pub fn unreachable() -> Self {
            Self::returning(Vec::new())
        }

        pub fn with_outcome(outcome: RunOutcome) -> Self {
            Self::returning(vec![Ok(outcome)])
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_source(&self) -> Option<String> {
            self.seen_sources.lock().unwrap().last().cloned()
        }
    }

    /// Build a successful outcome where stdout and the combined stream
    /// carry the same text.
    pub fn outcome(output: &str, exit_code: i32) -> RunOutcome {
        RunOutcome {
            stdout: output.to_string(),
            stderr: String::new(),
            exit_code,
            output: output.to_string(),
        }
    }

    #[async_trait]
    impl Runner for MockRunner {
        async fn execute(
            &self,
            profile: &LanguageProfile,
            source: &str,
            stdin: &str,
        ) -> Result<RunOutcome, RunnerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_profiles.lock().unwrap().push(profile.clone());
            self.seen_sources.lock().unwrap().push(source.to_string());
            self.seen_stdin.lock().unwrap().push(stdin.to_string());

            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("MockRunner ran out of scripted responses")
        }
    }
}
