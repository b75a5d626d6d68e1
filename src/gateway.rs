//! Execution orchestrator
//!
//! Turns an incoming submission into one provider call: resolve the
//! language profile, run the source transformer, submit, and map the
//! provider's answer back. Grading sits on top of raw execution with two
//! strategies, checked in a fixed order:
//!
//! 1. test-code append: run `code\n\ntest_code` as one program, pass iff
//!    the exit code is 0 (a failing assertion exits non-zero in every
//!    interpreted runtime we care about, no per-language test framework
//!    needed)
//! 2. exact output match: run `code` alone, pass iff trimmed combined
//!    output equals the trimmed expected output
//!
//! With neither criterion supplied the outcome is a fixed negative, and no
//! provider call is made.
//!
//! The orchestrator holds no per-request state; concurrent calls share
//! only the immutable runtime table and shim templates.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::languages;
use crate::runner::{RunOutcome, Runner, RunnerError};
use crate::shims;

/// Sentinel returned when a submission carries no grading criteria
pub const NO_CRITERIA_MESSAGE: &str = "No validation criteria provided";

/// Result of grading a submission. Wrong answers and compile errors are
/// ordinary `success: false` outcomes, never errors.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct GradingOutcome {
    pub success: bool,
    pub output: String,
}

/// Stateless pipeline in front of the execution provider
pub struct ExecutionGateway {
    runner: Arc<dyn Runner>,
}

impl ExecutionGateway {
    pub fn new(runner: Arc<dyn Runner>) -> Self {
        Self { runner }
    }

    /// Execute a submission and return the provider's raw result.
    ///
    /// Used both for the ungated run/execute endpoints and as the
    /// execution step of grading, so shim injection and language
    /// resolution behave identically everywhere.
    pub async fn execute(
        &self,
        language: &str,
        source: &str,
        stdin: Option<&str>,
    ) -> Result<RunOutcome, RunnerError> {
        let profile = languages::resolve(language);
        let stdin = stdin.unwrap_or("");
        let prepared = shims::prepare_source(language, source, stdin);

        info!(
            "Executing submission: language={} runtime={} version={}",
            language, profile.runtime, profile.version
        );

        self.runner.execute(&profile, &prepared, stdin).await
    }

    /// Grade a submission against instructor-supplied criteria.
    ///
    /// `test_code` takes precedence over `expected_output` when both are
    /// present; callers rely on that order.
    pub async fn validate_submission(
        &self,
        language: &str,
        code: &str,
        expected_output: Option<&str>,
        test_code: Option<&str>,
    ) -> Result<GradingOutcome, RunnerError> {
        if let Some(test_code) = test_code {
            let program = format!("{}\n\n{}", code, test_code);
            let outcome = self.execute(language, &program, None).await?;

            return Ok(GradingOutcome {
                success: outcome.is_success(),
                output: outcome.output.trim().to_string(),
            });
        }

        if let Some(expected) = expected_output {
            let outcome = self.execute(language, code, None).await?;
            let actual = outcome.output.trim();

            return Ok(GradingOutcome {
                success: actual == expected.trim(),
                output: actual.to_string(),
            });
        }

        // Nothing to grade against can never succeed; short-circuit before
        // any provider call.
        Ok(GradingOutcome {
            success: false,
            output: NO_CRITERIA_MESSAGE.to_string(),
        })
    }
}
