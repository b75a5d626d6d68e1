//! HTTP surface of the gateway
//!
//! Three submission endpoints plus a registry listing. Grading negatives
//! ("wrong answer", failing tests, compile errors) are ordinary 200
//! responses; only provider transport failures error, and those surface as
//! a single 502 with a stable generic message so provider internals never
//! leak to callers. Authentication for `/exercises/submit` is enforced
//! upstream by the platform's auth layer, not here.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::gateway::{ExecutionGateway, GradingOutcome};
use crate::languages;
use crate::runner::{RunOutcome, RunnerError};

/// The one message callers see when the provider is down or rejecting
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Code execution service is currently unavailable";

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ExecutionGateway>,
}

/// Build the gateway router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/code-execution/run", post(run_code))
        .route("/code-execution/languages", get(list_languages))
        .route("/exercises/execute", post(execute_exercise))
        .route("/exercises/submit", post(submit_exercise))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunRequest {
    language: String,
    source_code: String,
    #[serde(default)]
    stdin: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExecuteRequest {
    language: String,
    code: String,
    #[serde(default)]
    stdin: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest {
    language: String,
    code: String,
    #[serde(default)]
    expected_output: Option<String>,
    #[serde(default)]
    test_code: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExecutionResponse {
    stdout: String,
    stderr: String,
    code: i32,
    output: String,
}

impl From<RunOutcome> for ExecutionResponse {
    fn from(outcome: RunOutcome) -> Self {
        Self {
            stdout: outcome.stdout,
            stderr: outcome.stderr,
            code: outcome.exit_code,
            output: outcome.output,
        }
    }
}

/// Provider failure as seen by callers: always 502, always the same body
struct UpstreamFailure(RunnerError);

impl From<RunnerError> for UpstreamFailure {
    fn from(err: RunnerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for UpstreamFailure {
    fn into_response(self) -> Response {
        // Full detail goes to the log; the caller gets the generic line.
        error!("Execution provider failure: {}", self.0);

        (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "message": UPSTREAM_FAILURE_MESSAGE })),
        )
            .into_response()
    }
}

async fn run_code(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<ExecutionResponse>, UpstreamFailure> {
    let outcome = state
        .gateway
        .execute(
            &request.language,
            &request.source_code,
            request.stdin.as_deref(),
        )
        .await?;

    Ok(Json(outcome.into()))
}

async fn execute_exercise(
    State(state): State<AppState>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<ExecutionResponse>, UpstreamFailure> {
    let outcome = state
        .gateway
        .execute(&request.language, &request.code, request.stdin.as_deref())
        .await?;

    Ok(Json(outcome.into()))
}

async fn submit_exercise(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<GradingOutcome>, UpstreamFailure> {
    let outcome = state
        .gateway
        .validate_submission(
            &request.language,
            &request.code,
            request.expected_output.as_deref(),
            request.test_code.as_deref(),
        )
        .await?;

    Ok(Json(outcome))
}

async fn list_languages() -> Json<Vec<String>> {
    Json(languages::supported_languages())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::mock::{outcome, MockRunner};

    /// Serve the router on an ephemeral port, backed by the given runner
    async fn spawn_app(runner: MockRunner) -> String {
        let state = AppState {
            gateway: Arc::new(ExecutionGateway::new(Arc::new(runner))),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_run_endpoint_returns_raw_result() {
        let base = spawn_app(MockRunner::with_outcome(outcome("hi\n", 0))).await;

        let response = reqwest::Client::new()
            .post(format!("{}/code-execution/run", base))
            .json(&serde_json::json!({
                "language": "javascript",
                "sourceCode": "console.log('hi')",
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["stdout"], "hi\n");
        assert_eq!(body["code"], 0);
        assert_eq!(body["output"], "hi\n");
    }

    #[tokio::test]
    async fn test_execute_endpoint_accepts_code_field() {
        let base = spawn_app(MockRunner::with_outcome(outcome("4\n", 0))).await;

        let response = reqwest::Client::new()
            .post(format!("{}/exercises/execute", base))
            .json(&serde_json::json!({
                "language": "python",
                "code": "print(2 + 2)",
                "stdin": "",
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["output"], "4\n");
    }

    #[tokio::test]
    async fn test_submit_endpoint_grades_without_erroring() {
        let base = spawn_app(MockRunner::with_outcome(outcome("wrong\n", 0))).await;

        let response = reqwest::Client::new()
            .post(format!("{}/exercises/submit", base))
            .json(&serde_json::json!({
                "language": "python",
                "code": "print('wrong')",
                "expectedOutput": "right",
            }))
            .send()
            .await
            .unwrap();

        // Wrong answer is still a 200
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["output"], "wrong");
    }

    #[tokio::test]
    async fn test_submit_without_criteria_returns_sentinel() {
        let base = spawn_app(MockRunner::unreachable()).await;

        let response = reqwest::Client::new()
            .post(format!("{}/exercises/submit", base))
            .json(&serde_json::json!({
                "language": "python",
                "code": "print(1)",
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["output"], crate::gateway::NO_CRITERIA_MESSAGE);
    }

    #[tokio::test]
    async fn test_provider_failure_maps_to_generic_bad_gateway() {
        let network_err = reqwest::Client::new()
            .get("http://127.0.0.1:1/")
            .send()
            .await
            .unwrap_err();
        let base = spawn_app(MockRunner::returning(vec![Err(RunnerError::Network(
            network_err,
        ))]))
        .await;

        let response = reqwest::Client::new()
            .post(format!("{}/exercises/execute", base))
            .json(&serde_json::json!({
                "language": "python",
                "code": "print(1)",
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 502);
        let body: serde_json::Value = response.json().await.unwrap();
        // Stable generic message, no raw error internals
        assert_eq!(body["message"], UPSTREAM_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_api_error_shape_does_not_leak_provider_message() {
        let base = spawn_app(MockRunner::returning(vec![Err(RunnerError::Api {
            status: 400,
            message: "internal provider detail".to_string(),
        })]))
        .await;

        let response = reqwest::Client::new()
            .post(format!("{}/code-execution/run", base))
            .json(&serde_json::json!({
                "language": "cobol",
                "sourceCode": "DISPLAY 'HI'.",
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 502);
        let text = response.text().await.unwrap();
        assert!(!text.contains("internal provider detail"));
        assert!(text.contains(UPSTREAM_FAILURE_MESSAGE));
    }
}
