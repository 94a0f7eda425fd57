use std::{collections::HashMap, str::FromStr};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::data_model::{ActionResult, CommandTranscript, Environment, ScalingEvent};

#[derive(Debug)]
pub struct ConvoyAPIError {
    status_code: StatusCode,
    message: String,
}

impl ConvoyAPIError {
    pub fn new(status_code: StatusCode, message: &str) -> Self {
        Self {
            status_code,
            message: message.to_string(),
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ConvoyAPIError {
    fn into_response(self) -> Response {
        error!("API error: {} {}", self.status_code, self.message);
        (self.status_code, self.message).into_response()
    }
}

/// Path and body values carry environments as their short names; unknown
/// values are a 400, not a panic.
pub fn parse_environment(value: &str) -> Result<Environment, ConvoyAPIError> {
    Environment::from_str(value)
        .map_err(|_| ConvoyAPIError::bad_request(&format!("unknown environment: {value}")))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnvironmentOverview {
    pub environment: String,
    pub resource_count: usize,
    pub autoscale_floor: usize,
    pub last_poll_ms: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OverviewResponse {
    pub active_environment: String,
    pub environments: Vec<EnvironmentOverview>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResourceListResponse {
    pub environment: String,
    pub resources: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetActiveEnvironmentRequest {
    pub environment: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExecRequest {
    pub command: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActionResponse {
    pub ok: bool,
    pub message: String,
}

impl From<ActionResult> for ActionResponse {
    fn from(result: ActionResult) -> Self {
        ActionResponse {
            ok: result.ok,
            message: result.message,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScenarioItem {
    pub index: usize,
    pub title: String,
    pub description: String,
    pub command: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScenarioListResponse {
    pub environment: String,
    pub scenarios: Vec<ScenarioItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TranscriptItem {
    pub at: String,
    pub command: String,
    pub output: String,
}

impl From<CommandTranscript> for TranscriptItem {
    fn from(transcript: CommandTranscript) -> Self {
        TranscriptItem {
            at: transcript.at.to_rfc3339(),
            command: transcript.command,
            output: transcript.output,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TerminalLogResponse {
    pub transcripts: Vec<TranscriptItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScalingEventItem {
    pub at: String,
    pub environment: String,
    pub message: String,
}

impl From<ScalingEvent> for ScalingEventItem {
    fn from(event: ScalingEvent) -> Self {
        ScalingEventItem {
            at: event.at.to_rfc3339(),
            environment: event.environment.to_string(),
            message: event.message,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScalingEventsResponse {
    pub events: Vec<ScalingEventItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssistantRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssistantResponse {
    pub reply: String,
}
