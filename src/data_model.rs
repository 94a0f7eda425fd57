use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Backend environment a resource pool lives in. The two environments are
/// interchangeable from the engine's point of view; every snapshot, feed and
/// action is keyed by one of these.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Environment {
    #[serde(rename = "docker")]
    #[strum(serialize = "docker")]
    Docker,
    #[serde(rename = "k8s")]
    #[strum(serialize = "k8s")]
    Kubernetes,
}

impl Environment {
    pub const ALL: [Environment; 2] = [Environment::Docker, Environment::Kubernetes];
}

/// One entry on an environment's live feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEvent {
    pub at: DateTime<Utc>,
    pub message: String,
}

impl FeedEvent {
    pub fn now(message: impl Into<String>) -> Self {
        FeedEvent {
            at: Utc::now(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FeedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M:%S"), self.message)
    }
}

/// A command the engine ran on behalf of a user, with its captured output.
/// Retained in a bounded terminal log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandTranscript {
    pub at: DateTime<Utc>,
    pub command: String,
    pub output: String,
}

/// One autoscaling action taken by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalingEvent {
    pub at: DateTime<Utc>,
    pub environment: Environment,
    pub message: String,
}

/// A runnable demo scenario from the per-environment catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub title: String,
    pub description: String,
    pub command: String,
}

/// Outcome of a dispatched action. Failures of the underlying CLI surface
/// here as `ok: false` with the CLI's own text; they are not errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub ok: bool,
    pub message: String,
}

impl ActionResult {
    pub fn succeeded(message: impl Into<String>) -> Self {
        ActionResult {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        ActionResult {
            ok: false,
            message: message.into(),
        }
    }

    /// An action that was deliberately skipped, e.g. an out-of-range
    /// scenario index.
    pub fn noop() -> Self {
        ActionResult {
            ok: true,
            message: String::new(),
        }
    }
}
