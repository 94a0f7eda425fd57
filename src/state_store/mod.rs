use std::collections::{HashMap, VecDeque};

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    config::ServerConfig,
    data_model::{CommandTranscript, Environment, ScalingEvent},
    state_store::feed::FeedBus,
    utils::get_epoch_time_in_ms,
};

pub mod feed;

#[derive(Default)]
struct EnvPartition {
    resources: HashMap<String, String>,
    last_poll_ms: Option<u64>,
}

/// Everything mutable the engine owns. Kept behind one lock; methods copy
/// data in and out so no guard is ever held across subprocess or network
/// I/O.
struct InMemoryFleet {
    docker: EnvPartition,
    kubernetes: EnvPartition,
    active_environment: Environment,
    terminal_log: VecDeque<CommandTranscript>,
    scaling_events: VecDeque<ScalingEvent>,
}

impl InMemoryFleet {
    fn partition(&self, env: Environment) -> &EnvPartition {
        match env {
            Environment::Docker => &self.docker,
            Environment::Kubernetes => &self.kubernetes,
        }
    }

    fn partition_mut(&mut self, env: Environment) -> &mut EnvPartition {
        match env {
            Environment::Docker => &mut self.docker,
            Environment::Kubernetes => &mut self.kubernetes,
        }
    }
}

/// In-memory mirror of external cluster state plus the engine's bounded
/// logs, shared by every loop and route handler. Snapshot content is always
/// exactly the parse of the most recent successful poll; a failed poll
/// leaves the previous snapshot in place.
pub struct ConvoyState {
    fleet: RwLock<InMemoryFleet>,
    pub feed: FeedBus,
    terminal_log_capacity: usize,
    scaling_log_capacity: usize,
}

impl ConvoyState {
    pub fn new(config: &ServerConfig) -> Self {
        ConvoyState {
            fleet: RwLock::new(InMemoryFleet {
                docker: EnvPartition::default(),
                kubernetes: EnvPartition::default(),
                active_environment: Environment::Docker,
                terminal_log: VecDeque::new(),
                scaling_events: VecDeque::new(),
            }),
            feed: FeedBus::new(config.feed_capacity),
            terminal_log_capacity: config.terminal_log_capacity,
            scaling_log_capacity: config.scaling_log_capacity,
        }
    }

    /// Wholesale swap of one environment's snapshot. The other partition is
    /// untouched.
    pub async fn replace_resources(&self, env: Environment, resources: HashMap<String, String>) {
        let mut fleet = self.fleet.write().await;
        let partition = fleet.partition_mut(env);
        partition.resources = resources;
        partition.last_poll_ms = Some(get_epoch_time_in_ms());
    }

    pub async fn resources(&self, env: Environment) -> HashMap<String, String> {
        self.fleet.read().await.partition(env).resources.clone()
    }

    pub async fn resource_count(&self, env: Environment) -> usize {
        self.fleet.read().await.partition(env).resources.len()
    }

    pub async fn last_poll_ms(&self, env: Environment) -> Option<u64> {
        self.fleet.read().await.partition(env).last_poll_ms
    }

    pub async fn active_environment(&self) -> Environment {
        self.fleet.read().await.active_environment
    }

    pub async fn set_active_environment(&self, env: Environment) {
        self.fleet.write().await.active_environment = env;
    }

    pub async fn record_transcript(&self, command: &str, output: &str) {
        let mut fleet = self.fleet.write().await;
        fleet.terminal_log.push_back(CommandTranscript {
            at: Utc::now(),
            command: command.to_string(),
            output: output.to_string(),
        });
        while fleet.terminal_log.len() > self.terminal_log_capacity {
            fleet.terminal_log.pop_front();
        }
    }

    pub async fn terminal_log(&self) -> Vec<CommandTranscript> {
        self.fleet.read().await.terminal_log.iter().cloned().collect()
    }

    pub async fn record_scaling_event(&self, env: Environment, message: &str) {
        let mut fleet = self.fleet.write().await;
        fleet.scaling_events.push_back(ScalingEvent {
            at: Utc::now(),
            environment: env,
            message: message.to_string(),
        });
        while fleet.scaling_events.len() > self.scaling_log_capacity {
            fleet.scaling_events.pop_front();
        }
    }

    pub async fn scaling_events(&self) -> Vec<ScalingEvent> {
        self.fleet.read().await.scaling_events.iter().cloned().collect()
    }
}
