use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    config::ServerConfig, control_plane::ControlPlane, data_model::Environment,
    state_store::ConvoyState,
};

/// Mirrors external cluster state into the snapshot store on a fixed
/// cadence. Listing failures keep the previous snapshot; only shutdown
/// stops the loop.
pub struct Poller {
    state: Arc<ConvoyState>,
    control_plane: Arc<dyn ControlPlane>,
    config: Arc<ServerConfig>,
}

impl Poller {
    pub fn new(
        state: Arc<ConvoyState>,
        control_plane: Arc<dyn ControlPlane>,
        config: Arc<ServerConfig>,
    ) -> Self {
        Poller {
            state,
            control_plane,
            config,
        }
    }

    pub async fn start(self: Arc<Self>, mut shutdown_rx: watch::Receiver<()>) {
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.poll_interval_secs));
        info!(
            interval_secs = self.config.poll_interval_secs,
            "environment poller started"
        );
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.poll_once().await;
                }
                _ = shutdown_rx.changed() => {
                    info!("environment poller shutting down");
                    break;
                }
            }
        }
    }

    /// One refresh pass over both environments.
    #[tracing::instrument(skip_all)]
    pub async fn poll_once(&self) {
        for env in Environment::ALL {
            let command = &self.config.environment(env).list_command;
            let output = self.control_plane.execute(command).await;
            if !output.ok {
                warn!(
                    environment = %env,
                    stderr = %output.stderr,
                    "listing failed, keeping previous snapshot"
                );
                continue;
            }

            let resources = parse_listing(env, &output.stdout);
            let count = resources.len();
            self.state.replace_resources(env, resources).await;
            self.state
                .feed
                .publish(env, format!("{env}: {count} resources tracked"));
        }
    }
}

/// docker: one resource per non-empty line, first whitespace token is the
/// name and the remainder the status text. k8s: one namespace per line,
/// every namespace reported as Active.
pub(crate) fn parse_listing(env: Environment, stdout: &str) -> HashMap<String, String> {
    let mut resources = HashMap::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match env {
            Environment::Docker => {
                let mut parts = line.splitn(2, char::is_whitespace);
                if let Some(name) = parts.next() {
                    let status = parts.next().unwrap_or("").trim().to_string();
                    resources.insert(name.to_string(), status);
                }
            }
            Environment::Kubernetes => {
                if let Some(name) = line.split_whitespace().next() {
                    resources.insert(name.to_string(), "Active".to_string());
                }
            }
        }
    }
    resources
}
