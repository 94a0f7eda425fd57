use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    config::ServerConfig,
    control_plane::ControlPlane,
    data_model::{ActionResult, Environment},
    scenarios,
    state_store::ConvoyState,
};

/// Appended to a scenario result when endpoint resolution fails; the
/// scenario itself has already succeeded at that point.
pub const ACCESS_INFO_UNAVAILABLE: &str = "access details unavailable";

/// Executes user-initiated lifecycle actions against the backing
/// environment. Every executed command lands in the terminal log and every
/// outcome is published on the environment's feed.
pub struct ActionDispatcher {
    state: Arc<ConvoyState>,
    control_plane: Arc<dyn ControlPlane>,
    config: Arc<ServerConfig>,
}

impl ActionDispatcher {
    pub fn new(
        state: Arc<ConvoyState>,
        control_plane: Arc<dyn ControlPlane>,
        config: Arc<ServerConfig>,
    ) -> Self {
        ActionDispatcher {
            state,
            control_plane,
            config,
        }
    }

    /// Synthesizes the next resource name from the current snapshot
    /// cardinality: two existing resources yield `{prefix}_3`. The snapshot
    /// read releases the lock before the command runs.
    pub async fn create_resource(&self, env: Environment) -> ActionResult {
        let env_config = self.config.environment(env);
        let count = self.state.resource_count(env).await;
        let name = format!("{}_{}", env_config.resource_prefix, count + 1);
        let command = env_config.create_command.replace("{name}", &name);

        let output = self.control_plane.execute(&command).await;
        self.state
            .record_transcript(&command, &output.combined())
            .await;

        if output.ok {
            info!(environment = %env, name, "created resource");
            self.state.feed.publish(env, format!("created {name}"));
            ActionResult::succeeded(format!("created {name}"))
        } else {
            warn!(environment = %env, name, stderr = %output.stderr, "resource creation failed");
            let message = format!("failed to create {name}: {}", output.combined());
            self.state.feed.publish(env, message.clone());
            ActionResult::failed(message)
        }
    }

    /// Issues the delete without consulting the snapshot first; the
    /// environment CLI is the authority on what exists, and its own error
    /// text is surfaced for unknown names.
    pub async fn remove_resource(&self, env: Environment, name: &str) -> ActionResult {
        let command = self
            .config
            .environment(env)
            .remove_command
            .replace("{name}", name);

        let output = self.control_plane.execute(&command).await;
        self.state
            .record_transcript(&command, &output.combined())
            .await;

        if output.ok {
            info!(environment = %env, name, "removed resource");
            self.state.feed.publish(env, format!("removed {name}"));
            ActionResult::succeeded(format!("removed {name}"))
        } else {
            warn!(environment = %env, name, stderr = %output.stderr, "resource removal failed");
            let message = format!("failed to remove {name}: {}", output.combined());
            self.state.feed.publish(env, message.clone());
            ActionResult::failed(message)
        }
    }

    /// Runs a command inside the named resource. The result message is the
    /// combined stdout and stderr capture; the feed event carries only the
    /// tagged outcome, never the output itself.
    pub async fn exec_in_resource(
        &self,
        env: Environment,
        name: &str,
        command_text: &str,
    ) -> ActionResult {
        let command = self
            .config
            .environment(env)
            .exec_command
            .replace("{name}", name)
            .replace("{command}", command_text);

        let output = self.control_plane.execute(&command).await;
        let combined = output.combined();
        self.state.record_transcript(&command, &combined).await;

        if output.ok {
            self.state
                .feed
                .publish(env, format!("exec in {name} succeeded: {command_text}"));
            ActionResult::succeeded(combined)
        } else {
            self.state
                .feed
                .publish(env, format!("exec in {name} failed: {command_text}"));
            ActionResult::failed(combined)
        }
    }

    /// Activates a catalog scenario. Out-of-range indices are a silent
    /// no-op by contract: nothing runs, nothing is published.
    #[tracing::instrument(skip(self))]
    pub async fn activate_scenario(&self, env: Environment, index: usize) -> ActionResult {
        let Some(scenario) = scenarios::get(env, index) else {
            return ActionResult::noop();
        };

        let output = self.control_plane.execute(&scenario.command).await;
        self.state
            .record_transcript(&scenario.command, &output.combined())
            .await;

        if !output.ok {
            warn!(
                environment = %env,
                index,
                title = %scenario.title,
                "scenario activation failed"
            );
            let message = format!("scenario '{}' failed: {}", scenario.title, output.combined());
            self.state
                .feed
                .publish(env, format!("scenario '{}' failed", scenario.title));
            return ActionResult::failed(message);
        }

        let mut message = format!("scenario '{}' started", scenario.title);
        if publishes_endpoint(env, &scenario.command) {
            let access = self.resolve_access_info(env, &scenario.command).await;
            message = format!("{message} ({access})");
        }
        info!(environment = %env, index, title = %scenario.title, "scenario activated");
        self.state.feed.publish(env, message.clone());
        ActionResult::succeeded(message)
    }

    /// Best effort: every failure path degrades to the placeholder rather
    /// than failing the action.
    async fn resolve_access_info(&self, env: Environment, scenario_command: &str) -> String {
        match self.try_resolve_access_info(env, scenario_command).await {
            Some(url) => url,
            None => {
                warn!(environment = %env, "could not resolve access info");
                ACCESS_INFO_UNAVAILABLE.to_string()
            }
        }
    }

    async fn try_resolve_access_info(
        &self,
        env: Environment,
        scenario_command: &str,
    ) -> Option<String> {
        let name = named_resource(scenario_command)?;
        let env_config = self.config.environment(env);
        match env {
            Environment::Docker => {
                let command = env_config
                    .port_lookup_command
                    .as_ref()?
                    .replace("{name}", &name);
                let output = self.control_plane.execute(&command).await;
                if !output.ok {
                    return None;
                }
                let port = first_published_port(&output.stdout)?;
                Some(format!("http://localhost:{port}"))
            }
            Environment::Kubernetes => {
                let port_command = env_config
                    .service_port_command
                    .as_ref()?
                    .replace("{name}", &name);
                let port_output = self.control_plane.execute(&port_command).await;
                if !port_output.ok {
                    return None;
                }
                let port: u16 = port_output.stdout.trim().parse().ok()?;

                let addr_command = env_config.node_address_command.as_ref()?;
                let addr_output = self.control_plane.execute(addr_command).await;
                if !addr_output.ok {
                    return None;
                }
                let addr = addr_output.stdout.trim().to_string();
                if addr.is_empty() {
                    return None;
                }
                Some(format!("http://{addr}:{port}"))
            }
        }
    }
}

/// Whether a scenario command publishes a reachable network endpoint:
/// docker when it publishes a host port, k8s when it exposes a NodePort
/// service.
fn publishes_endpoint(env: Environment, command: &str) -> bool {
    match env {
        Environment::Docker => command.contains(" -p ") || command.contains("--publish"),
        Environment::Kubernetes => {
            command.contains("--type=NodePort") || command.contains("--type NodePort")
        }
    }
}

/// Resource name passed to `--name` (either `--name X` or `--name=X`).
fn named_resource(command: &str) -> Option<String> {
    let mut tokens = command.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "--name" {
            return tokens.next().map(str::to_string);
        }
        if let Some(name) = token.strip_prefix("--name=") {
            return Some(name.to_string());
        }
    }
    None
}

/// First host port in `docker port` output; `80/tcp -> 0.0.0.0:32768`
/// yields 32768.
fn first_published_port(output: &str) -> Option<u16> {
    for line in output.lines() {
        let Some((_, mapped)) = line.split_once("->") else {
            continue;
        };
        if let Some((_, port)) = mapped.trim().rsplit_once(':') {
            if let Ok(port) = port.trim().parse() {
                return Some(port);
            }
        }
    }
    None
}
