use std::net::SocketAddr;

use anyhow::Result;
use chrono::Weekday;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::data_model::Environment;

const LOCAL_ENV: &str = "local";

/// Command templates and scaling policy for one backend environment.
/// `{name}` and `{command}` placeholders are substituted at dispatch time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub list_command: String,
    pub create_command: String,
    pub remove_command: String,
    pub exec_command: String,
    pub resource_prefix: String,
    pub autoscale_floor: usize,
    // docker access-info lookup: published ports of a container.
    #[serde(default)]
    pub port_lookup_command: Option<String>,
    // k8s access-info lookups: service node port and a reachable node address.
    #[serde(default)]
    pub service_port_command: Option<String>,
    #[serde(default)]
    pub node_address_command: Option<String>,
}

fn default_docker_environment() -> EnvironmentConfig {
    EnvironmentConfig {
        list_command: "docker ps --format '{{.Names}} {{.Status}}'".to_string(),
        create_command: "docker run -d --name {name} nginx:alpine".to_string(),
        remove_command: "docker rm -f {name}".to_string(),
        exec_command: "docker exec {name} {command}".to_string(),
        resource_prefix: "container".to_string(),
        autoscale_floor: 5,
        port_lookup_command: Some("docker port {name}".to_string()),
        service_port_command: None,
        node_address_command: None,
    }
}

fn default_kubernetes_environment() -> EnvironmentConfig {
    EnvironmentConfig {
        list_command: "kubectl get namespaces --no-headers".to_string(),
        create_command: "kubectl create namespace {name}".to_string(),
        remove_command: "kubectl delete namespace {name}".to_string(),
        exec_command: "kubectl -n {name} {command}".to_string(),
        resource_prefix: "namespace".to_string(),
        autoscale_floor: 3,
        port_lookup_command: None,
        service_port_command: Some(
            "kubectl get service {name} -o jsonpath={.spec.ports[0].nodePort}".to_string(),
        ),
        node_address_command: Some(
            "kubectl get nodes -o jsonpath={.items[0].status.addresses[0].address}".to_string(),
        ),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailGatewayConfig {
    pub url: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub mail: Option<MailGatewayConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_assistant_model")]
    pub model: String,
}

fn default_assistant_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        AssistantConfig {
            endpoint: None,
            api_key: None,
            model: default_assistant_model(),
        }
    }
}

/// When the weekly report fires: weekday name ("mon".."sun") and hour, UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_weekday")]
    pub weekday: String,
    #[serde(default = "default_report_hour")]
    pub hour_utc: u32,
}

fn default_report_weekday() -> String {
    "mon".to_string()
}

fn default_report_hour() -> u32 {
    9
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            weekday: default_report_weekday(),
            hour_utc: default_report_hour(),
        }
    }
}

impl ReportConfig {
    pub fn parsed_weekday(&self) -> Result<Weekday> {
        self.weekday
            .parse::<Weekday>()
            .map_err(|_| anyhow::anyhow!("invalid report weekday: {}", self.weekday))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    // Optional path to write local logs to a rotating file.
    #[serde(default)]
    pub local_log_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_env_name")]
    pub env: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_autoscale_interval_secs")]
    pub autoscale_interval_secs: u64,
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,
    #[serde(default = "default_terminal_log_capacity")]
    pub terminal_log_capacity: usize,
    #[serde(default = "default_scaling_log_capacity")]
    pub scaling_log_capacity: usize,
    #[serde(default = "default_docker_environment")]
    pub docker: EnvironmentConfig,
    #[serde(rename = "k8s", default = "default_kubernetes_environment")]
    pub kubernetes: EnvironmentConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_env_name() -> String {
    LOCAL_ENV.to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:8900".to_string()
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_autoscale_interval_secs() -> u64 {
    60
}

fn default_feed_capacity() -> usize {
    500
}

fn default_terminal_log_capacity() -> usize {
    100
}

fn default_scaling_log_capacity() -> usize {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            env: default_env_name(),
            listen_addr: default_listen_addr(),
            poll_interval_secs: default_poll_interval_secs(),
            autoscale_interval_secs: default_autoscale_interval_secs(),
            feed_capacity: default_feed_capacity(),
            terminal_log_capacity: default_terminal_log_capacity(),
            scaling_log_capacity: default_scaling_log_capacity(),
            docker: default_docker_environment(),
            kubernetes: default_kubernetes_environment(),
            notifications: NotificationConfig::default(),
            assistant: AssistantConfig::default(),
            report: ReportConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_path(path: &str) -> Result<ServerConfig> {
        let config_str = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&config_str)
    }

    pub fn from_yaml_str(config_str: &str) -> Result<ServerConfig> {
        let config: ServerConfig = Figment::new().merge(Yaml::string(config_str)).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(anyhow::anyhow!(
                "invalid listen address: {}",
                self.listen_addr
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(anyhow::anyhow!("poll_interval_secs must be at least 1"));
        }
        if self.autoscale_interval_secs == 0 {
            return Err(anyhow::anyhow!(
                "autoscale_interval_secs must be at least 1"
            ));
        }
        if self.feed_capacity == 0 {
            return Err(anyhow::anyhow!("feed_capacity must be at least 1"));
        }
        if self.report.hour_utc > 23 {
            return Err(anyhow::anyhow!(
                "report.hour_utc must be 0..=23, got {}",
                self.report.hour_utc
            ));
        }
        self.report.parsed_weekday()?;
        Ok(())
    }

    pub fn environment(&self, env: Environment) -> &EnvironmentConfig {
        match env {
            Environment::Docker => &self.docker,
            Environment::Kubernetes => &self.kubernetes,
        }
    }

    pub fn structured_logging(&self) -> bool {
        self.env != LOCAL_ENV
    }
}
