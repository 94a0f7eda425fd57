use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
    Mutex,
};

use anyhow::Result;
use async_trait::async_trait;
use tracing::subscriber;
use tracing_subscriber::{layer::SubscriberExt, Layer};

use crate::{
    assistant::{Assistant, HttpAssistant},
    autoscaler::Autoscaler,
    config::ServerConfig,
    control_plane::{CommandOutput, ControlPlane},
    dispatcher::ActionDispatcher,
    notify::{Notifier, NotifierSet},
    poller::Poller,
    reporter::WeeklyReporter,
    routes::routes_state::RouteState,
    state_store::ConvoyState,
};

pub fn ok_output(stdout: &str) -> CommandOutput {
    CommandOutput {
        ok: true,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn err_output(stderr: &str) -> CommandOutput {
    CommandOutput {
        ok: false,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

/// Control plane stand-in that answers from prefix rules and records every
/// command it was asked to run. Commands with no matching rule succeed with
/// empty output.
pub struct MockControlPlane {
    rules: Mutex<Vec<(String, CommandOutput)>>,
    calls: Mutex<Vec<String>>,
}

impl MockControlPlane {
    pub fn new() -> Self {
        MockControlPlane {
            rules: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// First rule whose prefix matches wins. Registering the same prefix
    /// again replaces its output, so tests can change answers between polls.
    pub fn on_command(&self, prefix: &str, output: CommandOutput) {
        let mut rules = self.rules.lock().unwrap();
        if let Some(rule) = rules.iter_mut().find(|(p, _)| p == prefix) {
            rule.1 = output;
        } else {
            rules.push((prefix.to_string(), output));
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn execute(&self, command: &str) -> CommandOutput {
        self.calls.lock().unwrap().push(command.to_string());
        let rules = self.rules.lock().unwrap();
        for (prefix, output) in rules.iter() {
            if command.starts_with(prefix.as_str()) {
                return output.clone();
            }
        }
        ok_output("")
    }
}

/// Notifier that counts deliveries and keeps the last body for assertions.
pub struct CountingNotifier {
    pub name: &'static str,
    pub fail: bool,
    pub deliveries: Arc<AtomicUsize>,
    pub last_body: Arc<Mutex<Option<String>>>,
}

impl CountingNotifier {
    pub fn new(name: &'static str, fail: bool) -> (Self, Arc<AtomicUsize>, Arc<Mutex<Option<String>>>) {
        let deliveries = Arc::new(AtomicUsize::new(0));
        let last_body = Arc::new(Mutex::new(None));
        (
            CountingNotifier {
                name,
                fail,
                deliveries: deliveries.clone(),
                last_body: last_body.clone(),
            },
            deliveries,
            last_body,
        )
    }
}

#[async_trait]
impl Notifier for CountingNotifier {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn notify(&self, _subject: &str, body: &str) -> Result<()> {
        self.deliveries.fetch_add(1, Ordering::SeqCst);
        *self.last_body.lock().unwrap() = Some(body.to_string());
        if self.fail {
            anyhow::bail!("transport down");
        }
        Ok(())
    }
}

/// Engine wired against [`MockControlPlane`], with small retention limits so
/// eviction is reachable in tests.
pub struct TestService {
    pub config: Arc<ServerConfig>,
    pub state: Arc<ConvoyState>,
    pub control_plane: Arc<MockControlPlane>,
    pub dispatcher: Arc<ActionDispatcher>,
    pub poller: Arc<Poller>,
}

impl TestService {
    pub fn new() -> Self {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trace"));
        let _ = subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_filter(env_filter)),
        );

        let config = Arc::new(ServerConfig {
            feed_capacity: 8,
            terminal_log_capacity: 4,
            scaling_log_capacity: 4,
            ..Default::default()
        });
        let state = Arc::new(ConvoyState::new(&config));
        let control_plane = Arc::new(MockControlPlane::new());
        let dispatcher = Arc::new(ActionDispatcher::new(
            state.clone(),
            control_plane.clone(),
            config.clone(),
        ));
        let poller = Arc::new(Poller::new(
            state.clone(),
            control_plane.clone(),
            config.clone(),
        ));

        TestService {
            config,
            state,
            control_plane,
            dispatcher,
            poller,
        }
    }

    pub fn autoscaler(&self, notifiers: Arc<NotifierSet>) -> Autoscaler {
        Autoscaler::new(
            self.state.clone(),
            self.dispatcher.clone(),
            notifiers,
            self.config.clone(),
        )
    }

    pub fn reporter(&self, notifiers: Arc<NotifierSet>) -> WeeklyReporter {
        WeeklyReporter::new(self.state.clone(), notifiers, self.config.clone())
    }

    /// The assistant is left unconfigured so prompts resolve to the
    /// placeholder without any network traffic.
    pub fn route_state(&self) -> RouteState {
        let assistant: Arc<dyn Assistant> =
            Arc::new(HttpAssistant::new(self.config.assistant.clone()));
        RouteState {
            convoy_state: self.state.clone(),
            dispatcher: self.dispatcher.clone(),
            assistant,
            config: self.config.clone(),
        }
    }
}
