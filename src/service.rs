use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum_server::Handle;
use tokio::{signal, sync::watch};
use tracing::{info, warn};

use crate::{
    assistant::{Assistant, HttpAssistant},
    autoscaler::Autoscaler,
    config::ServerConfig,
    control_plane::{ControlPlane, ShellControlPlane},
    dispatcher::ActionDispatcher,
    notify::NotifierSet,
    poller::Poller,
    reporter::WeeklyReporter,
    routes::{create_routes, routes_state::RouteState},
    state_store::ConvoyState,
};

/// Owns every long-lived part of the engine and wires them to a shared
/// shutdown channel. Dropping the service after `start` returns means all
/// loops have observed the signal.
pub struct Service {
    pub config: Arc<ServerConfig>,
    shutdown_tx: watch::Sender<()>,
    shutdown_rx: watch::Receiver<()>,
    convoy_state: Arc<ConvoyState>,
    dispatcher: Arc<ActionDispatcher>,
    assistant: Arc<dyn Assistant>,
    notifiers: Arc<NotifierSet>,
    poller: Arc<Poller>,
    autoscaler: Arc<Autoscaler>,
    reporter: Arc<WeeklyReporter>,
}

impl Service {
    pub fn new(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let (shutdown_tx, shutdown_rx) = watch::channel(());

        let convoy_state = Arc::new(ConvoyState::new(&config));
        let control_plane: Arc<dyn ControlPlane> = Arc::new(ShellControlPlane);
        let dispatcher = Arc::new(ActionDispatcher::new(
            convoy_state.clone(),
            control_plane.clone(),
            config.clone(),
        ));
        let notifiers = Arc::new(NotifierSet::from_config(&config.notifications));
        let assistant: Arc<dyn Assistant> = Arc::new(HttpAssistant::new(config.assistant.clone()));
        let poller = Arc::new(Poller::new(
            convoy_state.clone(),
            control_plane,
            config.clone(),
        ));
        let autoscaler = Arc::new(Autoscaler::new(
            convoy_state.clone(),
            dispatcher.clone(),
            notifiers.clone(),
            config.clone(),
        ));
        let reporter = Arc::new(WeeklyReporter::new(
            convoy_state.clone(),
            notifiers.clone(),
            config.clone(),
        ));

        Ok(Self {
            config,
            shutdown_tx,
            shutdown_rx,
            convoy_state,
            dispatcher,
            assistant,
            notifiers,
            poller,
            autoscaler,
            reporter,
        })
    }

    pub async fn start(self) -> Result<()> {
        let handle = Handle::new();
        let handle_sh = handle.clone();
        let shutdown_tx = self.shutdown_tx.clone();

        tokio::spawn(self.poller.clone().start(self.shutdown_rx.clone()));
        tokio::spawn(self.autoscaler.clone().start(self.shutdown_rx.clone()));
        tokio::spawn(self.reporter.clone().start(self.shutdown_rx.clone()));
        tokio::spawn(async move {
            shutdown_signal(handle_sh, shutdown_tx).await;
        });

        let route_state = RouteState {
            convoy_state: self.convoy_state.clone(),
            dispatcher: self.dispatcher.clone(),
            assistant: self.assistant.clone(),
            config: self.config.clone(),
        };
        let routes = create_routes(route_state);

        let addr: SocketAddr = self.config.listen_addr.parse()?;
        if self.notifiers.is_empty() {
            warn!("no notification transports configured");
        }
        info!(
            notifier_transports = self.notifiers.len(),
            "starting convoy server on {}", addr
        );
        axum_server::bind(addr)
            .handle(handle)
            .serve(routes.into_make_service())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal(handle: Handle, shutdown_tx: watch::Sender<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("received Ctrl+C signal");
        },
        _ = terminate => {
            info!("received SIGTERM signal");
        },
    }
    info!("signal received, shutting down server gracefully");
    handle.shutdown();
    let _ = shutdown_tx.send(());
}
