use std::{sync::Arc, time::Duration};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    config::ServerConfig, dispatcher::ActionDispatcher, notify::NotifierSet,
    state_store::ConvoyState,
};

/// Keeps the active environment's pool at its configured floor, growing by
/// at most one resource per tick so a drained pool recovers gradually.
pub struct Autoscaler {
    state: Arc<ConvoyState>,
    dispatcher: Arc<ActionDispatcher>,
    notifiers: Arc<NotifierSet>,
    config: Arc<ServerConfig>,
}

impl Autoscaler {
    pub fn new(
        state: Arc<ConvoyState>,
        dispatcher: Arc<ActionDispatcher>,
        notifiers: Arc<NotifierSet>,
        config: Arc<ServerConfig>,
    ) -> Self {
        Autoscaler {
            state,
            dispatcher,
            notifiers,
            config,
        }
    }

    pub async fn start(self: Arc<Self>, mut shutdown_rx: watch::Receiver<()>) {
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.autoscale_interval_secs));
        // consume the immediate first tick so decisions wait for a populated
        // snapshot
        interval.tick().await;
        info!(
            interval_secs = self.config.autoscale_interval_secs,
            "autoscaler started"
        );
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick().await;
                }
                _ = shutdown_rx.changed() => {
                    info!("autoscaler shutting down");
                    break;
                }
            }
        }
    }

    /// One enforcement pass. Only the active environment is considered;
    /// inactive pools are left alone regardless of their size.
    #[tracing::instrument(skip_all)]
    pub async fn tick(&self) {
        let env = self.state.active_environment().await;
        let count = self.state.resource_count(env).await;
        let floor = self.config.environment(env).autoscale_floor;
        if count >= floor {
            return;
        }

        let result = self.dispatcher.create_resource(env).await;
        if !result.ok {
            warn!(
                environment = %env,
                message = %result.message,
                "autoscale creation failed"
            );
            return;
        }

        let description = format!(
            "autoscale: {} in {env} ({count} < floor {floor})",
            result.message
        );
        self.state.record_scaling_event(env, &description).await;
        info!(environment = %env, count, floor, "grew pool toward floor");
        self.notifiers
            .notify_all(&format!("Autoscale action in {env}"), &description)
            .await;
    }
}
