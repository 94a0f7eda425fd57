use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Datelike, Timelike, Utc};
use tokio::sync::watch;
use tracing::info;

use crate::{
    config::ServerConfig, data_model::Environment, notify::NotifierSet, state_store::ConvoyState,
};

const RECENT_EVENTS_IN_REPORT: usize = 10;

/// Sends a summary through every transport when the wall clock crosses the
/// configured weekday + hour (UTC). After firing it sleeps past the window
/// so the same week never reports twice; otherwise it re-checks hourly.
pub struct WeeklyReporter {
    state: Arc<ConvoyState>,
    notifiers: Arc<NotifierSet>,
    config: Arc<ServerConfig>,
}

impl WeeklyReporter {
    pub fn new(
        state: Arc<ConvoyState>,
        notifiers: Arc<NotifierSet>,
        config: Arc<ServerConfig>,
    ) -> Self {
        WeeklyReporter {
            state,
            notifiers,
            config,
        }
    }

    pub async fn start(self: Arc<Self>, mut shutdown_rx: watch::Receiver<()>) {
        info!(
            weekday = %self.config.report.weekday,
            hour_utc = self.config.report.hour_utc,
            "weekly reporter started"
        );
        loop {
            let sleep_for = if self.should_fire(Utc::now()) {
                self.send_report().await;
                Duration::from_secs(24 * 60 * 60)
            } else {
                Duration::from_secs(60 * 60)
            };
            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                _ = shutdown_rx.changed() => {
                    info!("weekly reporter shutting down");
                    break;
                }
            }
        }
    }

    /// True when `now` is inside the configured weekly window.
    pub fn should_fire(&self, now: DateTime<Utc>) -> bool {
        let Ok(weekday) = self.config.report.parsed_weekday() else {
            // weekday is validated at startup; never fire on a broken config
            return false;
        };
        now.weekday() == weekday && now.hour() == self.config.report.hour_utc
    }

    async fn send_report(&self) {
        let report = self.build_report().await;
        info!("sending weekly report");
        self.notifiers
            .notify_all("Convoy weekly report", &report)
            .await;
    }

    pub async fn build_report(&self) -> String {
        let active = self.state.active_environment().await;
        let mut lines = vec![format!("active environment: {active}")];
        for env in Environment::ALL {
            lines.push(format!(
                "{env}: {} resources",
                self.state.resource_count(env).await
            ));
        }

        let scaling = self.state.scaling_events().await;
        lines.push(format!("autoscale actions retained: {}", scaling.len()));
        for event in scaling.iter().rev().take(RECENT_EVENTS_IN_REPORT) {
            lines.push(format!(
                "  [{}] {}",
                event.at.format("%Y-%m-%d %H:%M"),
                event.message
            ));
        }
        lines.join("\n")
    }
}
