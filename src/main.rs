use std::path::PathBuf;

use ::tracing::{error, info_span};
use clap::Parser;
use service::Service;

mod assistant;
mod autoscaler;
mod config;
mod control_plane;
mod data_model;
mod dispatcher;
mod http_objects;
#[cfg(test)]
mod integration_test_http_routes;
mod notify;
mod poller;
mod reporter;
mod routes;
mod scenarios;
mod service;
mod state_store;
mod tracing;
use tracing::setup_tracing;
mod utils;

#[cfg(test)]
mod testing;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "config file", help = "Path to config file")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = match cli.config {
        Some(path) => config::ServerConfig::from_path(path.to_str().unwrap()).unwrap(),
        None => config::ServerConfig::default(),
    };

    // the guard flushes buffered log lines when main returns
    let _log_guard = setup_tracing(&config)
        .inspect_err(|e| {
            error!("Error setting up tracing: {:?}", e);
        })
        .unwrap();

    let root_span = info_span!("convoy", env = config.env);
    let _guard = root_span.enter();

    let service = Service::new(config);
    if let Err(err) = service {
        error!("Error creating service: {:?}", err);
        return;
    }
    if let Err(err) = service.unwrap().start().await {
        error!("Error starting service: {:?}", err);
    }
}
