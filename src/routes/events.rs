use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::{Stream, StreamExt};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};

use crate::{
    data_model::{Environment, FeedEvent},
    http_objects::{parse_environment, ConvoyAPIError},
    routes::routes_state::RouteState,
};

pub(crate) const HEARTBEAT_MESSAGE: &str = "no new events";

/// Live feed for one environment, pushed as server-sent events at one
/// message per second.
#[utoipa::path(
    get,
    path = "/v1/environments/{env}/events",
    tag = "convoy",
    responses(
        (status = 200, description = "SSE stream of feed events; one message per second, heartbeats when idle"),
        (status = 400, description = "Unknown environment")
    ),
)]
pub(crate) async fn environment_events(
    Path(env): Path<String>,
    State(state): State<RouteState>,
) -> Result<Response, ConvoyAPIError> {
    let env = parse_environment(&env)?;
    let rx = state.convoy_state.feed.subscribe(env);
    info!(environment = %env, "feed subscriber connected");

    let stream = feed_event_stream(rx, env).map(|event| Event::default().json_data(event));
    Ok(Sse::new(stream)
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(1)))
        .into_response())
}

/// One message per tick: the subscriber's next queued event, or a synthetic
/// heartbeat when its queue is empty. A lagged subscriber logs the skip and
/// resumes at the oldest event still retained; it never stalls the
/// publisher.
pub(crate) fn feed_event_stream(
    mut rx: broadcast::Receiver<FeedEvent>,
    env: Environment,
) -> impl Stream<Item = FeedEvent> {
    async_stream::stream! {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            match rx.try_recv() {
                Ok(event) => yield event,
                Err(TryRecvError::Empty) => yield FeedEvent::now(HEARTBEAT_MESSAGE),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(
                        environment = %env,
                        skipped,
                        "feed subscriber lagged, resuming at oldest retained event"
                    );
                    // the cursor has already advanced past the gap
                    match rx.try_recv() {
                        Ok(event) => yield event,
                        Err(_) => yield FeedEvent::now(HEARTBEAT_MESSAGE),
                    }
                }
                Err(TryRecvError::Closed) => {
                    info!(environment = %env, "feed closed, ending stream");
                    break;
                }
            }
        }
    }
}
