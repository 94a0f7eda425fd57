use std::sync::Arc;

use crate::{
    assistant::Assistant, config::ServerConfig, dispatcher::ActionDispatcher,
    state_store::ConvoyState,
};

#[derive(Clone)]
pub struct RouteState {
    pub convoy_state: Arc<ConvoyState>,
    pub dispatcher: Arc<ActionDispatcher>,
    pub assistant: Arc<dyn Assistant>,
    pub config: Arc<ServerConfig>,
}
