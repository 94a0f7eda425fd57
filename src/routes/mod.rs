use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use hyper::Method;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use utoipa::OpenApi;

use crate::{
    data_model::Environment,
    http_objects::{
        parse_environment, ActionResponse, AssistantRequest, AssistantResponse, ConvoyAPIError,
        EnvironmentOverview, ExecRequest, OverviewResponse, ResourceListResponse,
        ScalingEventItem, ScalingEventsResponse, ScenarioItem, ScenarioListResponse,
        SetActiveEnvironmentRequest, TerminalLogResponse, TranscriptItem,
    },
    routes::routes_state::RouteState,
    scenarios,
};

pub mod events;
pub mod routes_state;

#[derive(OpenApi)]
#[openapi(
    paths(
        index,
        healthz,
        overview,
        set_active_environment,
        list_resources,
        create_resource,
        remove_resource,
        exec_in_resource,
        list_scenarios,
        activate_scenario,
        events::environment_events,
        terminal_log,
        scaling_events,
        assistant_prompt,
    ),
    components(schemas(
        OverviewResponse,
        EnvironmentOverview,
        ResourceListResponse,
        SetActiveEnvironmentRequest,
        ExecRequest,
        ActionResponse,
        ScenarioItem,
        ScenarioListResponse,
        TranscriptItem,
        TerminalLogResponse,
        ScalingEventItem,
        ScalingEventsResponse,
        AssistantRequest,
        AssistantResponse,
    )),
    tags((name = "convoy", description = "Convoy server api"))
)]
pub struct ApiDoc;

pub fn create_routes(route_state: RouteState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/docs/openapi.json", get(openapi_json))
        .route(
            "/v1/overview",
            get(overview).with_state(route_state.clone()),
        )
        .route(
            "/v1/active_environment",
            put(set_active_environment).with_state(route_state.clone()),
        )
        .route(
            "/v1/environments/{env}/resources",
            get(list_resources).with_state(route_state.clone()),
        )
        .route(
            "/v1/environments/{env}/resources",
            post(create_resource).with_state(route_state.clone()),
        )
        .route(
            "/v1/environments/{env}/resources/{name}",
            delete(remove_resource).with_state(route_state.clone()),
        )
        .route(
            "/v1/environments/{env}/resources/{name}/exec",
            post(exec_in_resource).with_state(route_state.clone()),
        )
        .route(
            "/v1/environments/{env}/scenarios",
            get(list_scenarios).with_state(route_state.clone()),
        )
        .route(
            "/v1/environments/{env}/scenarios/{index}",
            post(activate_scenario).with_state(route_state.clone()),
        )
        .route(
            "/v1/environments/{env}/events",
            get(events::environment_events).with_state(route_state.clone()),
        )
        .route(
            "/v1/terminal_log",
            get(terminal_log).with_state(route_state.clone()),
        )
        .route(
            "/v1/scaling_events",
            get(scaling_events).with_state(route_state.clone()),
        )
        .route(
            "/v1/assistant",
            post(assistant_prompt).with_state(route_state),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "convoy",
    responses((status = 200, description = "Server banner")),
)]
async fn index() -> &'static str {
    "Convoy Server"
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "convoy",
    responses((status = 200, description = "Service is live")),
)]
async fn healthz() -> &'static str {
    "ok"
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Active environment plus per-environment pool counts.
#[utoipa::path(
    get,
    path = "/v1/overview",
    tag = "convoy",
    responses(
        (status = 200, description = "Engine overview", body = OverviewResponse),
    ),
)]
pub(crate) async fn overview(
    State(state): State<RouteState>,
) -> Result<Json<OverviewResponse>, ConvoyAPIError> {
    let active = state.convoy_state.active_environment().await;
    let mut environments = Vec::new();
    for env in Environment::ALL {
        environments.push(EnvironmentOverview {
            environment: env.to_string(),
            resource_count: state.convoy_state.resource_count(env).await,
            autoscale_floor: state.config.environment(env).autoscale_floor,
            last_poll_ms: state.convoy_state.last_poll_ms(env).await,
        });
    }
    Ok(Json(OverviewResponse {
        active_environment: active.to_string(),
        environments,
    }))
}

/// Switch which environment the autoscaler and default views act on.
#[utoipa::path(
    put,
    path = "/v1/active_environment",
    tag = "convoy",
    request_body = SetActiveEnvironmentRequest,
    responses(
        (status = 200, description = "Active environment switched"),
        (status = 400, description = "Unknown environment")
    ),
)]
pub(crate) async fn set_active_environment(
    State(state): State<RouteState>,
    Json(request): Json<SetActiveEnvironmentRequest>,
) -> Result<(), ConvoyAPIError> {
    let env = parse_environment(&request.environment)?;
    state.convoy_state.set_active_environment(env).await;
    info!(environment = %env, "active environment switched");
    state
        .convoy_state
        .feed
        .publish(env, format!("active environment switched to {env}"));
    Ok(())
}

/// Point-in-time copy of one environment's snapshot.
#[utoipa::path(
    get,
    path = "/v1/environments/{env}/resources",
    tag = "convoy",
    params(("env" = String, Path, description = "Environment name (docker|k8s)")),
    responses(
        (status = 200, description = "Resource name to status mapping", body = ResourceListResponse),
        (status = 400, description = "Unknown environment")
    ),
)]
pub(crate) async fn list_resources(
    Path(env): Path<String>,
    State(state): State<RouteState>,
) -> Result<Json<ResourceListResponse>, ConvoyAPIError> {
    let env = parse_environment(&env)?;
    Ok(Json(ResourceListResponse {
        environment: env.to_string(),
        resources: state.convoy_state.resources(env).await,
    }))
}

/// Create a resource with a name synthesized from the snapshot cardinality.
#[utoipa::path(
    post,
    path = "/v1/environments/{env}/resources",
    tag = "convoy",
    params(("env" = String, Path, description = "Environment name (docker|k8s)")),
    responses(
        (status = 200, description = "Creation outcome", body = ActionResponse),
        (status = 400, description = "Unknown environment")
    ),
)]
pub(crate) async fn create_resource(
    Path(env): Path<String>,
    State(state): State<RouteState>,
) -> Result<Json<ActionResponse>, ConvoyAPIError> {
    let env = parse_environment(&env)?;
    Ok(Json(state.dispatcher.create_resource(env).await.into()))
}

/// Remove a resource by name. The delete is issued even for names the
/// snapshot does not contain; the environment CLI decides.
#[utoipa::path(
    delete,
    path = "/v1/environments/{env}/resources/{name}",
    tag = "convoy",
    params(
        ("env" = String, Path, description = "Environment name (docker|k8s)"),
        ("name" = String, Path, description = "Resource name")
    ),
    responses(
        (status = 200, description = "Removal outcome", body = ActionResponse),
        (status = 400, description = "Unknown environment")
    ),
)]
pub(crate) async fn remove_resource(
    Path((env, name)): Path<(String, String)>,
    State(state): State<RouteState>,
) -> Result<Json<ActionResponse>, ConvoyAPIError> {
    let env = parse_environment(&env)?;
    Ok(Json(state.dispatcher.remove_resource(env, &name).await.into()))
}

/// Run a command inside a resource and capture its combined output.
#[utoipa::path(
    post,
    path = "/v1/environments/{env}/resources/{name}/exec",
    tag = "convoy",
    request_body = ExecRequest,
    params(
        ("env" = String, Path, description = "Environment name (docker|k8s)"),
        ("name" = String, Path, description = "Resource name")
    ),
    responses(
        (status = 200, description = "Captured output", body = ActionResponse),
        (status = 400, description = "Unknown environment or empty command")
    ),
)]
pub(crate) async fn exec_in_resource(
    Path((env, name)): Path<(String, String)>,
    State(state): State<RouteState>,
    Json(request): Json<ExecRequest>,
) -> Result<Json<ActionResponse>, ConvoyAPIError> {
    let env = parse_environment(&env)?;
    if request.command.trim().is_empty() {
        return Err(ConvoyAPIError::bad_request("command must not be empty"));
    }
    Ok(Json(
        state
            .dispatcher
            .exec_in_resource(env, &name, &request.command)
            .await
            .into(),
    ))
}

/// The environment's scenario catalog, in activation-index order.
#[utoipa::path(
    get,
    path = "/v1/environments/{env}/scenarios",
    tag = "convoy",
    params(("env" = String, Path, description = "Environment name (docker|k8s)")),
    responses(
        (status = 200, description = "Scenario catalog", body = ScenarioListResponse),
        (status = 400, description = "Unknown environment")
    ),
)]
pub(crate) async fn list_scenarios(
    Path(env): Path<String>,
    State(_state): State<RouteState>,
) -> Result<Json<ScenarioListResponse>, ConvoyAPIError> {
    let env = parse_environment(&env)?;
    let scenarios = scenarios::catalog(env)
        .iter()
        .enumerate()
        .map(|(index, scenario)| ScenarioItem {
            index,
            title: scenario.title.clone(),
            description: scenario.description.clone(),
            command: scenario.command.clone(),
        })
        .collect();
    Ok(Json(ScenarioListResponse {
        environment: env.to_string(),
        scenarios,
    }))
}

/// Activate a catalog scenario by index. Out-of-range indices no-op.
#[utoipa::path(
    post,
    path = "/v1/environments/{env}/scenarios/{index}",
    tag = "convoy",
    params(
        ("env" = String, Path, description = "Environment name (docker|k8s)"),
        ("index" = usize, Path, description = "Catalog index")
    ),
    responses(
        (status = 200, description = "Activation outcome", body = ActionResponse),
        (status = 400, description = "Unknown environment")
    ),
)]
pub(crate) async fn activate_scenario(
    Path((env, index)): Path<(String, usize)>,
    State(state): State<RouteState>,
) -> Result<Json<ActionResponse>, ConvoyAPIError> {
    let env = parse_environment(&env)?;
    Ok(Json(
        state.dispatcher.activate_scenario(env, index).await.into(),
    ))
}

/// Most recent command transcripts, oldest first.
#[utoipa::path(
    get,
    path = "/v1/terminal_log",
    tag = "convoy",
    responses(
        (status = 200, description = "Retained transcripts", body = TerminalLogResponse),
    ),
)]
pub(crate) async fn terminal_log(
    State(state): State<RouteState>,
) -> Result<Json<TerminalLogResponse>, ConvoyAPIError> {
    let transcripts = state
        .convoy_state
        .terminal_log()
        .await
        .into_iter()
        .map(TranscriptItem::from)
        .collect();
    Ok(Json(TerminalLogResponse { transcripts }))
}

/// Retained autoscale actions, oldest first.
#[utoipa::path(
    get,
    path = "/v1/scaling_events",
    tag = "convoy",
    responses(
        (status = 200, description = "Retained scaling events", body = ScalingEventsResponse),
    ),
)]
pub(crate) async fn scaling_events(
    State(state): State<RouteState>,
) -> Result<Json<ScalingEventsResponse>, ConvoyAPIError> {
    let events = state
        .convoy_state
        .scaling_events()
        .await
        .into_iter()
        .map(ScalingEventItem::from)
        .collect();
    Ok(Json(ScalingEventsResponse { events }))
}

/// Ask the assistant about the current fleet; the snapshot summary is
/// passed along as context.
#[utoipa::path(
    post,
    path = "/v1/assistant",
    tag = "convoy",
    request_body = AssistantRequest,
    responses(
        (status = 200, description = "Assistant reply", body = AssistantResponse),
    ),
)]
pub(crate) async fn assistant_prompt(
    State(state): State<RouteState>,
    Json(request): Json<AssistantRequest>,
) -> Result<Json<AssistantResponse>, ConvoyAPIError> {
    let context = snapshot_context(&state).await;
    let reply = state.assistant.respond(&request.prompt, &context).await;
    Ok(Json(AssistantResponse { reply }))
}

async fn snapshot_context(state: &RouteState) -> String {
    let active = state.convoy_state.active_environment().await;
    let mut parts = vec![format!("active environment: {active}")];
    for env in Environment::ALL {
        let resources = state.convoy_state.resources(env).await;
        let mut entries: Vec<String> = resources
            .iter()
            .map(|(name, status)| format!("{name} ({status})"))
            .collect();
        entries.sort();
        parts.push(format!(
            "{env} resources [{}]: {}",
            entries.len(),
            entries.join(", ")
        ));
    }
    parts.join("\n")
}
