#[cfg(test)]
mod tests {
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
        Json,
    };

    use crate::{
        assistant::ASSISTANT_UNAVAILABLE,
        data_model::Environment,
        http_objects::{AssistantRequest, ExecRequest, SetActiveEnvironmentRequest},
        routes::{
            activate_scenario, assistant_prompt, create_resource, exec_in_resource,
            list_resources, list_scenarios, overview, set_active_environment, terminal_log,
        },
        testing::{ok_output, TestService},
    };

    #[tokio::test]
    async fn overview_reports_counts_and_active_environment() {
        let srv = TestService::new();
        srv.control_plane
            .on_command("docker ps", ok_output("web Up\napi Up"));
        srv.poller.poll_once().await;

        let Json(body) = overview(State(srv.route_state())).await.unwrap();

        assert_eq!("docker", body.active_environment);
        assert_eq!(2, body.environments.len());
        let docker = &body.environments[0];
        assert_eq!("docker", docker.environment);
        assert_eq!(2, docker.resource_count);
        assert_eq!(5, docker.autoscale_floor);
        assert!(docker.last_poll_ms.is_some());
        let kubernetes = &body.environments[1];
        assert_eq!("k8s", kubernetes.environment);
        assert_eq!(0, kubernetes.resource_count);
        assert_eq!(3, kubernetes.autoscale_floor);
    }

    #[tokio::test]
    async fn create_route_returns_the_dispatch_outcome() {
        let srv = TestService::new();

        let Json(body) = create_resource(Path("docker".to_string()), State(srv.route_state()))
            .await
            .unwrap();

        assert!(body.ok);
        assert_eq!("created container_1", body.message);
    }

    #[tokio::test]
    async fn unknown_environment_is_rejected() {
        let srv = TestService::new();

        let err = list_resources(Path("mesos".to_string()), State(srv.route_state()))
            .await
            .unwrap_err();

        let response = err.into_response();
        assert_eq!(StatusCode::BAD_REQUEST, response.status());
    }

    #[tokio::test]
    async fn set_active_environment_switches_and_publishes() {
        let srv = TestService::new();
        let mut rx = srv.state.feed.subscribe(Environment::Kubernetes);

        set_active_environment(
            State(srv.route_state()),
            Json(SetActiveEnvironmentRequest {
                environment: "k8s".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(
            Environment::Kubernetes,
            srv.state.active_environment().await
        );
        assert_eq!(
            "active environment switched to k8s",
            rx.recv().await.unwrap().message
        );
    }

    #[tokio::test]
    async fn exec_route_rejects_blank_commands() {
        let srv = TestService::new();

        let err = exec_in_resource(
            Path(("docker".to_string(), "web".to_string())),
            State(srv.route_state()),
            Json(ExecRequest {
                command: "   ".to_string(),
            }),
        )
        .await
        .unwrap_err();

        let response = err.into_response();
        assert_eq!(StatusCode::BAD_REQUEST, response.status());
        assert_eq!(0, srv.control_plane.call_count());
    }

    #[tokio::test]
    async fn scenarios_route_lists_the_full_catalog() {
        let srv = TestService::new();

        let Json(body) = list_scenarios(Path("docker".to_string()), State(srv.route_state()))
            .await
            .unwrap();

        assert_eq!("docker", body.environment);
        assert_eq!(100, body.scenarios.len());
        assert_eq!(0, body.scenarios[0].index);
        assert_eq!("Nginx with published port", body.scenarios[0].title);
        assert_eq!("Demo scenario 99", body.scenarios[99].title);
    }

    #[tokio::test]
    async fn out_of_range_activation_surfaces_as_a_noop() {
        let srv = TestService::new();

        let Json(body) = activate_scenario(
            Path(("k8s".to_string(), 100)),
            State(srv.route_state()),
        )
        .await
        .unwrap();

        assert!(body.ok);
        assert!(body.message.is_empty());
        assert_eq!(0, srv.control_plane.call_count());
    }

    #[tokio::test]
    async fn terminal_log_route_returns_retained_transcripts() {
        let srv = TestService::new();
        srv.dispatcher
            .exec_in_resource(Environment::Docker, "web", "uptime")
            .await;

        let Json(body) = terminal_log(State(srv.route_state())).await.unwrap();

        assert_eq!(1, body.transcripts.len());
        assert_eq!("docker exec web uptime", body.transcripts[0].command);
    }

    #[tokio::test]
    async fn assistant_route_degrades_to_placeholder_when_unconfigured() {
        let srv = TestService::new();

        let Json(body) = assistant_prompt(
            State(srv.route_state()),
            Json(AssistantRequest {
                prompt: "what is running right now?".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(ASSISTANT_UNAVAILABLE, body.reply);
    }
}
