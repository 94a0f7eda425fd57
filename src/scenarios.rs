use once_cell::sync::Lazy;

use crate::data_model::{Environment, Scenario};

/// Catalog size per environment. Indices are stable: a scenario's position
/// is its activation index.
pub const CATALOG_SIZE: usize = 100;

static DOCKER_CATALOG: Lazy<Vec<Scenario>> = Lazy::new(|| build_catalog(Environment::Docker));
static KUBERNETES_CATALOG: Lazy<Vec<Scenario>> =
    Lazy::new(|| build_catalog(Environment::Kubernetes));

pub fn catalog(env: Environment) -> &'static [Scenario] {
    match env {
        Environment::Docker => &DOCKER_CATALOG,
        Environment::Kubernetes => &KUBERNETES_CATALOG,
    }
}

pub fn get(env: Environment, index: usize) -> Option<&'static Scenario> {
    catalog(env).get(index)
}

fn build_catalog(env: Environment) -> Vec<Scenario> {
    let mut scenarios = curated(env);
    for index in scenarios.len()..CATALOG_SIZE {
        scenarios.push(Scenario {
            title: format!("Demo scenario {index}"),
            description: format!("Placeholder exercise #{index} for the {env} environment"),
            command: format!("echo 'demo scenario {index} for {env}'"),
        });
    }
    scenarios
}

fn scenario(title: &str, description: &str, command: &str) -> Scenario {
    Scenario {
        title: title.to_string(),
        description: description.to_string(),
        command: command.to_string(),
    }
}

fn curated(env: Environment) -> Vec<Scenario> {
    match env {
        Environment::Docker => vec![
            scenario(
                "Nginx with published port",
                "Start nginx and publish it on a host port",
                "docker run -d --name demo_nginx -p 8080:80 nginx:alpine",
            ),
            scenario(
                "Redis cache",
                "Start a redis instance for ad-hoc experiments",
                "docker run -d --name demo_redis redis:alpine",
            ),
            scenario(
                "Postgres database",
                "Start postgres with a throwaway password",
                "docker run -d --name demo_postgres -e POSTGRES_PASSWORD=demo postgres:16-alpine",
            ),
            scenario(
                "One-shot job",
                "Run a container to completion and remove it",
                "docker run --rm busybox:latest echo job complete",
            ),
            scenario(
                "Alpine sleeper",
                "Keep a minimal container alive for an hour",
                "docker run -d --name demo_sleeper alpine:latest sleep 3600",
            ),
            scenario(
                "Httpd static site",
                "Serve the Apache default page on a host port",
                "docker run -d --name demo_httpd -p 8081:80 httpd:alpine",
            ),
            scenario(
                "Disk usage report",
                "Show image, container and volume disk usage",
                "docker system df",
            ),
            scenario(
                "Prune stopped containers",
                "Reclaim space from exited containers",
                "docker container prune -f",
            ),
            scenario(
                "Kernel info probe",
                "Print the kernel the container runtime sees",
                "docker run --rm busybox:latest uname -a",
            ),
            scenario(
                "Memory check",
                "Report free memory from inside a container",
                "docker run --rm busybox:latest free -m",
            ),
        ],
        Environment::Kubernetes => vec![
            scenario(
                "Create demo namespace",
                "Create a scratch namespace for the other demos",
                "kubectl create namespace demo-space",
            ),
            scenario(
                "Nginx deployment",
                "Deploy nginx into the demo namespace",
                "kubectl -n demo-space create deployment demo-nginx --image=nginx:alpine",
            ),
            scenario(
                "Expose nginx via NodePort",
                "Publish the nginx deployment outside the cluster",
                "kubectl -n demo-space expose deployment demo-nginx --port=80 --type=NodePort --name demo-nginx-svc",
            ),
            scenario(
                "Scale nginx deployment",
                "Scale the demo deployment to three replicas",
                "kubectl -n demo-space scale deployment demo-nginx --replicas=3",
            ),
            scenario(
                "One-shot job",
                "Run a job to completion in the demo namespace",
                "kubectl -n demo-space create job demo-hello --image=busybox:latest -- echo hello",
            ),
            scenario(
                "List pods everywhere",
                "List pods across all namespaces",
                "kubectl get pods --all-namespaces",
            ),
            scenario(
                "Describe nodes",
                "Show capacity and conditions for every node",
                "kubectl describe nodes",
            ),
            scenario(
                "Cluster events",
                "Recent cluster events in creation order",
                "kubectl get events --sort-by=.metadata.creationTimestamp",
            ),
            scenario(
                "Apply resource quota",
                "Cap the demo namespace at ten pods",
                "kubectl -n demo-space create quota demo-quota --hard=pods=10",
            ),
            scenario(
                "Delete demo namespace",
                "Tear down the scratch namespace and everything in it",
                "kubectl delete namespace demo-space",
            ),
        ],
    }
}
