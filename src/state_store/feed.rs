use tokio::sync::broadcast;
use tracing::debug;

use crate::data_model::{Environment, FeedEvent};

/// Per-environment broadcast hubs for live feed events.
///
/// Every subscriber owns an independent cursor, so one slow observer never
/// steals events from another. Publishing never blocks: when a subscriber
/// falls more than the channel capacity behind, its oldest unseen events are
/// dropped and its next receive yields `Lagged(n)`, after which it resumes
/// at the oldest retained event. With no subscribers an event is dropped.
pub struct FeedBus {
    docker_tx: broadcast::Sender<FeedEvent>,
    kubernetes_tx: broadcast::Sender<FeedEvent>,
}

impl FeedBus {
    pub fn new(capacity: usize) -> Self {
        let (docker_tx, _) = broadcast::channel(capacity);
        let (kubernetes_tx, _) = broadcast::channel(capacity);
        FeedBus {
            docker_tx,
            kubernetes_tx,
        }
    }

    fn sender(&self, env: Environment) -> &broadcast::Sender<FeedEvent> {
        match env {
            Environment::Docker => &self.docker_tx,
            Environment::Kubernetes => &self.kubernetes_tx,
        }
    }

    pub fn publish(&self, env: Environment, message: impl Into<String>) {
        let event = FeedEvent::now(message);
        debug!(environment = %env, message = %event.message, "feed event");
        let _ = self.sender(env).send(event);
    }

    pub fn subscribe(&self, env: Environment) -> broadcast::Receiver<FeedEvent> {
        self.sender(env).subscribe()
    }

    #[cfg(test)]
    pub fn subscriber_count(&self, env: Environment) -> usize {
        self.sender(env).receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    use super::*;

    #[tokio::test]
    async fn subscribe_and_receive() {
        let bus = FeedBus::new(8);
        let mut rx = bus.subscribe(Environment::Docker);

        bus.publish(Environment::Docker, "web created");

        let event = rx.recv().await.unwrap();
        assert_eq!("web created", event.message);
    }

    #[tokio::test]
    async fn publishing_without_subscribers_drops_the_event() {
        let bus = FeedBus::new(8);
        assert_eq!(0, bus.subscriber_count(Environment::Docker));

        bus.publish(Environment::Docker, "nobody is listening");

        // a later subscriber starts at the current tail
        let mut rx = bus.subscribe(Environment::Docker);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn environments_have_independent_feeds() {
        let bus = FeedBus::new(8);
        let mut docker_rx = bus.subscribe(Environment::Docker);
        let mut k8s_rx = bus.subscribe(Environment::Kubernetes);

        bus.publish(Environment::Kubernetes, "namespace_4 created");

        assert!(matches!(docker_rx.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!("namespace_4 created", k8s_rx.recv().await.unwrap().message);
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_event() {
        let bus = FeedBus::new(8);
        let mut rx1 = bus.subscribe(Environment::Docker);
        let mut rx2 = bus.subscribe(Environment::Docker);

        bus.publish(Environment::Docker, "first");
        bus.publish(Environment::Docker, "second");

        for rx in [&mut rx1, &mut rx2] {
            assert_eq!("first", rx.recv().await.unwrap().message);
            assert_eq!("second", rx.recv().await.unwrap().message);
        }
    }

    #[tokio::test]
    async fn lagged_receiver_resumes_at_oldest_retained_event() {
        let capacity = 4;
        let bus = FeedBus::new(capacity);
        let mut rx = bus.subscribe(Environment::Docker);

        let total = capacity + 3;
        for i in 0..total {
            bus.publish(Environment::Docker, format!("event {i}"));
        }

        // the first receive reports how far behind the subscriber fell
        match rx.recv().await {
            Err(RecvError::Lagged(skipped)) => assert_eq!(3, skipped as usize),
            other => panic!("expected lagged receiver, got {other:?}"),
        }

        // then it resumes at the oldest event still retained
        let event = rx.recv().await.unwrap();
        assert_eq!(format!("event {}", total - capacity), event.message);
    }
}
