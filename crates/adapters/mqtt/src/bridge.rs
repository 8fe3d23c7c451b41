//! The bridge between the broker and the home hub.
//!
//! Requests to the broker go through rumqttc's bounded request channel, which
//! the event loop only drains while connected. Every request is therefore
//! made with the non-blocking `try_*` calls: a full channel is an error for
//! the caller to log, never a wait.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, Publish, QoS};
use tokio::task::JoinHandle;

use homeguard_app::hub::HomeHub;
use homeguard_app::ports::ActuatorSink;
use homeguard_domain::actuator::ActuatorCommand;
use homeguard_domain::error::HomeGuardError;

use crate::config::MqttConfig;
use crate::error::MqttError;
use crate::message::{command_topic, decode_payload, is_command_topic, subscription};

const CHANNEL_CAPACITY: usize = 64;
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Publishing half of the bridge; implements [`ActuatorSink`].
#[derive(Clone)]
pub struct MqttBridge {
    client: AsyncClient,
    base_topic: String,
    pi_id: String,
}

impl MqttBridge {
    /// Create the client and spawn the loop that feeds sensor payloads into
    /// `hub`. The broker connection is established lazily by the loop.
    pub fn start(config: &MqttConfig, hub: HomeHub) -> (Self, JoinHandle<()>) {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));
        let (client, eventloop) = AsyncClient::new(options, CHANNEL_CAPACITY);

        let listener = Listener::new(client.clone(), subscription(&config.base_topic), hub);
        tracing::info!(
            broker = %config.broker_host,
            port = config.broker_port,
            filter = %listener.filter,
            "MQTT bridge starting"
        );
        let handle = tokio::spawn(listener.run(eventloop));

        let bridge = Self {
            client,
            base_topic: config.base_topic.clone(),
            pi_id: config.pi_id.clone(),
        };
        (bridge, handle)
    }

    fn publish(&self, command: &ActuatorCommand) -> Result<(), MqttError> {
        let topic = command_topic(&self.base_topic, &self.pi_id, command.target);
        tracing::debug!(%topic, payload = %command.payload, "publishing actuator command");
        self.client
            .try_publish(topic, QoS::AtLeastOnce, false, command.payload.to_string())?;
        Ok(())
    }
}

impl ActuatorSink for MqttBridge {
    async fn send(&self, command: &ActuatorCommand) -> Result<(), HomeGuardError> {
        self.publish(command).map_err(MqttError::into_domain)
    }
}

/// Receiving half: polls the event loop and hands readings to the hub.
///
/// The subscription is requested after every `ConnAck` and retried on the
/// following events until the request channel accepts it.
struct Listener {
    client: AsyncClient,
    filter: String,
    hub: HomeHub,
    subscribe_pending: bool,
}

impl Listener {
    fn new(client: AsyncClient, filter: String, hub: HomeHub) -> Self {
        Self {
            client,
            filter,
            hub,
            subscribe_pending: false,
        }
    }

    async fn run(mut self, mut eventloop: EventLoop) {
        loop {
            if let Err(err) = self.iterate(&mut eventloop).await {
                tracing::warn!(%err, "MQTT connection lost, retrying");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }

    async fn iterate(&mut self, eventloop: &mut EventLoop) -> Result<(), MqttError> {
        let event = eventloop.poll().await?;
        self.on_event(&event);
        Ok(())
    }

    fn on_event(&mut self, event: &Event) {
        match event {
            Event::Incoming(Packet::ConnAck(_)) => {
                tracing::info!(filter = %self.filter, "MQTT connected, subscribing");
                self.subscribe_pending = true;
            }
            Event::Incoming(Packet::Publish(publish)) => self.handle(publish),
            _ => {}
        }
        if self.subscribe_pending {
            self.request_subscription();
        }
    }

    fn request_subscription(&mut self) {
        match self
            .client
            .try_subscribe(self.filter.clone(), QoS::AtLeastOnce)
        {
            Ok(()) => self.subscribe_pending = false,
            Err(err) => tracing::debug!(%err, "request channel full, subscription deferred"),
        }
    }

    fn handle(&self, publish: &Publish) {
        let topic = String::from_utf8_lossy(publish.topic.as_ref());
        if is_command_topic(&topic) {
            return;
        }
        let readings = match decode_payload(&topic, &publish.payload) {
            Ok(readings) => readings,
            Err(err) => {
                tracing::debug!(%err, %topic, "ignoring MQTT payload");
                return;
            }
        };
        for reading in readings {
            let outcome = self.hub.submit_reading(&reading.code, &reading.value);
            tracing::trace!(%topic, code = %reading.code, ?outcome, "MQTT reading");
        }
    }
}

#[cfg(test)]
mod tests {
    use homeguard_domain::home::HomeState;

    use super::*;

    fn offline_config() -> MqttConfig {
        MqttConfig {
            enabled: true,
            broker_host: "127.0.0.1".to_string(),
            broker_port: 1,
            ..MqttConfig::default()
        }
    }

    #[tokio::test]
    async fn should_queue_command_while_broker_unreachable() {
        let hub = HomeHub::new(HomeState::default());
        let (bridge, handle) = MqttBridge::start(&offline_config(), hub);

        let result = bridge.send(&ActuatorCommand::buzzer(true)).await;
        handle.abort();

        assert!(result.is_ok());
        assert!(!bridge.is_simulated());
    }

    #[tokio::test]
    async fn should_fail_fast_when_request_channel_full() {
        let hub = HomeHub::new(HomeState::default());
        let (bridge, handle) = MqttBridge::start(&offline_config(), hub);

        let mut failures = 0;
        for n in 0..CHANNEL_CAPACITY * 2 {
            let command = ActuatorCommand::text_display(&n.to_string());
            let send = bridge.send(&command);
            let result = tokio::time::timeout(Duration::from_millis(500), send)
                .await
                .expect("send must never wait on the broker");
            if let Err(err) = result {
                assert!(matches!(err, HomeGuardError::Storage(_)));
                failures += 1;
            }
        }
        handle.abort();

        assert!(failures > 0);
    }

    #[tokio::test]
    async fn should_defer_subscription_until_channel_has_room() {
        let options = MqttOptions::new("homeguard-test", "127.0.0.1", 1);
        let (client, _eventloop) = AsyncClient::new(options, 1);
        client
            .try_publish("home/pi1/cmd/buzzer", QoS::AtLeastOnce, false, "{}")
            .unwrap();
        let mut listener = Listener::new(
            client,
            subscription("home"),
            HomeHub::new(HomeState::default()),
        );

        listener.on_event(&Event::Incoming(Packet::ConnAck(rumqttc::ConnAck::new(
            rumqttc::ConnectReturnCode::Success,
            false,
        ))));
        assert!(listener.subscribe_pending);

        listener.on_event(&Event::Incoming(Packet::PingResp));
        assert!(listener.subscribe_pending);
    }

    #[tokio::test]
    async fn should_feed_published_readings_into_hub() {
        let hub = HomeHub::new(HomeState::default());
        let (bridge, handle) = MqttBridge::start(&offline_config(), hub.clone());
        handle.abort();
        let listener = Listener::new(bridge.client.clone(), subscription("home"), hub.clone());

        let mut publish = Publish::new("home/pi1/GSG", QoS::AtLeastOnce, r#"{"value": 25}"#);
        listener.handle(&publish);
        assert!(hub.snapshot().alarm_active);

        hub.deactivate_alarm();
        publish = Publish::new("home/pi1/cmd/GSG", QoS::AtLeastOnce, r#"{"value": 25}"#);
        listener.handle(&publish);
        assert!(!hub.snapshot().alarm_active);
    }
}
