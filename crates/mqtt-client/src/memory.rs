//! An in-process broker implementing the provider traits, so the client and
//! its users can be exercised without a real MQTT server.
//!
//! Brokers are keyed by the host name in the options; use a distinct host per
//! test to keep them apart.

use async_trait::async_trait;
use hass_mqtt_provider::{
	AsMqttOptions, MqttClient, MqttMessage, MqttMessageBuilder, MqttProvider,
	MqttProviderCreateError, QosLevel,
};
use std::{
	borrow::Cow,
	collections::HashMap,
	convert::Infallible,
	sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError},
	time::Duration,
};
use thiserror::Error;

static BROKERS: LazyLock<Mutex<HashMap<String, Broker>>> = LazyLock::new(Default::default);

#[derive(Clone, Debug)]
pub struct Published {
	pub topic: String,
	pub payload: Vec<u8>,
	pub retained: bool,
}

impl Published {
	pub fn payload_str(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.payload)
	}
}

#[derive(Default)]
struct BrokerState {
	published: Vec<Published>,
	retained: HashMap<String, Published>,
	subscribers: Vec<(String, usize, flume::Sender<MemoryMessage>)>,
	next_client: usize,
}

/// Handle to the broker registered for one host name.
#[derive(Clone, Default)]
pub struct Broker(Arc<Mutex<BrokerState>>);

impl Broker {
	pub fn for_host(host: &str) -> Broker {
		let mut brokers = BROKERS.lock().unwrap_or_else(PoisonError::into_inner);
		brokers.entry(host.to_owned()).or_default().clone()
	}

	fn state(&self) -> MutexGuard<'_, BrokerState> {
		self.0.lock().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn published(&self) -> Vec<Published> {
		self.state().published.clone()
	}

	pub fn published_to(&self, topic: &str) -> Vec<Published> {
		self.published()
			.into_iter()
			.filter(|p| p.topic == topic)
			.collect()
	}

	pub fn subscribed(&self, topic: &str) -> bool {
		let state = self.state();
		state.subscribers.iter().any(|(t, _, _)| t == topic)
	}

	/// Publish a message as some other client would.
	pub fn inject(&self, topic: &str, payload: &str, retained: bool) {
		self.deliver(Published {
			topic: topic.to_owned(),
			payload: payload.as_bytes().to_vec(),
			retained,
		});
	}

	fn deliver(&self, message: Published) {
		let mut state = self.state();
		if message.retained {
			if message.payload.is_empty() {
				state.retained.remove(&message.topic);
			} else {
				state.retained.insert(message.topic.clone(), message.clone());
			}
		}

		for (topic, _, sender) in &state.subscribers {
			if *topic == message.topic {
				let _ = sender.send(MemoryMessage::from(message.clone()));
			}
		}

		state.published.push(message);
	}

	fn connect(&self) -> usize {
		let mut state = self.state();
		state.next_client += 1;
		state.next_client
	}

	fn subscribe(&self, client: usize, topic: String, sender: flume::Sender<MemoryMessage>) {
		let mut state = self.state();
		if let Some(retained) = state.retained.get(&topic) {
			let _ = sender.send(MemoryMessage::from(retained.clone()));
		}

		state.subscribers.push((topic, client, sender));
	}

	fn unsubscribe(&self, client: usize, topic: &str) {
		let mut state = self.state();
		state
			.subscribers
			.retain(|(t, c, _)| !(t == topic && *c == client));
	}
}

#[derive(Debug, Error)]
#[error("memory provider error: {0}")]
pub struct MemoryError(String);

impl MqttProviderCreateError for MemoryError {
	fn create_message(
		kind: impl Into<String>,
		source: impl std::error::Error + Send + Sync + 'static,
	) -> Self {
		MemoryError(format!("{}: {source}", kind.into()))
	}
}

pub struct MemoryMqtt;

#[async_trait(?Send)]
impl MqttProvider for MemoryMqtt {
	const NAME: &'static str = "memory";

	type Client = MemoryClient;
	type Message = MemoryMessage;
	type Error = MemoryError;

	async fn create(
		options: &impl AsMqttOptions,
		_client_id: &str,
		online_message: Self::Message,
		offline_message: Self::Message,
	) -> Result<Self::Client, Self::Error> {
		let options = options
			.mqtt_options()
			.map_err(|e| MemoryError(e.to_string()))?;

		let broker = Broker::for_host(&options.host);
		let id = broker.connect();
		let (sender, receiver) = flume::unbounded();

		broker.deliver(online_message.into());
		Ok(MemoryClient {
			broker,
			id,
			sender,
			receiver,
			will: offline_message,
		})
	}
}

pub struct MemoryClient {
	broker: Broker,
	id: usize,
	sender: flume::Sender<MemoryMessage>,
	receiver: flume::Receiver<MemoryMessage>,
	will: MemoryMessage,
}

#[async_trait(?Send)]
impl MqttClient for MemoryClient {
	type Message = MemoryMessage;
	type Messages = flume::r#async::RecvStream<'static, MemoryMessage>;
	type PublishError = Infallible;
	type SubscribeError = Infallible;
	type UnsubscribeError = Infallible;
	type DisconnectError = Infallible;

	fn messages(&self) -> Self::Messages {
		self.receiver.clone().into_stream()
	}

	async fn publish(&self, message: MemoryMessage) -> Result<(), Infallible> {
		self.broker.deliver(message.into());
		Ok(())
	}

	async fn subscribe(&self, topic: impl Into<String>, _qos: QosLevel) -> Result<(), Infallible> {
		self.broker
			.subscribe(self.id, topic.into(), self.sender.clone());
		Ok(())
	}

	async fn unsubscribe(&self, topic: impl Into<String>) -> Result<(), Infallible> {
		self.broker.unsubscribe(self.id, &topic.into());
		Ok(())
	}

	async fn disconnect(&self, _timeout: Duration, publish_last_will: bool) -> Result<(), Infallible> {
		if publish_last_will {
			self.broker.deliver(self.will.clone().into());
		}

		Ok(())
	}
}

#[derive(Clone, Debug)]
pub struct MemoryMessage {
	topic: String,
	payload: Vec<u8>,
	retained: bool,
}

impl From<Published> for MemoryMessage {
	fn from(p: Published) -> Self {
		MemoryMessage {
			topic: p.topic,
			payload: p.payload,
			retained: p.retained,
		}
	}
}

impl From<MemoryMessage> for Published {
	fn from(m: MemoryMessage) -> Self {
		Published {
			topic: m.topic,
			payload: m.payload,
			retained: m.retained,
		}
	}
}

impl MqttMessage for MemoryMessage {
	type Builder = MemoryMessageBuilder;

	fn builder() -> Self::Builder {
		MemoryMessageBuilder(MemoryMessage {
			topic: String::new(),
			payload: Vec::new(),
			retained: false,
		})
	}

	fn topic(&self) -> &str {
		&self.topic
	}

	fn payload(&self) -> &[u8] {
		&self.payload
	}

	fn retained(&self) -> bool {
		self.retained
	}
}

pub struct MemoryMessageBuilder(MemoryMessage);

impl MqttMessageBuilder for MemoryMessageBuilder {
	type Message = MemoryMessage;
	type Error = Infallible;

	fn topic(mut self, topic: impl Into<String>) -> Self {
		self.0.topic = topic.into();
		self
	}

	fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
		self.0.payload = payload.into();
		self
	}

	fn qos(self, _qos: QosLevel) -> Self {
		self
	}

	fn retain(mut self, retain: bool) -> Self {
		self.0.retained = retain;
		self
	}

	fn build(self) -> Result<MemoryMessage, Infallible> {
		Ok(self.0)
	}
}
