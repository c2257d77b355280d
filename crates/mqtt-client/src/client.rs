mod command;
mod inner;
mod subscription;

use crate::{HassMqttOptions, entity::EntityTopic, topics::TopicsConfig};
use command::{
	ClientCommand, Command, DisconnectCommand, EntityCommand, FromClientCommand, PublishCommand,
	SubscribeCommand,
};
use hass_mqtt_provider::{MqttProvider, QosLevel};
use std::{fmt, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{Level, instrument};

pub use command::{
	DisconnectCommandError, EntityCommandError, PublishCommandError, SubscribeCommandError,
};
pub use inner::ConnectError;
pub use subscription::Subscription;

/// A message received on a subscribed topic.
#[derive(Clone)]
pub struct Message {
	topic: Arc<str>,
	payload: Arc<[u8]>,
	retained: bool,
}

impl Message {
	pub(crate) fn new(topic: &str, payload: &[u8], retained: bool) -> Self {
		Self {
			topic: topic.into(),
			payload: payload.into(),
			retained,
		}
	}

	pub fn topic(&self) -> &str {
		&self.topic
	}

	pub fn payload(&self) -> &[u8] {
		&self.payload
	}

	pub fn payload_str(&self) -> Option<&str> {
		std::str::from_utf8(&self.payload).ok()
	}

	pub fn retained(&self) -> bool {
		self.retained
	}
}

impl fmt::Debug for Message {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Message")
			.field("topic", &self.topic)
			.field("payload", &String::from_utf8_lossy(&self.payload))
			.field("retained", &self.retained)
			.finish()
	}
}

/// Status Home Assistant publishes on `<discovery_prefix>/status` when it
/// starts and stops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HassStatus {
	Online,
	Offline,
}

impl HassStatus {
	pub fn from_payload(payload: &[u8]) -> Option<Self> {
		match payload {
			b"online" => Some(Self::Online),
			b"offline" => Some(Self::Offline),
			_ => None,
		}
	}
}

#[derive(Debug, Error)]
#[error("the MQTT client thread has stopped")]
struct ClientStopped;

/// Handle to a Home Assistant aware MQTT connection. The connection itself
/// lives on a dedicated thread; cloning the handle is cheap.
#[derive(Clone)]
pub struct HassMqttClient {
	sender: mpsc::UnboundedSender<Command>,
	topics: TopicsConfig,
	client_id: Arc<str>,
}

static_assertions::assert_impl_all!(HassMqttClient: Send, Sync, Clone);

impl HassMqttClient {
	pub async fn new<P: MqttProvider>(options: HassMqttOptions) -> Result<Self, ConnectError> {
		let (sender, topics, client_id) = inner::spawn::<P>(options).await?;
		Ok(Self {
			sender,
			topics,
			client_id: client_id.into(),
		})
	}

	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// The bridge availability topic (`online`/`offline`, retained).
	pub fn availability_topic(&self) -> String {
		self.topics.available()
	}

	/// A topic below `<private_prefix>/<node_id>/`.
	pub fn node_topic(&self, path: impl AsRef<str>) -> String {
		self.topics.node_topic(path)
	}

	async fn command<C>(&self, command: C) -> Result<C::Result, C::Error>
	where
		C: ClientCommand + Send + Sync + 'static,
		Command: FromClientCommand<C>,
	{
		let command = Arc::new(command);
		let (cmd, result) = Command::from_command(Arc::clone(&command));

		if self.sender.send(cmd).is_err() {
			return Err(command.create_error(ClientStopped));
		}

		match result.await {
			Ok(result) => result,
			Err(_) => Err(command.create_error(ClientStopped)),
		}
	}

	/// Topics for the entity `<component>.<object_id>`.
	#[instrument(level = Level::DEBUG, skip_all, fields(%component, %object_id))]
	pub async fn entity(
		&self,
		component: impl Into<Arc<str>> + fmt::Display,
		object_id: impl Into<Arc<str>> + fmt::Display,
	) -> Result<EntityTopic, EntityCommandError> {
		let topics = self
			.command(EntityCommand::new(component.into(), object_id.into()))
			.await?;

		Ok(EntityTopic::new(self.clone(), topics))
	}

	#[instrument(level = Level::DEBUG, skip_all, fields(%topic, retained, %qos))]
	pub async fn publish(
		&self,
		topic: impl Into<Arc<str>> + fmt::Display,
		payload: impl Into<Arc<[u8]>>,
		retained: bool,
		qos: QosLevel,
	) -> Result<(), PublishCommandError> {
		self
			.command(PublishCommand::new(
				topic.into(),
				payload.into(),
				retained,
				qos,
			))
			.await
	}

	#[instrument(level = Level::DEBUG, skip_all, fields(%topic, %qos))]
	pub async fn subscribe(
		&self,
		topic: impl Into<Arc<str>> + fmt::Display,
		qos: QosLevel,
	) -> Result<Subscription, SubscribeCommandError> {
		let topic = topic.into();
		let result = self
			.command(SubscribeCommand::new(Arc::clone(&topic), qos))
			.await?;

		Ok(Subscription::new(topic, result.receiver, result.token))
	}

	/// Subscribes to the Home Assistant status topic. Use
	/// [HassStatus::from_payload] on the received messages.
	pub async fn hass_status(&self) -> Result<Subscription, SubscribeCommandError> {
		self.subscribe(self.topics.hass_status(), QosLevel::AtLeastOnce)
			.await
	}

	/// Publishes the last will (`offline`) and disconnects. Other handles fail
	/// with a "client stopped" error afterwards.
	pub async fn disconnect(&self, timeout: Duration) -> Result<(), DisconnectCommandError> {
		self.command(DisconnectCommand::new(timeout)).await
	}
}

impl fmt::Debug for HassMqttClient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HassMqttClient")
			.field("client_id", &self.client_id)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hass_status_payloads() {
		assert_eq!(HassStatus::from_payload(b"online"), Some(HassStatus::Online));
		assert_eq!(HassStatus::from_payload(b"offline"), Some(HassStatus::Offline));
		assert_eq!(HassStatus::from_payload(b"Online"), None);
	}

	#[test]
	fn message_accessors() {
		let message = Message::new("homeassistant/status", b"online", true);
		assert_eq!(message.topic(), "homeassistant/status");
		assert_eq!(message.payload_str(), Some("online"));
		assert!(message.retained());
	}
}
