//! [paho-mqtt] implementation of the MQTT provider.
//!
//! [paho-mqtt]: https://docs.rs/paho-mqtt

use async_trait::async_trait;
use futures::{Stream, stream::FusedStream};
use hass_dyn_error::DynError;
use hass_mqtt_provider::{
	AsMqttOptions, MqttClient, MqttMessage, MqttMessageBuilder, MqttOptions, MqttProvider,
	MqttProviderCreateError, QosLevel,
};
use pin_project::pin_project;
use std::{
	convert::Infallible,
	pin::Pin,
	task::{Context, Poll},
	time::Duration,
};
use thiserror::Error;
use tokio::net::lookup_host;
use tracing::{debug, warn};

const MESSAGE_BUFFER: usize = 100;
const MIN_RECONNECT: Duration = Duration::from_secs(5);
const MAX_RECONNECT: Duration = Duration::from_secs(5 * 60);

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PahoProviderConnectError {
	#[error("invalid MQTT options")]
	Options { source: DynError },

	#[error("failed to create MQTT client")]
	Client { source: DynError },

	#[error("failed to connect to MQTT broker")]
	Connect { source: DynError },

	#[error("failed to resolve host: {host}:{port}")]
	ResolveHost {
		host: String,
		port: u16,
		source: DynError,
	},

	#[error("failed to create MQTT message: {kind}")]
	Message { kind: String, source: DynError },
}

impl PahoProviderConnectError {
	fn options(source: impl std::error::Error + Send + Sync + 'static) -> Self {
		Self::Options {
			source: DynError::new(source),
		}
	}

	fn client(source: impl std::error::Error + Send + Sync + 'static) -> Self {
		Self::Client {
			source: DynError::new(source),
		}
	}

	fn connect(source: impl std::error::Error + Send + Sync + 'static) -> Self {
		Self::Connect {
			source: DynError::new(source),
		}
	}

	fn resolve_host(
		host: impl Into<String>,
		port: u16,
		source: impl std::error::Error + Send + Sync + 'static,
	) -> Self {
		Self::ResolveHost {
			host: host.into(),
			port,
			source: DynError::new(source),
		}
	}
}

impl MqttProviderCreateError for PahoProviderConnectError {
	fn create_message(
		kind: impl Into<String>,
		source: impl std::error::Error + Send + Sync + 'static,
	) -> Self {
		Self::Message {
			kind: kind.into(),
			source: DynError::new(source),
		}
	}
}

pub struct PahoMqtt;

#[async_trait(?Send)]
impl MqttProvider for PahoMqtt {
	const NAME: &'static str = "paho";

	type Client = Client;
	type Message = Message;
	type Error = PahoProviderConnectError;

	async fn create(
		options: &impl AsMqttOptions,
		client_id: &str,
		online_message: Self::Message,
		offline_message: Self::Message,
	) -> Result<Self::Client, Self::Error> {
		let options = options
			.mqtt_options()
			.map_err(PahoProviderConnectError::options)?;

		let mut client = paho_mqtt::AsyncClient::new(create_options(&options, client_id))
			.map_err(PahoProviderConnectError::client)?;

		let scheme = scheme(&options);
		let hosts = lookup_host((&*options.host, options.port))
			.await
			.map_err(|source| {
				PahoProviderConnectError::resolve_host(&options.host, options.port, source)
			})?
			.map(|addr| format!("{scheme}://{addr}"))
			.collect::<Vec<_>>();
		debug!(?hosts, "resolved MQTT broker");

		let mut builder = paho_mqtt::ConnectOptionsBuilder::new();
		builder
			.server_uris(&hosts)
			.keep_alive_interval(options.keep_alive)
			.automatic_reconnect(MIN_RECONNECT, MAX_RECONNECT)
			.will_message(offline_message.message);

		#[cfg(feature = "ssl")]
		if options.tls {
			builder.ssl_options(paho_mqtt::SslOptions::new());
		}

		if let Some(auth) = &options.auth {
			builder.user_name(auth.username.clone());
			builder.password(auth.password.clone());
		}

		let runtime = tokio::runtime::Handle::current();
		client.set_connected_callback(move |c| {
			let client = c.clone();
			let message = online_message.message.clone();
			runtime.spawn(async move {
				if let Err(e) = client.publish(message).await {
					warn!(error = %e, "failed to publish online message");
				}
			});
		});

		let messages = MessageStream {
			inner: client.get_stream(MESSAGE_BUFFER),
		};

		client
			.connect(builder.finalize())
			.await
			.map_err(PahoProviderConnectError::connect)?;

		Ok(Client { client, messages })
	}
}

pub struct Client {
	client: paho_mqtt::AsyncClient,
	messages: MessageStream,
}

/// Incoming messages. Paho signals a lost connection with `None`, which is
/// skipped since the client reconnects on its own.
#[pin_project]
#[derive(Clone)]
pub struct MessageStream {
	#[pin]
	inner: paho_mqtt::AsyncReceiver<Option<paho_mqtt::Message>>,
}

#[derive(Clone)]
pub struct Message {
	message: paho_mqtt::Message,
}

impl From<paho_mqtt::Message> for Message {
	fn from(message: paho_mqtt::Message) -> Self {
		Self { message }
	}
}

pub struct MessageBuilder {
	builder: paho_mqtt::MessageBuilder,
}

impl From<paho_mqtt::MessageBuilder> for MessageBuilder {
	fn from(builder: paho_mqtt::MessageBuilder) -> Self {
		Self { builder }
	}
}

#[async_trait(?Send)]
impl MqttClient for Client {
	type Message = Message;
	type Messages = MessageStream;
	type PublishError = paho_mqtt::Error;
	type SubscribeError = paho_mqtt::Error;
	type UnsubscribeError = paho_mqtt::Error;
	type DisconnectError = paho_mqtt::Error;

	fn messages(&self) -> Self::Messages {
		self.messages.clone()
	}

	async fn publish(&self, message: Message) -> Result<(), Self::PublishError> {
		self.client.publish(message.message).await
	}

	async fn subscribe(
		&self,
		topic: impl Into<String>,
		qos: QosLevel,
	) -> Result<(), Self::SubscribeError> {
		self.client.subscribe(topic, i32::from(qos)).await.map(|_| ())
	}

	async fn unsubscribe(&self, topic: impl Into<String>) -> Result<(), Self::UnsubscribeError> {
		self.client.unsubscribe(topic).await.map(|_| ())
	}

	async fn disconnect(
		&self,
		timeout: Duration,
		publish_last_will: bool,
	) -> Result<(), Self::DisconnectError> {
		let mut builder = paho_mqtt::DisconnectOptionsBuilder::new();
		builder.timeout(timeout);
		if publish_last_will {
			builder.publish_will_message();
		}

		self.client.disconnect(builder.finalize()).await.map(|_| ())
	}
}

impl MqttMessage for Message {
	type Builder = MessageBuilder;

	fn builder() -> Self::Builder {
		paho_mqtt::MessageBuilder::new().into()
	}

	fn topic(&self) -> &str {
		self.message.topic()
	}

	fn payload(&self) -> &[u8] {
		self.message.payload()
	}

	fn retained(&self) -> bool {
		self.message.retained()
	}
}

impl MqttMessageBuilder for MessageBuilder {
	type Message = Message;
	type Error = Infallible;

	fn topic(self, topic: impl Into<String>) -> Self {
		self.builder.topic(topic).into()
	}

	fn payload(self, payload: impl Into<Vec<u8>>) -> Self {
		self.builder.payload(payload).into()
	}

	fn qos(self, qos: QosLevel) -> Self {
		self.builder.qos(i32::from(qos)).into()
	}

	fn retain(self, retain: bool) -> Self {
		self.builder.retained(retain).into()
	}

	fn build(self) -> Result<Self::Message, Self::Error> {
		Ok(self.builder.finalize().into())
	}
}

impl Stream for MessageStream {
	type Item = Message;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		loop {
			match self.as_mut().project().inner.poll_next(cx) {
				Poll::Ready(Some(Some(message))) => return Poll::Ready(Some(message.into())),
				Poll::Ready(Some(None)) => {
					debug!("MQTT connection lost");
					continue;
				}
				Poll::Ready(None) => return Poll::Ready(None),
				Poll::Pending => return Poll::Pending,
			}
		}
	}
}

impl FusedStream for MessageStream {
	fn is_terminated(&self) -> bool {
		FusedStream::is_terminated(&self.inner)
	}
}

fn scheme(options: &MqttOptions) -> &'static str {
	#[cfg(feature = "ssl")]
	if options.tls {
		return "ssl";
	}

	let _ = options;
	"tcp"
}

fn create_options(options: &MqttOptions, client_id: &str) -> paho_mqtt::CreateOptions {
	let persistence = match &options.persistence {
		Some(dir) => paho_mqtt::PersistenceType::FilePath(dir.clone()),
		None => paho_mqtt::PersistenceType::None,
	};

	paho_mqtt::CreateOptionsBuilder::new()
		.client_id(client_id)
		.send_while_disconnected(true)
		.persistence(persistence)
		.finalize()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn message_builder_maps_fields() {
		let message = Message::builder()
			.topic("airbolt/default/available")
			.payload("online")
			.qos(QosLevel::ExactlyOnce)
			.retain(true)
			.build()
			.expect("infallible");

		assert_eq!(message.topic(), "airbolt/default/available");
		assert_eq!(message.payload(), b"online");
		assert!(message.retained());
		assert_eq!(message.message.qos(), paho_mqtt::QoS::from(paho_mqtt::QOS_2));
	}

	#[test]
	fn plain_connections_use_tcp() {
		let mut options = MqttOptions::new("broker.local");
		#[cfg(feature = "ssl")]
		options.tls(false);
		options.port(1883);
		assert_eq!(scheme(&options), "tcp");
	}
}
