//! The seam between the Home Assistant client and a concrete MQTT library.

use async_trait::async_trait;
use futures::stream::Stream;
use std::{
	fmt::{self, Write},
	path::PathBuf,
	time::Duration,
};

#[repr(u8)]
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum QosLevel {
	#[default]
	AtMostOnce = 0,
	AtLeastOnce = 1,
	ExactlyOnce = 2,
}

impl fmt::Display for QosLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_char(match self {
			QosLevel::AtMostOnce => '0',
			QosLevel::AtLeastOnce => '1',
			QosLevel::ExactlyOnce => '2',
		})
	}
}

impl From<QosLevel> for u8 {
	fn from(qos: QosLevel) -> Self {
		qos as u8
	}
}

impl From<QosLevel> for i32 {
	fn from(qos: QosLevel) -> Self {
		qos as i32
	}
}

/// Lets the client report a failure to build one of the availability
/// messages through the provider's own error type.
pub trait MqttProviderCreateError {
	fn create_message(
		kind: impl Into<String>,
		source: impl std::error::Error + Send + Sync + 'static,
	) -> Self;
}

#[async_trait(?Send)]
pub trait MqttProvider {
	/// Used in spans and thread names.
	const NAME: &'static str;

	type Client: MqttClient<Message = Self::Message>;
	type Message: MqttMessage;
	type Error: MqttProviderCreateError + std::error::Error + Send + Sync + 'static;

	/// Connect to the broker. `online_message` must be published every time the
	/// connection is (re)established and `offline_message` registered as the
	/// last will.
	async fn create(
		options: &impl AsMqttOptions,
		client_id: &str,
		online_message: Self::Message,
		offline_message: Self::Message,
	) -> Result<Self::Client, Self::Error>;
}

#[async_trait(?Send)]
pub trait MqttClient {
	type Message: MqttMessage;
	type Messages: Stream<Item = Self::Message>;
	type PublishError: std::error::Error + Send + Sync + 'static;
	type SubscribeError: std::error::Error + Send + Sync + 'static;
	type UnsubscribeError: std::error::Error + Send + Sync + 'static;
	type DisconnectError: std::error::Error + Send + Sync + 'static;

	fn messages(&self) -> Self::Messages;

	async fn publish(&self, message: Self::Message) -> Result<(), Self::PublishError>;

	async fn subscribe(
		&self,
		topic: impl Into<String>,
		qos: QosLevel,
	) -> Result<(), Self::SubscribeError>;

	async fn unsubscribe(&self, topic: impl Into<String>) -> Result<(), Self::UnsubscribeError>;

	async fn disconnect(
		&self,
		timeout: Duration,
		publish_last_will: bool,
	) -> Result<(), Self::DisconnectError>;
}

pub trait MqttMessage: Clone {
	type Builder: MqttMessageBuilder<Message = Self>;

	fn builder() -> Self::Builder;
	fn topic(&self) -> &str;
	fn payload(&self) -> &[u8];
	fn retained(&self) -> bool;
}

pub trait MqttMessageBuilder {
	type Message: MqttMessage;
	type Error: std::error::Error + Send + Sync + 'static;

	fn topic(self, topic: impl Into<String>) -> Self;
	fn payload(self, payload: impl Into<Vec<u8>>) -> Self;
	fn qos(self, qos: QosLevel) -> Self;
	fn retain(self, retain: bool) -> Self;
	fn build(self) -> Result<Self::Message, Self::Error>;
}

pub trait AsMqttOptions {
	type Error: std::error::Error + Send + Sync + 'static;

	fn mqtt_options(&self) -> Result<MqttOptions, Self::Error>;
}

impl<T, E> AsMqttOptions for T
where
	T: TryInto<MqttOptions, Error = E> + Clone,
	E: std::error::Error + Send + Sync + 'static,
{
	type Error = E;

	fn mqtt_options(&self) -> Result<MqttOptions, E> {
		self.clone().try_into()
	}
}

/// Broker connection settings.
#[derive(Clone)]
pub struct MqttOptions {
	pub host: String,
	pub port: u16,
	#[cfg(feature = "ssl")]
	#[cfg_attr(doc_cfg, doc(cfg(feature = "ssl")))]
	pub tls: bool,
	pub auth: Option<MqttAuthOptions>,
	/// Directory used to persist in-flight messages. `None` keeps them in memory.
	pub persistence: Option<PathBuf>,
	pub keep_alive: Duration,
}

impl MqttOptions {
	pub const DEFAULT_PORT: u16 = 1883;
	pub const DEFAULT_TLS_PORT: u16 = 8883;

	pub fn new(host: impl Into<String>) -> Self {
		MqttOptions {
			host: host.into(),
			port: Self::DEFAULT_PORT,
			#[cfg(feature = "ssl")]
			tls: false,
			auth: None,
			persistence: None,
			keep_alive: Duration::from_secs(30),
		}
	}

	#[cfg(feature = "ssl")]
	#[cfg_attr(doc_cfg, doc(cfg(feature = "ssl")))]
	pub fn new_tls(host: impl Into<String>) -> Self {
		MqttOptions {
			port: Self::DEFAULT_TLS_PORT,
			tls: true,
			..Self::new(host)
		}
	}

	pub fn port(&mut self, port: u16) -> &mut Self {
		self.port = port;
		self
	}

	#[cfg(feature = "ssl")]
	#[cfg_attr(doc_cfg, doc(cfg(feature = "ssl")))]
	pub fn tls(&mut self, tls: bool) -> &mut Self {
		self.tls = tls;
		self
	}

	pub fn auth(&mut self, username: impl Into<String>, password: impl Into<String>) -> &mut Self {
		self.auth = Some(MqttAuthOptions {
			username: username.into(),
			password: password.into(),
		});
		self
	}

	pub fn persistence(&mut self, dir: Option<PathBuf>) -> &mut Self {
		self.persistence = dir;
		self
	}
}

impl fmt::Debug for MqttOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut s = f.debug_struct("MqttOptions");
		s.field("host", &self.host).field("port", &self.port);
		#[cfg(feature = "ssl")]
		s.field("tls", &self.tls);
		s.field("auth", &self.auth)
			.field("persistence", &self.persistence)
			.field("keep_alive", &self.keep_alive)
			.finish()
	}
}

#[derive(Clone)]
pub struct MqttAuthOptions {
	pub username: String,
	pub password: String,
}

impl fmt::Debug for MqttAuthOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MqttAuthOptions")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn qos_levels_match_the_protocol() {
		assert_eq!(u8::from(QosLevel::AtMostOnce), 0);
		assert_eq!(u8::from(QosLevel::AtLeastOnce), 1);
		assert_eq!(i32::from(QosLevel::ExactlyOnce), 2);
		assert_eq!(QosLevel::AtLeastOnce.to_string(), "1");
	}

	#[test]
	fn options_are_their_own_mqtt_options() {
		let mut options = MqttOptions::new("broker.local");
		options.port(1884).auth("bridge", "hunter2");

		let converted = options.mqtt_options().expect("infallible");
		assert_eq!(converted.host, "broker.local");
		assert_eq!(converted.port, 1884);
		assert_eq!(converted.auth.map(|a| a.username).as_deref(), Some("bridge"));
	}

	#[test]
	fn debug_redacts_password() {
		let mut options = MqttOptions::new("broker.local");
		options.auth("bridge", "hunter2");

		let debug = format!("{options:?}");
		assert!(debug.contains("bridge"));
		assert!(!debug.contains("hunter2"));
	}
}
