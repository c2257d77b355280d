use crate::topics::ApplicationName;
use dirs::{cache_dir, state_dir};
use hass_mqtt_provider::MqttOptions;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub(crate) enum Persistence {
	/// `<state or cache dir>/<application slug>`.
	Default,
	Directory(PathBuf),
	Memory,
}

/// Options for [HassMqttClient][crate::HassMqttClient].
#[derive(Clone, Debug)]
pub struct HassMqttOptions {
	pub(crate) mqtt: MqttOptions,
	pub(crate) persistence: Persistence,
	pub(crate) discovery_prefix: String,
	pub(crate) private_prefix: Option<String>,
	pub(crate) application_name: ApplicationName,
	pub(crate) node_id: String,
}

impl HassMqttOptions {
	pub const DEFAULT_DISCOVERY_PREFIX: &'static str = "homeassistant";
	pub const DEFAULT_NODE_ID: &'static str = "default";

	fn with_mqtt(mqtt: MqttOptions, application_name: impl Into<String>) -> Self {
		HassMqttOptions {
			mqtt,
			persistence: Persistence::Default,
			discovery_prefix: Self::DEFAULT_DISCOVERY_PREFIX.into(),
			private_prefix: None,
			application_name: ApplicationName::new(application_name.into()),
			node_id: Self::DEFAULT_NODE_ID.into(),
		}
	}

	pub fn new(host: impl Into<String>, application_name: impl Into<String>) -> Self {
		Self::with_mqtt(MqttOptions::new(host), application_name)
	}

	#[cfg(feature = "ssl")]
	#[cfg_attr(doc_cfg, doc(cfg(feature = "ssl")))]
	pub fn new_tls(host: impl Into<String>, application_name: impl Into<String>) -> Self {
		Self::with_mqtt(MqttOptions::new_tls(host), application_name)
	}

	pub fn port(mut self, port: u16) -> Self {
		self.mqtt.port(port);
		self
	}

	pub fn auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
		self.mqtt.auth(username, password);
		self
	}

	pub fn discovery_prefix(mut self, discovery_prefix: impl Into<String>) -> Self {
		self.discovery_prefix = discovery_prefix.into();
		self
	}

	/// Prefix of the bridge's own topics. Defaults to the application slug.
	pub fn private_prefix(mut self, private_prefix: impl Into<String>) -> Self {
		self.private_prefix = Some(private_prefix.into());
		self
	}

	pub fn node_id(mut self, node_id: impl Into<String>) -> Self {
		self.node_id = node_id.into();
		self
	}

	pub fn persistence_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.persistence = Persistence::Directory(dir.into());
		self
	}

	pub fn in_memory_persistence(mut self) -> Self {
		self.persistence = Persistence::Memory;
		self
	}

	pub(crate) fn private_prefix_or_default(&self) -> &str {
		self
			.private_prefix
			.as_deref()
			.unwrap_or_else(|| self.application_name.slug())
	}

	pub(crate) fn client_id(&self) -> String {
		format!("{}_{}", self.application_name.slug(), self.node_id)
	}

	fn persistence_path(&self) -> Option<PathBuf> {
		match &self.persistence {
			Persistence::Default => state_dir()
				.or_else(cache_dir)
				.map(|dir| dir.join(self.application_name.slug())),
			Persistence::Directory(dir) => Some(dir.clone()),
			Persistence::Memory => None,
		}
	}
}

impl From<HassMqttOptions> for MqttOptions {
	fn from(options: HassMqttOptions) -> Self {
		let persistence = options.persistence_path();
		let mut mqtt = options.mqtt;
		mqtt.persistence(persistence);
		mqtt
	}
}
