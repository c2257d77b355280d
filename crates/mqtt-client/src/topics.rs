use hass_mqtt_provider::{MqttMessage, MqttMessageBuilder, QosLevel};
use slug::slugify;
use std::{fmt, sync::Arc};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeId(Arc<str>);

impl NodeId {
	pub(crate) fn new(value: impl Into<Arc<str>>) -> Self {
		NodeId(value.into())
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&*self.0, f)
	}
}

/// Human readable application name, and the slug used in client ids, thread
/// names and the default private prefix.
#[derive(Clone, Debug)]
pub struct ApplicationName {
	value: Arc<str>,
	slug: Arc<str>,
}

impl ApplicationName {
	pub(crate) fn new(value: impl Into<Arc<str>>) -> Self {
		let value = value.into();
		let slug = Arc::from(slugify(&value));
		ApplicationName { value, slug }
	}

	pub fn slug(&self) -> &str {
		&self.slug
	}
}

impl fmt::Display for ApplicationName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&*self.value, f)
	}
}

/// Topic layout of one bridge node.
///
/// - discovery: `<discovery_prefix>/<component>/<node_id>/<object_id>/config`
/// - private: `<private_prefix>/<node_id>/<path>`
/// - availability: `<private_prefix>/<node_id>/available`
#[derive(Clone, Debug)]
pub(crate) struct TopicsConfig {
	private_prefix: Arc<str>,
	discovery_prefix: Arc<str>,
	node_id: NodeId,
}

impl TopicsConfig {
	pub(crate) const ONLINE_PAYLOAD: &'static str = "online";
	pub(crate) const OFFLINE_PAYLOAD: &'static str = "offline";

	pub(crate) fn new(
		private_prefix: impl Into<Arc<str>>,
		discovery_prefix: impl Into<Arc<str>>,
		node_id: NodeId,
	) -> Self {
		TopicsConfig {
			private_prefix: private_prefix.into(),
			discovery_prefix: discovery_prefix.into(),
			node_id,
		}
	}

	pub(crate) fn discovery_topic(&self, component: &str, object_id: &str) -> String {
		format!(
			"{}/{}/{}/{}/config",
			self.discovery_prefix, component, self.node_id, object_id
		)
	}

	/// Home Assistant publishes `online`/`offline` here when it starts or stops.
	pub(crate) fn hass_status(&self) -> String {
		format!("{}/status", self.discovery_prefix)
	}

	pub(crate) fn available(&self) -> String {
		self.node_topic("available")
	}

	pub(crate) fn node_topic(&self, path: impl AsRef<str>) -> String {
		format!("{}/{}/{}", self.private_prefix, self.node_id, path.as_ref())
	}

	pub(crate) fn entity(&self, component: &str, object_id: &str) -> EntityTopicsConfig {
		EntityTopicsConfig {
			discovery: self.discovery_topic(component, object_id).into(),
		}
	}

	pub(crate) fn online_message<T: MqttMessage>(
		&self,
	) -> Result<T, <T::Builder as MqttMessageBuilder>::Error> {
		availability_message(&self.available(), Self::ONLINE_PAYLOAD)
	}

	pub(crate) fn offline_message<T: MqttMessage>(
		&self,
	) -> Result<T, <T::Builder as MqttMessageBuilder>::Error> {
		availability_message(&self.available(), Self::OFFLINE_PAYLOAD)
	}
}

/// Topics belonging to a single entity.
#[derive(Clone, Debug)]
pub(crate) struct EntityTopicsConfig {
	pub(crate) discovery: Arc<str>,
}

fn availability_message<T: MqttMessage>(
	topic: &str,
	content: &str,
) -> Result<T, <T::Builder as MqttMessageBuilder>::Error> {
	T::builder()
		.topic(topic)
		.payload(content)
		.qos(QosLevel::ExactlyOnce)
		.retain(true)
		.build()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn topics() -> TopicsConfig {
		TopicsConfig::new("airbolt", "homeassistant", NodeId::new("default"))
	}

	#[test]
	fn discovery_topic_layout() {
		assert_eq!(
			topics().discovery_topic("sensor", "abc_battery_percent"),
			"homeassistant/sensor/default/abc_battery_percent/config"
		);
	}

	#[test]
	fn private_topic_layout() {
		let topics = topics();
		assert_eq!(topics.available(), "airbolt/default/available");
		assert_eq!(topics.node_topic("abc/state"), "airbolt/default/abc/state");
		assert_eq!(topics.hass_status(), "homeassistant/status");
	}

	#[test]
	fn entity_topic_layout() {
		let entity = topics().entity("device_tracker", "abc_location");
		assert_eq!(
			&*entity.discovery,
			"homeassistant/device_tracker/default/abc_location/config"
		);
	}

	#[test]
	fn application_slug() {
		let name = ApplicationName::new("Airbolt Bridge");
		assert_eq!(name.slug(), "airbolt-bridge");
		assert_eq!(name.to_string(), "Airbolt Bridge");
	}
}
