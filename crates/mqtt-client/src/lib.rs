//! A Home Assistant aware MQTT client.
//!
//! The connection runs on its own thread; [HassMqttClient] is a cheap,
//! cloneable handle that sends commands to it.

mod client;
mod entity;
mod mqtt;
#[cfg(feature = "test-util")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "test-util")))]
pub mod memory;
mod options;
mod router;
mod topics;

pub use client::{
	ConnectError, DisconnectCommandError, EntityCommandError, HassMqttClient, HassStatus, Message,
	PublishCommandError, SubscribeCommandError, Subscription,
};
pub use entity::{EntityPublishError, EntityTopic};
pub use hass_mqtt_provider::{MqttProvider, QosLevel};
pub use options::HassMqttOptions;
pub use topics::ApplicationName;

#[cfg(feature = "paho")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "paho")))]
pub use hass_mqtt_provider_paho::PahoMqtt;

#[cfg(feature = "paho")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "paho")))]
impl HassMqttOptions {
	/// Connects using the paho provider.
	pub async fn build(self) -> Result<HassMqttClient, ConnectError> {
		HassMqttClient::new::<PahoMqtt>(self).await
	}
}
