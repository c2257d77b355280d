use super::{ClientCommand, InnerClient};
use async_trait::async_trait;
use hass_dyn_error::DynError;
use hass_mqtt_provider::{MqttClient, MqttMessage, MqttMessageBuilder, QosLevel};
use std::sync::Arc;
use thiserror::Error;

pub(crate) struct PublishCommand {
	topic: Arc<str>,
	payload: Arc<[u8]>,
	retained: bool,
	qos: QosLevel,
}

impl PublishCommand {
	pub(crate) fn new(topic: Arc<str>, payload: Arc<[u8]>, retained: bool, qos: QosLevel) -> Self {
		Self {
			topic,
			payload,
			retained,
			qos,
		}
	}
}

#[derive(Debug, Error)]
#[error("failed to publish MQTT message to '{topic}' (retained: {retained}, qos: {qos})")]
pub struct PublishCommandError {
	topic: Arc<str>,
	retained: bool,
	qos: QosLevel,
	source: DynError,
}

impl PublishCommandError {
	pub fn topic(&self) -> &str {
		&self.topic
	}
}

#[async_trait(?Send)]
impl ClientCommand for PublishCommand {
	const NAME: &'static str = "publish";

	type Result = ();
	type Error = PublishCommandError;

	async fn run<T: MqttClient>(
		&self,
		_client: &mut InnerClient,
		mqtt: &T,
	) -> Result<Self::Result, Self::Error> {
		let message = <T::Message as MqttMessage>::builder()
			.topic(&*self.topic)
			.payload(&*self.payload)
			.retain(self.retained)
			.qos(self.qos)
			.build()
			.map_err(|source| self.create_error(source))?;

		mqtt
			.publish(message)
			.await
			.map_err(|source| self.create_error(source))
	}

	fn create_error(&self, source: impl std::error::Error + Send + Sync + 'static) -> Self::Error {
		PublishCommandError {
			topic: self.topic.clone(),
			retained: self.retained,
			qos: self.qos,
			source: DynError::new(source),
		}
	}
}
