use super::{ClientCommand, InnerClient};
use crate::client::{Message, subscription::SubscriptionToken};
use async_trait::async_trait;
use hass_dyn_error::DynError;
use hass_mqtt_provider::{MqttClient, QosLevel};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub(crate) struct SubscribeCommand {
	topic: Arc<str>,
	qos: QosLevel,
}

impl SubscribeCommand {
	pub(crate) fn new(topic: Arc<str>, qos: QosLevel) -> Self {
		Self { topic, qos }
	}
}

pub(crate) struct SubscribeCommandResult {
	pub(crate) token: SubscriptionToken,
	pub(crate) receiver: flume::Receiver<Message>,
}

#[derive(Debug, Error)]
#[error("failed to subscribe to MQTT topic '{topic}' (qos: {qos})")]
pub struct SubscribeCommandError {
	topic: Arc<str>,
	qos: QosLevel,
	source: DynError,
}

#[async_trait(?Send)]
impl ClientCommand for SubscribeCommand {
	const NAME: &'static str = "subscribe";

	type Result = SubscribeCommandResult;
	type Error = SubscribeCommandError;

	async fn run<T: MqttClient>(
		&self,
		client: &mut InnerClient,
		mqtt: &T,
	) -> Result<Self::Result, Self::Error> {
		let (sender, receiver) = flume::unbounded();
		let (route_id, first) = client.router.insert(&self.topic, sender);

		if first {
			if let Err(source) = mqtt.subscribe(&*self.topic, self.qos).await {
				client.router.remove(route_id);
				return Err(self.create_error(source));
			}
		} else {
			debug!(topic = %self.topic, "topic already subscribed");
		}

		let token = client.subscriptions.insert(route_id);
		Ok(SubscribeCommandResult { token, receiver })
	}

	fn create_error(&self, source: impl std::error::Error + Send + Sync + 'static) -> Self::Error {
		SubscribeCommandError {
			topic: self.topic.clone(),
			qos: self.qos,
			source: DynError::new(source),
		}
	}
}
