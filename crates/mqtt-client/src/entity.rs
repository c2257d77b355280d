use crate::{HassMqttClient, PublishCommandError, topics::EntityTopicsConfig};
use hass_dyn_error::DynError;
use hass_mqtt_proto::ValidateExt;
use hass_mqtt_provider::QosLevel;
use semval::Validate;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{Level, instrument};

#[derive(Debug, Error)]
pub enum EntityPublishError {
	#[error("invalid discovery document for '{topic}'")]
	Invalid { topic: Arc<str>, source: DynError },

	#[error("failed to serialize document for '{topic}'")]
	Serialize { topic: Arc<str>, source: DynError },

	#[error(transparent)]
	Publish(#[from] PublishCommandError),
}

/// Topics of a single Home Assistant entity, bound to the client that
/// publishes on them.
#[derive(Clone)]
pub struct EntityTopic {
	client: HassMqttClient,
	topics: EntityTopicsConfig,
}

static_assertions::assert_impl_all!(EntityTopic: Send, Sync, Clone);

impl EntityTopic {
	pub(crate) fn new(client: HassMqttClient, topics: EntityTopicsConfig) -> Self {
		EntityTopic { client, topics }
	}

	pub fn discovery_topic(&self) -> &str {
		&self.topics.discovery
	}

	/// Validates and publishes a retained discovery document.
	#[instrument(level = Level::DEBUG, skip_all, fields(topic = %self.topics.discovery))]
	pub async fn publish_discovery<D>(&self, document: &D) -> Result<(), EntityPublishError>
	where
		D: Serialize + Validate,
		D::Invalidity: Send + Sync,
	{
		let topic = &self.topics.discovery;
		document
			.validated()
			.map_err(|e| EntityPublishError::Invalid {
				topic: topic.clone(),
				source: DynError::new(e),
			})?;

		let payload = serde_json::to_vec(document).map_err(|e| EntityPublishError::Serialize {
			topic: topic.clone(),
			source: DynError::new(e),
		})?;

		self
			.client
			.publish(Arc::clone(topic), payload, true, QosLevel::AtLeastOnce)
			.await?;
		Ok(())
	}

	/// Publishes an empty retained discovery payload, which makes Home
	/// Assistant delete the entity.
	#[instrument(level = Level::DEBUG, skip_all, fields(topic = %self.topics.discovery))]
	pub async fn remove(&self) -> Result<(), PublishCommandError> {
		self
			.client
			.publish(
				Arc::clone(&self.topics.discovery),
				Vec::new(),
				true,
				QosLevel::AtLeastOnce,
			)
			.await
	}
}
