use super::{ClientCommand, InnerClient};
use crate::topics::EntityTopicsConfig;
use async_trait::async_trait;
use hass_dyn_error::DynError;
use hass_mqtt_provider::MqttClient;
use std::sync::Arc;
use thiserror::Error;

pub(crate) struct EntityCommand {
	component: Arc<str>,
	object_id: Arc<str>,
}

impl EntityCommand {
	pub(crate) fn new(component: Arc<str>, object_id: Arc<str>) -> Self {
		Self {
			component,
			object_id,
		}
	}
}

#[derive(Debug, Error)]
#[error("failed to create entity topics for {component}.{object_id}")]
pub struct EntityCommandError {
	component: Arc<str>,
	object_id: Arc<str>,
	source: DynError,
}

#[async_trait(?Send)]
impl ClientCommand for EntityCommand {
	const NAME: &'static str = "entity";

	type Result = EntityTopicsConfig;
	type Error = EntityCommandError;

	async fn run<T: MqttClient>(
		&self,
		client: &mut InnerClient,
		_mqtt: &T,
	) -> Result<Self::Result, Self::Error> {
		Ok(client.topics.entity(&self.component, &self.object_id))
	}

	fn create_error(&self, source: impl std::error::Error + Send + Sync + 'static) -> Self::Error {
		EntityCommandError {
			component: self.component.clone(),
			object_id: self.object_id.clone(),
			source: DynError::new(source),
		}
	}
}
