use super::{ClientCommand, InnerClient};
use async_trait::async_trait;
use hass_dyn_error::DynError;
use hass_mqtt_provider::MqttClient;
use std::time::Duration;
use thiserror::Error;

/// Disconnects from the broker, publishing the last will, and stops the
/// client thread.
pub(crate) struct DisconnectCommand {
	timeout: Duration,
}

impl DisconnectCommand {
	pub(crate) fn new(timeout: Duration) -> Self {
		Self { timeout }
	}
}

#[derive(Debug, Error)]
#[error("failed to disconnect from MQTT broker")]
pub struct DisconnectCommandError {
	source: DynError,
}

#[async_trait(?Send)]
impl ClientCommand for DisconnectCommand {
	const NAME: &'static str = "disconnect";

	type Result = ();
	type Error = DisconnectCommandError;

	async fn run<T: MqttClient>(
		&self,
		client: &mut InnerClient,
		mqtt: &T,
	) -> Result<Self::Result, Self::Error> {
		client.stopped = true;
		mqtt
			.disconnect(self.timeout, true)
			.await
			.map_err(|source| self.create_error(source))
	}

	fn create_error(&self, source: impl std::error::Error + Send + Sync + 'static) -> Self::Error {
		DisconnectCommandError {
			source: DynError::new(source),
		}
	}
}
