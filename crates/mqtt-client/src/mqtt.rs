use crate::{
	HassMqttOptions,
	topics::{NodeId, TopicsConfig},
};
use async_trait::async_trait;
use hass_mqtt_provider::{MqttClient, MqttProvider, MqttProviderCreateError};

pub(crate) struct HassMqttConnection<T>
where
	T: MqttClient,
{
	pub(crate) topics: TopicsConfig,
	pub(crate) client: T,
	pub(crate) client_id: String,
}

#[async_trait(?Send)]
pub(crate) trait MqttProviderExt: MqttProvider {
	async fn create_client(
		options: &HassMqttOptions,
	) -> Result<HassMqttConnection<Self::Client>, Self::Error> {
		let client_id = options.client_id();
		let topics = TopicsConfig::new(
			options.private_prefix_or_default(),
			&*options.discovery_prefix,
			NodeId::new(&*options.node_id),
		);

		let online_message = topics
			.online_message()
			.map_err(|e| Self::Error::create_message("online", e))?;
		let offline_message = topics
			.offline_message()
			.map_err(|e| Self::Error::create_message("offline", e))?;

		let client = Self::create(options, &client_id, online_message, offline_message).await?;
		Ok(HassMqttConnection {
			topics,
			client,
			client_id,
		})
	}
}

#[async_trait(?Send)]
impl<T: MqttProvider> MqttProviderExt for T {}
