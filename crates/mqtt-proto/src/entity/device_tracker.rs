use crate::{
	Payload, SourceType, Template, Topic,
	entity::{Entity, EntityInvalidity},
	validation::ValidateContextExt,
};
use semval::{Validate, ValidationResult, context::Context};
use serde::{Deserialize, Serialize};

/// An MQTT device tracker. Without a `state_topic`, Home Assistant derives the
/// zone from the `latitude`, `longitude` and `gps_accuracy` entity attributes
/// published on `json_attributes_topic`.
///
/// See: <https://www.home-assistant.io/integrations/device_tracker.mqtt/>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTracker<'a> {
	#[serde(borrow, flatten)]
	pub entity: Entity<'a>,

	/// Defaults to `home`.
	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub payload_home: Option<Payload<'a>>,

	/// Defaults to `not_home`.
	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub payload_not_home: Option<Payload<'a>>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source_type: Option<SourceType>,

	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub state_topic: Option<Topic<'a>>,

	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub value_template: Option<Template<'a>>,
}

impl<'a> DeviceTracker<'a> {
	pub fn new(entity: Entity<'a>) -> Self {
		Self {
			entity,
			payload_home: None,
			payload_not_home: None,
			source_type: None,
			state_topic: None,
			value_template: None,
		}
	}

	pub fn source_type(mut self, source_type: SourceType) -> Self {
		self.source_type = Some(source_type);
		self
	}

	pub fn state_topic(mut self, state_topic: impl Into<Topic<'a>>) -> Self {
		self.state_topic = Some(state_topic.into());
		self
	}
}

impl<'a> Validate for DeviceTracker<'a> {
	type Invalidity = EntityInvalidity;

	fn validate(&self) -> ValidationResult<Self::Invalidity> {
		Context::new()
			.validate_with(&self.entity, |v| v)
			.validate_with_opt(&self.payload_home, EntityInvalidity::Payload)
			.validate_with_opt(&self.payload_not_home, EntityInvalidity::Payload)
			.validate_with_opt(&self.state_topic, EntityInvalidity::Topic)
			.validate_with_opt(&self.value_template, EntityInvalidity::Template)
			.into()
	}
}
