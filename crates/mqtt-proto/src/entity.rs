use crate::{
	Availability, AvailabilityMode, EntityCategory, Icon, MqttQoS, Name, NameInvalidity,
	PayloadInvalidity, Template, TemplateInvalidity, Topic, UniqueId, UniqueIdInvalidity,
	availability::AvailabilityInvalidity,
	device::{Device, DeviceInvalidity},
	icon::IconInvalidity,
	topic::TopicInvalidity,
	validation::ValidateContextExt,
};
use semval::{Validate, ValidationResult, context::Context};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

mod device_tracker;
mod sensor;

pub use device_tracker::DeviceTracker;
pub use sensor::{Sensor, SensorBuilder};

/// Fields shared by every discoverable MQTT entity.
///
/// See: <https://www.home-assistant.io/integrations/mqtt/#mqtt-discovery>
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity<'a> {
	/// Topics subscribed to receive availability (online/offline) updates.
	#[serde(borrow, default, skip_serializing_if = "<[Availability]>::is_empty")]
	pub availability: Cow<'a, [Availability<'a>]>,

	#[serde(default, skip_serializing_if = "AvailabilityMode::is_default")]
	pub availability_mode: AvailabilityMode,

	/// The device this entity belongs to. Only used by Home Assistant when
	/// `unique_id` is set.
	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub device: Option<Device<'a>>,

	/// Whether the entity is enabled when first added. Home Assistant defaults
	/// to `true`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub enabled_by_default: Option<bool>,

	#[serde(default, skip_serializing_if = "EntityCategory::is_none")]
	pub entity_category: EntityCategory,

	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub icon: Option<Icon<'a>>,

	/// Template extracting the attribute dictionary from messages on
	/// `json_attributes_topic`.
	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub json_attributes_template: Option<Template<'a>>,

	/// Topic carrying a JSON dictionary that is set as entity attributes.
	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub json_attributes_topic: Option<Topic<'a>>,

	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub name: Option<Name<'a>>,

	/// Used instead of `name` to generate the `entity_id`.
	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub object_id: Option<Cow<'a, str>>,

	#[serde(default, skip_serializing_if = "MqttQoS::is_default")]
	pub qos: MqttQoS,

	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub unique_id: Option<UniqueId<'a>>,
}

impl<'a> Entity<'a> {
	pub fn new(unique_id: impl Into<UniqueId<'a>>) -> Self {
		Self {
			unique_id: Some(unique_id.into()),
			..Default::default()
		}
	}

	pub fn availability(mut self, availability: impl Into<Cow<'a, [Availability<'a>]>>) -> Self {
		self.availability = availability.into();
		self
	}

	pub fn device(mut self, device: Device<'a>) -> Self {
		self.device = Some(device);
		self
	}

	pub fn entity_category(mut self, entity_category: EntityCategory) -> Self {
		self.entity_category = entity_category;
		self
	}

	pub fn icon(mut self, icon: impl Into<Icon<'a>>) -> Self {
		self.icon = Some(icon.into());
		self
	}

	pub fn json_attributes(
		mut self,
		topic: impl Into<Topic<'a>>,
		template: Option<Template<'a>>,
	) -> Self {
		self.json_attributes_topic = Some(topic.into());
		self.json_attributes_template = template;
		self
	}

	pub fn name(mut self, name: impl Into<Name<'a>>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn object_id(mut self, object_id: impl Into<Cow<'a, str>>) -> Self {
		self.object_id = Some(object_id.into());
		self
	}

	pub fn qos(mut self, qos: MqttQoS) -> Self {
		self.qos = qos;
		self
	}
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EntityInvalidity {
	Availability(usize, AvailabilityInvalidity),
	Device(DeviceInvalidity),
	Icon(IconInvalidity),
	MissingOptions,
	Name(NameInvalidity),
	Payload(PayloadInvalidity),
	Template(TemplateInvalidity),
	Topic(TopicInvalidity),
	UniqueId(UniqueIdInvalidity),
}

impl<'a> Validate for Entity<'a> {
	type Invalidity = EntityInvalidity;

	fn validate(&self) -> ValidationResult<Self::Invalidity> {
		Context::new()
			.validate_iter(&*self.availability, EntityInvalidity::Availability)
			.validate_with_opt(&self.device, EntityInvalidity::Device)
			.validate_with_opt(&self.icon, EntityInvalidity::Icon)
			.validate_with_opt(&self.json_attributes_template, EntityInvalidity::Template)
			.validate_with_opt(&self.json_attributes_topic, EntityInvalidity::Topic)
			.validate_with_opt(&self.name, EntityInvalidity::Name)
			.validate_with_opt(&self.unique_id, EntityInvalidity::UniqueId)
			.into()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn minimal_entity_only_has_unique_id() {
		let value = serde_json::to_value(Entity::new("abc_last_seen")).expect("should serialize");
		assert_eq!(value, json!({ "unique_id": "abc_last_seen" }));
	}

	#[test]
	fn diagnostic_entity_json() {
		let availability = [Availability::new("airbolt/default/available")];
		let entity = Entity::new("abc_modem_voltage")
			.name("Modem Voltage")
			.object_id("backpack_modem_voltage")
			.entity_category(EntityCategory::Diagnostic)
			.icon("mdi:flash")
			.availability(&availability[..])
			.qos(MqttQoS::AtLeastOnce);

		let value = serde_json::to_value(&entity).expect("should serialize");
		assert_eq!(
			value,
			json!({
				"availability": [{ "topic": "airbolt/default/available" }],
				"entity_category": "diagnostic",
				"icon": "mdi:flash",
				"name": "Modem Voltage",
				"object_id": "backpack_modem_voltage",
				"qos": 1,
				"unique_id": "abc_modem_voltage",
			})
		);
	}

	#[test]
	fn availability_invalidities_carry_index() {
		let availability = [
			Availability::new("airbolt/default/available"),
			Availability::new(""),
		];
		let err: Vec<_> = Entity::new("abc")
			.availability(&availability[..])
			.validate()
			.expect_err("should be invalid")
			.into_iter()
			.collect();

		assert_eq!(
			&*err,
			&[EntityInvalidity::Availability(
				1,
				AvailabilityInvalidity::Topic(TopicInvalidity::Empty)
			)]
		);
	}
}
