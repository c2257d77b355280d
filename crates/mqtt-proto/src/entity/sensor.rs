use crate::{
	DeviceClass, StateClass, Template, Topic,
	entity::{Entity, EntityInvalidity},
	validation::ValidateContextExt,
};
use semval::{Validate, ValidationResult, context::Context};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, num::NonZeroU32};

/// An MQTT sensor. The value is read from `state_topic`, optionally through
/// `value_template`. When state messages are retained, the sensor picks up
/// the last known value as soon as it is created.
///
/// See: <https://www.home-assistant.io/integrations/sensor.mqtt/>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor<'a> {
	#[serde(borrow, flatten)]
	pub entity: Entity<'a>,

	#[serde(default, skip_serializing_if = "DeviceClass::is_none")]
	pub device_class: DeviceClass,

	/// Seconds after which the state becomes `unavailable` if it has not been
	/// updated.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expire_after: Option<NonZeroU32>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub force_update: Option<bool>,

	/// The allowed states of an `enum` sensor.
	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub options: Option<Cow<'a, [Cow<'a, str>]>>,

	#[serde(default, skip_serializing_if = "StateClass::is_none")]
	pub state_class: StateClass,

	#[serde(borrow)]
	pub state_topic: Topic<'a>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub suggested_display_precision: Option<u8>,

	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub unit_of_measurement: Option<Cow<'a, str>>,

	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub value_template: Option<Template<'a>>,
}

impl<'a> Sensor<'a> {
	pub fn builder(entity: Entity<'a>) -> SensorBuilder<'a, ()> {
		SensorBuilder {
			entity,
			device_class: DeviceClass::None,
			expire_after: None,
			options: None,
			state_class: StateClass::None,
			state_topic: (),
			suggested_display_precision: None,
			unit_of_measurement: None,
			value_template: None,
		}
	}
}

impl<'a> Validate for Sensor<'a> {
	type Invalidity = EntityInvalidity;

	fn validate(&self) -> ValidationResult<Self::Invalidity> {
		let missing_options = self.device_class == DeviceClass::Enum
			&& self.options.as_deref().is_none_or(<[_]>::is_empty);

		Context::new()
			.validate_with(&self.entity, |v| v)
			.invalidate_if(missing_options, EntityInvalidity::MissingOptions)
			.validate_with(&self.state_topic, EntityInvalidity::Topic)
			.validate_with_opt(&self.value_template, EntityInvalidity::Template)
			.into()
	}
}

/// Builds a [Sensor]. The state topic is required, so [SensorBuilder::build]
/// only exists once one has been given.
pub struct SensorBuilder<'a, T> {
	entity: Entity<'a>,
	device_class: DeviceClass,
	expire_after: Option<NonZeroU32>,
	options: Option<Cow<'a, [Cow<'a, str>]>>,
	state_class: StateClass,
	state_topic: T,
	suggested_display_precision: Option<u8>,
	unit_of_measurement: Option<Cow<'a, str>>,
	value_template: Option<Template<'a>>,
}

impl<'a, T> SensorBuilder<'a, T> {
	pub fn device_class(mut self, device_class: DeviceClass) -> Self {
		self.device_class = device_class;
		self
	}

	pub fn expire_after(mut self, expire_after: Option<NonZeroU32>) -> Self {
		self.expire_after = expire_after;
		self
	}

	pub fn options(mut self, options: impl Into<Cow<'a, [Cow<'a, str>]>>) -> Self {
		self.options = Some(options.into());
		self
	}

	pub fn state_class(mut self, state_class: StateClass) -> Self {
		self.state_class = state_class;
		self
	}

	pub fn state_topic<U>(self, state_topic: U) -> SensorBuilder<'a, U>
	where
		U: Into<Topic<'a>>,
	{
		SensorBuilder {
			entity: self.entity,
			device_class: self.device_class,
			expire_after: self.expire_after,
			options: self.options,
			state_class: self.state_class,
			state_topic,
			suggested_display_precision: self.suggested_display_precision,
			unit_of_measurement: self.unit_of_measurement,
			value_template: self.value_template,
		}
	}

	pub fn suggested_display_precision(mut self, precision: u8) -> Self {
		self.suggested_display_precision = Some(precision);
		self
	}

	pub fn unit_of_measurement(mut self, unit: Option<impl Into<Cow<'a, str>>>) -> Self {
		self.unit_of_measurement = unit.map(Into::into);
		self
	}

	pub fn value_template(mut self, value_template: impl Into<Template<'a>>) -> Self {
		self.value_template = Some(value_template.into());
		self
	}
}

impl<'a, T> SensorBuilder<'a, T>
where
	T: Into<Topic<'a>>,
{
	pub fn build(self) -> Sensor<'a> {
		Sensor {
			entity: self.entity,
			device_class: self.device_class,
			expire_after: self.expire_after,
			force_update: None,
			options: self.options,
			state_class: self.state_class,
			state_topic: self.state_topic.into(),
			suggested_display_precision: self.suggested_display_precision,
			unit_of_measurement: self.unit_of_measurement,
			value_template: self.value_template,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{Device, EntityCategory};
	use serde_json::json;

	#[test]
	fn voltage_sensor_json() {
		let sensor = Sensor::builder(
			Entity::new("abc_modem_voltage")
				.name("Modem Voltage")
				.entity_category(EntityCategory::Diagnostic)
				.device(Device::new("abc").manufacturer("Airbolt")),
		)
		.device_class(DeviceClass::Voltage)
		.state_class(StateClass::Measurement)
		.unit_of_measurement(Some("V"))
		.state_topic("airbolt/default/abc/state")
		.value_template("{{ value_json.modem_voltage }}")
		.build();

		assert_eq!(
			serde_json::to_value(&sensor).expect("should serialize"),
			json!({
				"device": { "identifiers": ["abc"], "manufacturer": "Airbolt" },
				"device_class": "voltage",
				"entity_category": "diagnostic",
				"name": "Modem Voltage",
				"state_class": "measurement",
				"state_topic": "airbolt/default/abc/state",
				"unique_id": "abc_modem_voltage",
				"unit_of_measurement": "V",
				"value_template": "{{ value_json.modem_voltage }}",
			})
		);
		assert!(sensor.validate().is_ok());
	}

	#[test]
	fn parses_flattened_document() {
		let json = r#"{
			"name": "Operating Mode",
			"unique_id": "abc_operating_mode",
			"device_class": "enum",
			"options": ["Batterylife", "Responsiveness"],
			"state_topic": "airbolt/default/abc/state"
		}"#;

		let sensor: Sensor = serde_json::from_str(json).expect("should parse");
		assert_eq!(sensor.entity.name.as_deref(), Some("Operating Mode"));
		assert_eq!(sensor.device_class, DeviceClass::Enum);
		assert_eq!(sensor.options.as_deref().map(<[_]>::len), Some(2));
		assert_eq!(sensor.state_topic.as_str(), "airbolt/default/abc/state");
	}

	#[test]
	fn enum_sensor_without_options_is_invalid() {
		let err: Vec<_> = Sensor::builder(Entity::new("abc_device_type"))
			.device_class(DeviceClass::Enum)
			.state_topic("airbolt/default/abc/state")
			.build()
			.validate()
			.expect_err("should be invalid")
			.into_iter()
			.collect();

		assert_eq!(&*err, &[EntityInvalidity::MissingOptions]);
	}

	#[test]
	fn enum_sensor_with_options_is_valid() {
		let sensor = Sensor::builder(Entity::new("abc_device_type"))
			.device_class(DeviceClass::Enum)
			.options(vec![Cow::Borrowed("Shield Gps")])
			.state_topic("airbolt/default/abc/state")
			.build();

		assert!(sensor.validate().is_ok());
	}
}
