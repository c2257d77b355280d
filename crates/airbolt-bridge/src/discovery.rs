//! Discovery documents announcing a tracker's entities to Home Assistant.

use airbolt_hub::{Tracker, TrackerSensor, location};
use hass_mqtt_proto::{Availability, DeviceTracker, Entity, Sensor, SourceType};
use std::borrow::Cow;

pub const SENSOR_COMPONENT: &str = "sensor";
pub const DEVICE_TRACKER_COMPONENT: &str = "device_tracker";

/// Topics the entities of one tracker read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerTopics {
	/// Shared JSON state document of all sensors.
	pub state: String,
	/// JSON attributes of the device tracker.
	pub attributes: String,
	/// Bridge availability.
	pub availability: String,
}

fn entity<'a>(unique_id: String, tracker: &'a Tracker, topics: &'a TrackerTopics) -> Entity<'a> {
	Entity::new(unique_id.clone())
		.object_id(unique_id)
		.device(tracker.device_info())
		.availability(vec![Availability::new(topics.availability.as_str())])
}

pub fn sensor_document<'a>(
	tracker: &'a Tracker,
	sensor: &dyn TrackerSensor,
	topics: &'a TrackerTopics,
) -> Sensor<'a> {
	let mut entity = entity(sensor.unique_id(tracker), tracker, topics)
		.name(sensor.name())
		.entity_category(sensor.entity_category());

	if let Some(icon) = sensor.icon() {
		entity = entity.icon(icon);
	}

	let mut builder = Sensor::builder(entity)
		.device_class(sensor.device_class())
		.state_class(sensor.state_class())
		.unit_of_measurement(sensor.unit())
		.value_template(format!("{{{{ value_json.{} }}}}", sensor.metric()));

	if let Some(options) = sensor.options(tracker) {
		builder = builder.options(options.into_iter().map(Cow::Owned).collect::<Vec<_>>());
	}

	if let Some(precision) = sensor.suggested_display_precision() {
		builder = builder.suggested_display_precision(precision);
	}

	builder.state_topic(topics.state.as_str()).build()
}

pub fn location_document<'a>(tracker: &'a Tracker, topics: &'a TrackerTopics) -> DeviceTracker<'a> {
	let entity = entity(location::unique_id(tracker), tracker, topics)
		.name("Location")
		.icon("mdi:crosshairs-gps")
		.json_attributes(topics.attributes.as_str(), None);

	DeviceTracker::new(entity).source_type(SourceType::Gps)
}

#[cfg(test)]
mod tests {
	use super::*;
	use airbolt_api::{FoundDeviceList, schema::decode};
	use airbolt_hub::sensor::{self, BatteryPercent, OperatingModeSensor, ReportedAddress};
	use hass_mqtt_proto::ValidateExt;
	use serde_json::json;

	const DEVICES: &[u8] = include_bytes!("../../airbolt-api/fixtures/devices.json");

	fn tracker() -> Tracker {
		let devices: FoundDeviceList = decode(DEVICES).unwrap();
		Tracker::new(&devices[0], None)
	}

	fn topics() -> TrackerTopics {
		TrackerTopics {
			state: "airbolt/default/63f1c0ffee0000000000a001/state".into(),
			attributes: "airbolt/default/63f1c0ffee0000000000a001/attributes".into(),
			availability: "airbolt/default/available".into(),
		}
	}

	#[test]
	fn battery_sensor_document() {
		let tracker = tracker();
		let topics = topics();
		let document = sensor_document(&tracker, &BatteryPercent, &topics);

		assert_eq!(
			serde_json::to_value(&document).unwrap(),
			json!({
				"availability": [{ "topic": "airbolt/default/available" }],
				"device": {
					"identifiers": ["63f1c0ffee0000000000a001"],
					"manufacturer": "Airbolt",
					"model": "Shield Gps",
					"name": "Backpack",
					"serial_number": "86123456789a001",
					"hw_version": "shield_gps",
				},
				"name": "Battery Percent",
				"object_id": "63f1c0ffee0000000000a001_battery_percent",
				"unique_id": "63f1c0ffee0000000000a001_battery_percent",
				"device_class": "battery",
				"state_class": "measurement",
				"state_topic": "airbolt/default/63f1c0ffee0000000000a001/state",
				"unit_of_measurement": "%",
				"value_template": "{{ value_json.battery_percent }}",
			})
		);
	}

	#[test]
	fn enum_sensor_lists_options() {
		let tracker = tracker();
		let topics = topics();
		let document = serde_json::to_value(sensor_document(&tracker, &OperatingModeSensor, &topics)).unwrap();

		assert_eq!(document["device_class"], "enum");
		assert_eq!(document["entity_category"], "diagnostic");
		assert_eq!(document["icon"], "mdi:cog");
		assert_eq!(document["options"], json!(["Batterylife", "Responsiveness"]));
	}

	#[test]
	fn plain_sensor_has_no_class() {
		let tracker = tracker();
		let topics = topics();
		let document = serde_json::to_value(sensor_document(&tracker, &ReportedAddress, &topics)).unwrap();

		assert!(document.get("device_class").is_none());
		assert!(document.get("unit_of_measurement").is_none());
		assert!(document.get("entity_category").is_none());
	}

	#[test]
	fn every_sensor_document_is_valid() {
		let tracker = tracker();
		let topics = topics();

		for sensor in sensor::ALL {
			let document = sensor_document(&tracker, *sensor, &topics);
			if let Err(e) = document.validated() {
				panic!("{} is invalid: {e}", sensor.metric());
			}
		}
	}

	#[test]
	fn location_document_reads_attributes() {
		let tracker = tracker();
		let topics = topics();
		let document = location_document(&tracker, &topics);

		assert!(document.validated().is_ok());
		let document = serde_json::to_value(&document).unwrap();
		assert_eq!(document["unique_id"], "63f1c0ffee0000000000a001_location");
		assert_eq!(document["source_type"], "gps");
		assert_eq!(
			document["json_attributes_topic"],
			"airbolt/default/63f1c0ffee0000000000a001/attributes"
		);
		assert!(document.get("state_topic").is_none());
	}
}
