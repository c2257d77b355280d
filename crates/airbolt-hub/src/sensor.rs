//! Sensors exposed for every tracker.
//!
//! Each sensor reads one value from a [Tracker]. A value the tracker has not
//! reported is `None`, never an error.

use crate::{Tracker, text::title_case};
use airbolt_api::OperatingMode;
use chrono::{DateTime, SecondsFormat, Utc};
use hass_mqtt_proto::{DeviceClass, EntityCategory, StateClass};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Battery voltage reported at an empty battery. Empirical.
pub const BATTERY_EMPTY_VOLTS: f64 = 3.65;
/// Battery voltage reported at a full battery. Empirical.
pub const BATTERY_FULL_VOLTS: f64 = 4.17;

/// State of a single sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
	Timestamp(#[serde(serialize_with = "serialize_rfc3339")] DateTime<Utc>),
	Integer(i64),
	Float(f64),
	Text(String),
}

fn serialize_rfc3339<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
	serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Secs, true))
}

impl From<i64> for SensorValue {
	fn from(value: i64) -> Self {
		SensorValue::Integer(value)
	}
}

impl From<f64> for SensorValue {
	fn from(value: f64) -> Self {
		SensorValue::Float(value)
	}
}

impl From<String> for SensorValue {
	fn from(value: String) -> Self {
		SensorValue::Text(value)
	}
}

impl From<DateTime<Utc>> for SensorValue {
	fn from(value: DateTime<Utc>) -> Self {
		SensorValue::Timestamp(value)
	}
}

/// A sensor entity derived from tracker state.
pub trait TrackerSensor: Send + Sync {
	/// Key of the sensor in the tracker's state document, and suffix of its unique id.
	fn metric(&self) -> &'static str;

	fn name(&self) -> &'static str;

	fn device_class(&self) -> DeviceClass {
		DeviceClass::None
	}

	fn state_class(&self) -> StateClass {
		StateClass::None
	}

	fn unit(&self) -> Option<&'static str> {
		None
	}

	fn entity_category(&self) -> EntityCategory {
		EntityCategory::None
	}

	fn icon(&self) -> Option<&'static str> {
		None
	}

	fn suggested_display_precision(&self) -> Option<u8> {
		None
	}

	/// Possible states of an `enum` sensor.
	fn options(&self, _tracker: &Tracker) -> Option<Vec<String>> {
		None
	}

	fn state(&self, tracker: &Tracker) -> Option<SensorValue>;

	fn unique_id(&self, tracker: &Tracker) -> String {
		format!("{}_{}", tracker.id(), self.metric())
	}
}

/// Every sensor, in the order they are announced.
pub static ALL: &[&dyn TrackerSensor] = &[
	&LastSeen,
	&ModemTemperature,
	&ModemVoltage,
	&DeviceTypeSensor,
	&OperatingModeSensor,
	&ReportingInterval,
	&ReportedAddress,
	&BatteryPercent,
];

/// The state document shared by all sensors of a tracker, keyed by metric.
pub fn states(tracker: &Tracker) -> BTreeMap<&'static str, Option<SensorValue>> {
	ALL.iter()
		.map(|sensor| (sensor.metric(), sensor.state(tracker)))
		.collect()
}

/// Estimated charge from the modem voltage, linear between
/// [BATTERY_EMPTY_VOLTS] and [BATTERY_FULL_VOLTS].
///
/// Readings outside that range are clamped to `0..=100`. A charging tracker
/// reports more than the full voltage and a dying one less than the empty
/// voltage, and Home Assistant expects a battery sensor to stay a percentage.
pub fn battery_percent(millivolts: i32) -> Option<u8> {
	if millivolts == 0 {
		return None;
	}

	let volts = f64::from(millivolts) / 1000.0;
	let percent = (volts - BATTERY_EMPTY_VOLTS) / (BATTERY_FULL_VOLTS - BATTERY_EMPTY_VOLTS) * 100.0;
	Some(percent.round_ties_even().clamp(0.0, 100.0) as u8)
}

fn nonzero_voltage(tracker: &Tracker) -> Option<i32> {
	tracker.modem_voltage().filter(|mv| *mv != 0)
}

pub struct LastSeen;

impl TrackerSensor for LastSeen {
	fn metric(&self) -> &'static str {
		"last_seen"
	}

	fn name(&self) -> &'static str {
		"Last Seen"
	}

	fn device_class(&self) -> DeviceClass {
		DeviceClass::Timestamp
	}

	fn state(&self, tracker: &Tracker) -> Option<SensorValue> {
		Some(tracker.last_report_time().into())
	}
}

pub struct ModemTemperature;

impl TrackerSensor for ModemTemperature {
	fn metric(&self) -> &'static str {
		"modem_temperature"
	}

	fn name(&self) -> &'static str {
		"Modem Temperature"
	}

	fn device_class(&self) -> DeviceClass {
		DeviceClass::Temperature
	}

	fn state_class(&self) -> StateClass {
		StateClass::Measurement
	}

	fn unit(&self) -> Option<&'static str> {
		Some("°F")
	}

	fn entity_category(&self) -> EntityCategory {
		EntityCategory::Diagnostic
	}

	fn state(&self, tracker: &Tracker) -> Option<SensorValue> {
		tracker.modem_temperature().map(|t| i64::from(t).into())
	}
}

pub struct ModemVoltage;

impl TrackerSensor for ModemVoltage {
	fn metric(&self) -> &'static str {
		"modem_voltage"
	}

	fn name(&self) -> &'static str {
		"Modem Voltage"
	}

	fn device_class(&self) -> DeviceClass {
		DeviceClass::Voltage
	}

	fn state_class(&self) -> StateClass {
		StateClass::Measurement
	}

	fn unit(&self) -> Option<&'static str> {
		Some("V")
	}

	fn entity_category(&self) -> EntityCategory {
		EntityCategory::Diagnostic
	}

	fn suggested_display_precision(&self) -> Option<u8> {
		Some(2)
	}

	fn state(&self, tracker: &Tracker) -> Option<SensorValue> {
		nonzero_voltage(tracker).map(|mv| (f64::from(mv) / 1000.0).into())
	}
}

pub struct DeviceTypeSensor;

impl DeviceTypeSensor {
	fn display(tracker: &Tracker) -> String {
		title_case(&tracker.device_type().as_str().replace('_', " "))
	}
}

impl TrackerSensor for DeviceTypeSensor {
	fn metric(&self) -> &'static str {
		"device_type"
	}

	fn name(&self) -> &'static str {
		"Device Type"
	}

	fn device_class(&self) -> DeviceClass {
		DeviceClass::Enum
	}

	fn entity_category(&self) -> EntityCategory {
		EntityCategory::Diagnostic
	}

	fn icon(&self) -> Option<&'static str> {
		Some("mdi:chip")
	}

	// Only one type is known, so the tracker's own type is the only option.
	fn options(&self, tracker: &Tracker) -> Option<Vec<String>> {
		Some(vec![Self::display(tracker)])
	}

	fn state(&self, tracker: &Tracker) -> Option<SensorValue> {
		Some(Self::display(tracker).into())
	}
}

pub struct OperatingModeSensor;

impl TrackerSensor for OperatingModeSensor {
	fn metric(&self) -> &'static str {
		"operating_mode"
	}

	fn name(&self) -> &'static str {
		"Operating Mode"
	}

	fn device_class(&self) -> DeviceClass {
		DeviceClass::Enum
	}

	fn entity_category(&self) -> EntityCategory {
		EntityCategory::Diagnostic
	}

	fn icon(&self) -> Option<&'static str> {
		Some("mdi:cog")
	}

	fn options(&self, _tracker: &Tracker) -> Option<Vec<String>> {
		Some(
			OperatingMode::ALL
				.iter()
				.map(|mode| title_case(mode.as_str()))
				.collect(),
		)
	}

	fn state(&self, tracker: &Tracker) -> Option<SensorValue> {
		Some(title_case(tracker.operating_mode().as_str()).into())
	}
}

pub struct ReportingInterval;

impl TrackerSensor for ReportingInterval {
	fn metric(&self) -> &'static str {
		"reporting_interval"
	}

	fn name(&self) -> &'static str {
		"Reporting Interval"
	}

	fn device_class(&self) -> DeviceClass {
		DeviceClass::Duration
	}

	fn unit(&self) -> Option<&'static str> {
		Some("s")
	}

	fn entity_category(&self) -> EntityCategory {
		EntityCategory::Diagnostic
	}

	fn icon(&self) -> Option<&'static str> {
		Some("mdi:timer-outline")
	}

	fn state(&self, tracker: &Tracker) -> Option<SensorValue> {
		Some(i64::from(tracker.reporting_interval()).into())
	}
}

pub struct ReportedAddress;

impl TrackerSensor for ReportedAddress {
	fn metric(&self) -> &'static str {
		"reported_address"
	}

	fn name(&self) -> &'static str {
		"Reported Address"
	}

	fn icon(&self) -> Option<&'static str> {
		Some("mdi:map-marker")
	}

	fn state(&self, tracker: &Tracker) -> Option<SensorValue> {
		tracker.address().map(|a| a.to_owned().into())
	}
}

pub struct BatteryPercent;

impl TrackerSensor for BatteryPercent {
	fn metric(&self) -> &'static str {
		"battery_percent"
	}

	fn name(&self) -> &'static str {
		"Battery Percent"
	}

	fn device_class(&self) -> DeviceClass {
		DeviceClass::Battery
	}

	fn state_class(&self) -> StateClass {
		StateClass::Measurement
	}

	fn unit(&self) -> Option<&'static str> {
		Some("%")
	}

	fn state(&self, tracker: &Tracker) -> Option<SensorValue> {
		nonzero_voltage(tracker)
			.and_then(battery_percent)
			.map(|p| i64::from(p).into())
	}
}
