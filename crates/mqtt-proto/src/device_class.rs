use serde::{Deserialize, Serialize};

/// The kind of value a sensor reports. This drives how the value is displayed
/// in the frontend and which units are accepted.
#[derive(
	Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
	/// Generic sensor. Never written to a document.
	#[default]
	None,

	/// Percentage of battery that is left.
	Battery,

	/// Current in A.
	Current,

	/// Date string (ISO 8601).
	Date,

	/// Distance in km, m, mi and the like.
	Distance,

	/// Duration in d, h, min or s.
	Duration,

	/// A value from a fixed set of options, listed in the `options` field of
	/// the sensor.
	Enum,

	/// Percentage of humidity in the air.
	Humidity,

	/// Power in W or kW.
	Power,

	/// Signal strength in dB or dBm.
	SignalStrength,

	/// Speed in km/h, m/s and the like.
	Speed,

	/// Temperature in °C or °F.
	Temperature,

	/// Datetime object or timestamp string (ISO 8601).
	Timestamp,

	/// Voltage in V.
	Voltage,
}

impl DeviceClass {
	#[inline]
	pub const fn is_none(&self) -> bool {
		matches!(self, Self::None)
	}
}
