use crate::text::title_case;
use airbolt_api::{DeviceType, FoundDevice, HistoryEntry, OperatingMode, UpdateType};
use chrono::{DateTime, Utc};
use hass_mqtt_proto::Device;

pub const MANUFACTURER: &str = "Airbolt";

/// Last known position of a tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
	pub latitude: f64,
	pub longitude: f64,
	/// Meters. Only history entries carry an accuracy.
	pub accuracy: Option<f64>,
}

/// Latest known state of one tracker.
///
/// Rebuilt on every poll from the device listing and, when the tracker has
/// reported, its newest history entry. History values win over the listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracker {
	id: String,
	uuid: String,
	name: String,
	imei: String,
	iccid: String,
	device_type: DeviceType,
	operating_mode: OperatingMode,
	reporting_interval: u32,
	last_report_time: DateTime<Utc>,
	last_report_type: UpdateType,
	modem_temperature: Option<i32>,
	modem_voltage: Option<i32>,
	address: Option<String>,
	location: Location,
	esim_status: String,
	alarm: bool,
	emergency_mode: bool,
	marked_as_lost: bool,
}

impl Tracker {
	pub fn new(device: &FoundDevice, history: Option<&HistoryEntry>) -> Self {
		let location = match history {
			Some(entry) => Location {
				latitude: entry.latitude,
				longitude: entry.longitude,
				accuracy: Some(entry.accuracy),
			},
			None => Location {
				latitude: device.latitude,
				longitude: device.longitude,
				accuracy: None,
			},
		};

		Self {
			id: device.id.clone(),
			uuid: device.device_uuid.clone(),
			name: device.name.clone(),
			imei: device.imei.clone(),
			iccid: device.iccid.clone(),
			device_type: device.device_type.clone(),
			operating_mode: device.operating_mode,
			reporting_interval: device.schedule_report_interval,
			last_report_time: history.map_or(device.last_seen_time, |h| h.last_seen_on),
			last_report_type: history.map_or(device.last_report_type, |h| h.alert_type),
			modem_temperature: history
				.and_then(|h| h.modem_temperature)
				.or(Some(device.modem_temperature_f)),
			modem_voltage: history
				.and_then(|h| h.modem_voltage)
				.or(Some(device.modem_voltage)),
			address: history
				.map(|h| h.address.trim())
				.filter(|a| !a.is_empty())
				.map(str::to_owned),
			location,
			esim_status: device.esim.status.clone(),
			alarm: device.alarm,
			emergency_mode: device.emergency_mode,
			marked_as_lost: device.mark_as_lost != 0,
		}
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn uuid(&self) -> &str {
		&self.uuid
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn imei(&self) -> &str {
		&self.imei
	}

	pub fn iccid(&self) -> &str {
		&self.iccid
	}

	pub fn device_type(&self) -> &DeviceType {
		&self.device_type
	}

	pub fn operating_mode(&self) -> OperatingMode {
		self.operating_mode
	}

	/// Seconds between scheduled reports.
	pub fn reporting_interval(&self) -> u32 {
		self.reporting_interval
	}

	pub fn last_report_time(&self) -> DateTime<Utc> {
		self.last_report_time
	}

	pub fn last_report_type(&self) -> UpdateType {
		self.last_report_type
	}

	/// Degrees Fahrenheit.
	pub fn modem_temperature(&self) -> Option<i32> {
		self.modem_temperature
	}

	/// Millivolts.
	pub fn modem_voltage(&self) -> Option<i32> {
		self.modem_voltage
	}

	pub fn address(&self) -> Option<&str> {
		self.address.as_deref()
	}

	pub fn location(&self) -> Location {
		self.location
	}

	pub fn esim_status(&self) -> &str {
		&self.esim_status
	}

	pub fn alarm(&self) -> bool {
		self.alarm
	}

	pub fn emergency_mode(&self) -> bool {
		self.emergency_mode
	}

	pub fn marked_as_lost(&self) -> bool {
		self.marked_as_lost
	}

	/// The device registry entry every entity of this tracker belongs to.
	/// Unnamed trackers are registered under their id.
	pub fn device_info(&self) -> Device<'_> {
		let name = match self.name.trim() {
			"" => self.id.as_str(),
			name => name,
		};

		Device::new(self.id.as_str())
			.manufacturer(MANUFACTURER)
			.model(title_case(&self.device_type.as_str().replace('_', " ")))
			.name(name)
			.serial_number(self.imei.as_str())
			.hw_version(self.device_type.as_str())
	}
}
