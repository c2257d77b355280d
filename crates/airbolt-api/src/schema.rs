//! Response documents of the Airbolt cloud API.
//!
//! Field names follow Rust conventions; the `serde` renames carry the exact
//! wire names used by the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{fmt, ops::Deref};
use thiserror::Error;

/// A response body that did not match the expected document shape.
#[derive(Debug, Error)]
#[error("invalid {document} document at line {line}, column {column}: {message}")]
pub struct DecodeError {
	document: &'static str,
	line: usize,
	column: usize,
	message: String,
	#[source]
	source: serde_json::Error,
}

impl DecodeError {
	pub fn document(&self) -> &'static str {
		self.document
	}

	pub fn line(&self) -> usize {
		self.line
	}

	pub fn column(&self) -> usize {
		self.column
	}
}

/// Decode a response body into `T`.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
	serde_json::from_slice(body).map_err(|source| DecodeError {
		document: short_type_name::<T>(),
		line: source.line(),
		column: source.column(),
		message: source.to_string(),
		source,
	})
}

fn short_type_name<T>() -> &'static str {
	let name = std::any::type_name::<T>();
	let base = name.split('<').next().unwrap_or(name);
	base.rsplit("::").next().unwrap_or(base)
}

/// Kind of event that made a tracker report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateType {
	Motion,
	#[serde(rename = "SOS")]
	Sos,
	Schedule,
	Location,
	#[serde(rename = "CMD")]
	Cmd,
}

impl UpdateType {
	pub const fn as_str(self) -> &'static str {
		match self {
			UpdateType::Motion => "Motion",
			UpdateType::Sos => "SOS",
			UpdateType::Schedule => "Schedule",
			UpdateType::Location => "Location",
			UpdateType::Cmd => "CMD",
		}
	}
}

impl fmt::Display for UpdateType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
	#[serde(rename = "_id")]
	pub id: String,
	pub username: String,
	#[serde(rename = "timeCreated")]
	pub time_created: DateTime<Utc>,
	pub name: String,
	pub email: String,
	pub roles: Vec<String>,
	#[serde(rename = "failedLoginAttempts")]
	pub failed_login_attempts: u32,
	#[serde(rename = "twoFactorEnabled")]
	pub two_factor_enabled: bool,
	#[serde(rename = "profilePicture")]
	pub profile_picture: String,
	#[serde(rename = "blockedUntil", default)]
	pub blocked_until: Option<String>,
	pub country: String,
	pub currency: String,
	pub timezone: String,
	pub deleted: bool,
	#[serde(rename = "cellScanLimit")]
	pub cell_scan_limit: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
	#[serde(rename = "_id")]
	pub id: String,
	#[serde(rename = "userId")]
	pub user_id: String,
	pub key: String,
	pub time: DateTime<Utc>,
	#[serde(rename = "createdAt")]
	pub created_at: DateTime<Utc>,
	#[serde(rename = "updatedAt")]
	pub updated_at: DateTime<Utc>,
	#[serde(rename = "__v")]
	pub v: i64,
}

/// Body of a successful `user/login` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResult {
	#[serde(flatten)]
	pub user: UserInfo,
	pub session: SessionInfo,
	/// Value for the `Authorization` header of every later request.
	#[serde(rename = "authHeader")]
	pub auth_header: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureCondition {
	#[serde(rename = "lessOrEqual")]
	LessOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
	F,
	C,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemperatureConfiguration {
	pub enable: bool,
	#[serde(rename = "sendLocation")]
	pub send_location: bool,
	#[serde(rename = "reAlertDuration")]
	pub realert_duration: i64,
	pub condition: TemperatureCondition,
	pub level: i32,
	pub unit: TemperatureUnit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccelerometerConfiguration {
	pub enable: bool,
	#[serde(rename = "ultraPowerMode")]
	pub ultra_power_mode: bool,
	#[serde(rename = "sendLocation")]
	pub send_location: bool,
	/// 1 is the most sensitive, 10 the least.
	pub sensitivity: u8,
	pub duration: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterAlarmConfiguration {
	pub enable: bool,
	#[serde(rename = "sendLocation")]
	pub send_location: bool,
	#[serde(rename = "reAlertDuration")]
	pub realert_duration: i64,
}

/// The tracker's embedded SIM. Read only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Esim {
	#[serde(rename = "_id")]
	pub id: String,
	pub iccid: String,
	pub eid: String,
	pub status: String,
	#[serde(rename = "createdAt")]
	pub created_at: DateTime<Utc>,
	#[serde(rename = "updatedAt")]
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSubscription {
	pub status: String,
}

/// Hardware family of a tracker.
///
/// Only `shield_gps` has been observed; any other value is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceType {
	ShieldGps,
	Other(String),
}

impl DeviceType {
	pub fn as_str(&self) -> &str {
		match self {
			DeviceType::ShieldGps => "shield_gps",
			DeviceType::Other(other) => other,
		}
	}
}

impl From<String> for DeviceType {
	fn from(value: String) -> Self {
		match &*value {
			"shield_gps" => DeviceType::ShieldGps,
			_ => DeviceType::Other(value),
		}
	}
}

impl From<DeviceType> for String {
	fn from(value: DeviceType) -> Self {
		match value {
			DeviceType::ShieldGps => "shield_gps".into(),
			DeviceType::Other(other) => other,
		}
	}
}

impl fmt::Display for DeviceType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatingMode {
	#[serde(rename = "batteryLife")]
	BatteryLife,
	#[serde(rename = "responsiveness")]
	Responsiveness,
}

impl OperatingMode {
	pub const ALL: [OperatingMode; 2] = [OperatingMode::BatteryLife, OperatingMode::Responsiveness];

	pub const fn as_str(self) -> &'static str {
		match self {
			OperatingMode::BatteryLife => "batteryLife",
			OperatingMode::Responsiveness => "responsiveness",
		}
	}
}

impl fmt::Display for OperatingMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleReport {
	Gps,
	Temp,
	Cell,
}

/// A tracker as listed by `device/getDevices`: its configuration together with
/// the last telemetry the cloud received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundDevice {
	pub accelerometer: AccelerometerConfiguration,
	pub alarm: bool,
	#[serde(rename = "alertLevel")]
	pub alert_level: i32,
	pub color: Option<String>,
	pub deleted: bool,
	#[serde(rename = "deviceType")]
	pub device_type: DeviceType,
	#[serde(rename = "_id")]
	pub id: String,
	#[serde(rename = "lastHistoryTime")]
	pub last_history_time: DateTime<Utc>,
	pub latitude: f64,
	pub longitude: f64,
	#[serde(rename = "markAsLost")]
	pub mark_as_lost: i32,
	pub modem_state: i32,
	pub modem_temperature_f: i32,
	/// Millivolts.
	pub modem_voltage: i32,
	#[serde(rename = "operatingMode")]
	pub operating_mode: OperatingMode,
	#[serde(rename = "scheduleReport")]
	pub schedule_report: Vec<ScheduleReport>,
	/// Seconds.
	#[serde(rename = "scheduleReportInterval")]
	pub schedule_report_interval: u32,
	pub temperature: TemperatureConfiguration,
	pub tone: i32,
	#[serde(rename = "tsaAccessible")]
	pub tsa_accessible: bool,
	#[serde(rename = "waterAlarm")]
	pub water_alarm: WaterAlarmConfiguration,

	#[serde(rename = "locationReportMode")]
	pub location_report_mode: String,
	#[serde(rename = "ledFlash")]
	pub led_flash: bool,
	#[serde(rename = "pushNotification")]
	pub push_notification: bool,
	#[serde(rename = "emailAlerts")]
	pub email_alerts: bool,
	#[serde(rename = "locationUpdateNotification")]
	pub location_update_notification: bool,
	#[serde(rename = "sosAlertNotification")]
	pub sos_alert_notification: bool,

	#[serde(rename = "notificationEmails")]
	pub notification_emails: Vec<String>,
	#[serde(rename = "emergencyMode")]
	pub emergency_mode: bool,
	pub proximity: String,
	#[serde(rename = "deviceUUID")]
	pub device_uuid: String,
	#[serde(rename = "devicePicture")]
	pub device_picture: String,
	pub name: String,
	#[serde(rename = "timeCreated")]
	pub time_created: DateTime<Utc>,
	#[serde(rename = "lastSeenTime")]
	pub last_seen_time: DateTime<Utc>,
	#[serde(rename = "lastReportType")]
	pub last_report_type: UpdateType,
	pub esim: Esim,
	pub imei: String,
	pub iccid: String,
	/// Power save mode active time.
	pub psm_active_time: i64,
	/// Power save mode tracking area update.
	pub psm_tau: i64,
	/// eDRX paging time window.
	pub edrx_ptw: i64,
	pub edrx_value: i64,

	// Not used by the bridge, decoded so that shape changes are noticed.
	#[serde(rename = "isTrialAvailed")]
	pub is_trial_availed: bool,
	pub rai_value: bool,
	#[serde(rename = "listenToLock")]
	pub listen_to_lock: bool,
	#[serde(rename = "subscriptionRemindOn", default)]
	pub subscription_remind_on: Option<DateTime<Utc>>,
	#[serde(rename = "userId")]
	pub user_id: String,
	pub passcode: String,
	#[serde(rename = "markedByUsername")]
	pub marked_by_username: String,
	#[serde(rename = "markedByEmail")]
	pub marked_by_email: String,
	#[serde(rename = "masterKey")]
	pub master_key: String,
	#[serde(rename = "outOfRangeTimeout", default)]
	pub out_of_range_timeout: Option<i64>,
	#[serde(rename = "subscriptionRemindCount", default)]
	pub subscription_remind_count: Option<i64>,
	#[serde(rename = "cellRequestsCount")]
	pub cell_requests_count: i64,
	#[serde(rename = "cellRequestsResetOn")]
	pub cell_requests_reset_on: DateTime<Utc>,
	#[serde(rename = "continuousReportReset", default)]
	pub continuous_report_reset: Option<DateTime<Utc>>,
	pub privilege: i32,
	#[serde(rename = "sharedUserCount")]
	pub shared_user_count: i32,
	pub share_count: i32,
	pub subscription: DeviceSubscription,
	#[serde(rename = "cellScanLimit")]
	pub cell_scan_limit: i64,
}

/// Body of `device/getDevices`, a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FoundDeviceList(pub Vec<FoundDevice>);

impl Deref for FoundDeviceList {
	type Target = [FoundDevice];

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl IntoIterator for FoundDeviceList {
	type Item = FoundDevice;
	type IntoIter = std::vec::IntoIter<FoundDevice>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl<'a> IntoIterator for &'a FoundDeviceList {
	type Item = &'a FoundDevice;
	type IntoIter = std::slice::Iter<'a, FoundDevice>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

/// How a history position was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSource {
	Gps,
	/// Multi-cell triangulation.
	Mcell,
	/// Single-cell estimate.
	Scell,
}

/// A single update from a tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
	#[serde(rename = "_id")]
	pub id: String,
	#[serde(rename = "deviceUUID")]
	pub device_uuid: String,
	#[serde(default)]
	pub modem_voltage: Option<i32>,
	#[serde(default)]
	pub modem_temperature: Option<i32>,
	#[serde(rename = "type")]
	pub kind: PositionSource,
	#[serde(rename = "timeCreated")]
	pub time_created: DateTime<Utc>,
	pub latitude: f64,
	pub longitude: f64,
	/// Meters.
	pub accuracy: f64,
	#[serde(rename = "locationChanged")]
	pub location_changed: bool,
	pub duration: i64,
	#[serde(rename = "alertType")]
	pub alert_type: UpdateType,
	pub address: String,
	#[serde(rename = "lastSeenOn")]
	pub last_seen_on: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
	/// Total number of records.
	pub total: u64,
	#[serde(rename = "totalPages")]
	pub total_pages: u32,
	pub next: u32,
	#[serde(rename = "hasNext")]
	pub has_next: bool,
	pub prev: u32,
	#[serde(rename = "hasPrev")]
	pub has_prev: bool,
	#[serde(rename = "perPage")]
	pub per_page: u32,
	pub current: u32,
}

/// One page of `history/getDeviceHistory`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceHistoryPage {
	pub success: bool,
	pub data: Vec<HistoryEntry>,
	pub pagination: Pagination,
}
