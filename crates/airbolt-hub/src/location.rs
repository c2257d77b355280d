use crate::Tracker;
use airbolt_api::UpdateType;
use serde::Serialize;

/// Name and unique id suffix of the device tracker entity.
pub const METRIC: &str = "location";

pub fn unique_id(tracker: &Tracker) -> String {
	format!("{}_{}", tracker.id(), METRIC)
}

/// JSON attributes of a tracker's device tracker entity. Home Assistant reads
/// the position from `latitude`, `longitude` and `gps_accuracy`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationAttributes<'a> {
	pub latitude: f64,
	pub longitude: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub gps_accuracy: Option<f64>,
	pub address: Option<&'a str>,
	pub last_report_type: UpdateType,
}

impl<'a> LocationAttributes<'a> {
	pub fn new(tracker: &'a Tracker) -> Self {
		let location = tracker.location();
		Self {
			latitude: location.latitude,
			longitude: location.longitude,
			gps_accuracy: location.accuracy,
			address: tracker.address(),
			last_report_type: tracker.last_report_type(),
		}
	}
}
