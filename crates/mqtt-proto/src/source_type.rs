use serde::{Deserialize, Serialize};

/// Where a device tracker gets its location from.
#[derive(
	Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
	#[default]
	Gps,
	Router,
	Bluetooth,
	BluetoothLe,
}
