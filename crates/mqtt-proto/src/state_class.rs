use serde::{Deserialize, Serialize};

/// How Home Assistant should build long-term statistics for a sensor.
#[derive(
	Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
	/// No statistics. Never written to a document.
	#[default]
	None,

	/// The state is a measurement in present time, like a temperature or a
	/// voltage reading.
	Measurement,

	/// The state is a total amount that can both increase and decrease.
	Total,

	/// A monotonically increasing total.
	TotalIncreasing,
}

impl StateClass {
	#[inline]
	pub const fn is_none(&self) -> bool {
		matches!(self, Self::None)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn snake_case_names() {
		assert_eq!(
			serde_json::to_string(&StateClass::TotalIncreasing).expect("should serialize"),
			r#""total_increasing""#
		);
		assert_eq!(
			serde_json::from_str::<StateClass>(r#""measurement""#).expect("should parse"),
			StateClass::Measurement
		);
	}
}
