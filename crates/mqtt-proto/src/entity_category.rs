use serde::{Deserialize, Serialize};

/// Classification of a non-primary entity.
#[derive(
	Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
	/// Uncategorized, primary entity. Never written to a document.
	#[default]
	None,

	/// Exposes a configuration parameter that can be changed.
	Config,

	/// Exposes diagnostics of a device without allowing them to be changed,
	/// for example RSSI or the temperature of a modem.
	Diagnostic,
}

impl EntityCategory {
	#[inline]
	pub const fn is_none(&self) -> bool {
		matches!(self, Self::None)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_test::{Token, assert_tokens};

	#[test]
	fn diagnostic_ser_de() {
		assert_tokens(
			&EntityCategory::Diagnostic,
			&[Token::UnitVariant {
				name: "EntityCategory",
				variant: "diagnostic",
			}],
		)
	}
}
