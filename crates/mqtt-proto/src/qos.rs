use serde_repr::{Deserialize_repr, Serialize_repr};

/// The QoS level a discovery document asks Home Assistant to use when
/// subscribing to (or publishing on) the entity topics.
#[derive(
	Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize_repr, Deserialize_repr,
)]
#[repr(u8)]
pub enum MqttQoS {
	#[default]
	AtMostOnce = 0,
	AtLeastOnce = 1,
	ExactlyOnce = 2,
}

impl MqttQoS {
	#[inline]
	pub const fn is_default(&self) -> bool {
		matches!(self, MqttQoS::AtMostOnce)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_test::{Token, assert_tokens};

	#[test]
	fn serde_as_number() {
		assert_tokens(&MqttQoS::AtMostOnce, &[Token::U8(0)]);
		assert_tokens(&MqttQoS::ExactlyOnce, &[Token::U8(2)]);
	}

	#[test]
	fn rejects_unknown_level() {
		assert!(serde_json::from_str::<MqttQoS>("3").is_err());
	}
}
