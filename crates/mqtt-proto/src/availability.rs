use crate::{
	Payload, PayloadInvalidity,
	topic::{Topic, TopicInvalidity},
	validation::ValidateContextExt,
};
use semval::{Validate, ValidationResult, context::Context};
use serde::{Deserialize, Serialize};

/// Controls how multiple availability topics combine into the availability
/// of a single entity.
#[derive(
	Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityMode {
	/// Every topic must report `payload_available`.
	All,

	/// At least one topic must report `payload_available`.
	Any,

	/// The last message received on any of the topics wins.
	#[default]
	Latest,
}

impl AvailabilityMode {
	#[inline]
	pub const fn is_default(&self) -> bool {
		matches!(self, Self::Latest)
	}
}

/// A topic Home Assistant subscribes to in order to learn whether an entity
/// is online.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability<'a> {
	#[serde(borrow)]
	pub topic: Topic<'a>,

	/// Defaults to `online` on the Home Assistant side when absent.
	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub payload_available: Option<Payload<'a>>,

	/// Defaults to `offline` on the Home Assistant side when absent.
	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub payload_not_available: Option<Payload<'a>>,
}

impl<'a> Availability<'a> {
	pub fn new(topic: impl Into<Topic<'a>>) -> Self {
		Self {
			topic: topic.into(),
			payload_available: None,
			payload_not_available: None,
		}
	}

	pub fn with_payloads(
		mut self,
		available: impl Into<Payload<'a>>,
		not_available: impl Into<Payload<'a>>,
	) -> Self {
		self.payload_available = Some(available.into());
		self.payload_not_available = Some(not_available.into());
		self
	}
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AvailabilityInvalidity {
	Topic(TopicInvalidity),
	PayloadAvailable(PayloadInvalidity),
	PayloadNotAvailable(PayloadInvalidity),
}

impl<'a> Validate for Availability<'a> {
	type Invalidity = AvailabilityInvalidity;

	fn validate(&self) -> ValidationResult<Self::Invalidity> {
		Context::new()
			.validate_with(&self.topic, AvailabilityInvalidity::Topic)
			.validate_with_opt(
				&self.payload_available,
				AvailabilityInvalidity::PayloadAvailable,
			)
			.validate_with_opt(
				&self.payload_not_available,
				AvailabilityInvalidity::PayloadNotAvailable,
			)
			.into()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_matches::assert_matches;
	use nameof::{name_of, name_of_type};
	use serde_test::{Token, assert_tokens};

	#[test]
	fn topic_only() {
		assert_tokens(
			&Availability::new("airbolt/default/available"),
			&[
				Token::Struct {
					name: name_of_type!(Availability),
					len: 1,
				},
				Token::Str(name_of!(topic in Availability)),
				Token::Str("airbolt/default/available"),
				Token::StructEnd,
			],
		)
	}

	#[test]
	fn with_payloads() {
		assert_tokens(
			&Availability::new("airbolt/default/available").with_payloads("online", "offline"),
			&[
				Token::Struct {
					name: name_of_type!(Availability),
					len: 3,
				},
				Token::Str(name_of!(topic in Availability)),
				Token::Str("airbolt/default/available"),
				Token::Str(name_of!(payload_available in Availability)),
				Token::Some,
				Token::Str("online"),
				Token::Str(name_of!(payload_not_available in Availability)),
				Token::Some,
				Token::Str("offline"),
				Token::StructEnd,
			],
		)
	}

	#[test]
	fn latest_is_default_mode() {
		assert!(AvailabilityMode::default().is_default());
		assert_eq!(
			serde_json::to_string(&AvailabilityMode::Any).expect("should serialize"),
			r#""any""#
		);
	}

	#[test]
	fn invalid_topic_and_payload() {
		let err: Vec<_> = Availability::new("airbolt/#")
			.with_payloads("", "offline")
			.validate()
			.expect_err("should be invalid")
			.into_iter()
			.collect();

		assert_matches!(
			&*err,
			[
				AvailabilityInvalidity::Topic(TopicInvalidity::IllegalCharacter),
				AvailabilityInvalidity::PayloadAvailable(PayloadInvalidity::Empty),
			]
		);
	}
}
