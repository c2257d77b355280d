use crate::string::typed_str;
use semval::{Validate, ValidationResult, context::Context};
use std::{borrow::Cow, sync::Arc};

typed_str!(
	/// MQTT Topic name.
	pub Topic
);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TopicInvalidity {
	Empty,
	IllegalCharacter,
}

impl<'a> Validate for Topic<'a> {
	type Invalidity = TopicInvalidity;

	fn validate(&self) -> ValidationResult<Self::Invalidity> {
		Context::new()
			.invalidate_if(self.is_empty(), TopicInvalidity::Empty)
			.invalidate_if(
				self.contains(|c| matches!(c, '#' | '+' | '\0')),
				TopicInvalidity::IllegalCharacter,
			)
			.into()
	}
}
