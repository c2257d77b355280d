use semval::{Validate, ValidationResult, context::Context};
use std::{borrow::Cow, sync::Arc};

macro_rules! typed_str {
	($(#[$meta:meta])* $vis:vis $name:ident) => {
		$(#[$meta])*
		#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord, ::serde::Serialize, ::serde::Deserialize)]
		#[serde(transparent)]
		$vis struct $name<'a>(#[serde(borrow)] pub(crate) Cow<'a, str>);

		impl<'a> $name<'a> {
			#[inline]
			pub fn as_str(&self) -> &str {
				&self.0
			}

			#[inline]
			pub const fn is_borrowed(&self) -> bool {
				matches!(self.0, Cow::Borrowed(_))
			}

			pub fn into_owned(self) -> $name<'static> {
				$name(Cow::Owned(self.0.into_owned()))
			}
		}

		impl<'a> From<&'a str> for $name<'a> {
			#[inline]
			fn from(value: &'a str) -> Self {
				Self(Cow::Borrowed(value))
			}
		}

		impl<'a> From<&'a String> for $name<'a> {
			#[inline]
			fn from(value: &'a String) -> Self {
				Self(Cow::Borrowed(value.as_str()))
			}
		}

		impl From<String> for $name<'_> {
			#[inline]
			fn from(value: String) -> Self {
				Self(Cow::Owned(value))
			}
		}

		impl<'a> From<&'a Arc<str>> for $name<'a> {
			#[inline]
			fn from(value: &'a Arc<str>) -> Self {
				Self(Cow::Borrowed(&**value))
			}
		}

		impl<'a> From<Cow<'a, str>> for $name<'a> {
			#[inline]
			fn from(value: Cow<'a, str>) -> Self {
				Self(value)
			}
		}

		impl<'a> ::core::fmt::Debug for $name<'a> {
			#[inline]
			fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
				::core::fmt::Debug::fmt(&*self.0, f)
			}
		}

		impl<'a> ::core::fmt::Display for $name<'a> {
			#[inline]
			fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
				::core::fmt::Display::fmt(&*self.0, f)
			}
		}

		impl<'a> AsRef<str> for $name<'a> {
			#[inline]
			fn as_ref(&self) -> &str {
				&self.0
			}
		}

		impl<'a> ::core::ops::Deref for $name<'a> {
			type Target = str;

			#[inline]
			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
	};
}

/// A typed string whose only rule is that it must not be empty.
macro_rules! non_empty_str {
	($(#[$meta:meta])* $vis:vis $name:ident, $invalidity:ident) => {
		typed_str!($(#[$meta])* $vis $name);

		#[derive(Copy, Clone, Debug, Eq, PartialEq)]
		$vis enum $invalidity {
			Empty,
		}

		impl<'a> Validate for $name<'a> {
			type Invalidity = $invalidity;

			fn validate(&self) -> ValidationResult<Self::Invalidity> {
				Context::new()
					.invalidate_if(self.is_empty(), $invalidity::Empty)
					.into()
			}
		}
	};
}

pub(crate) use typed_str;

non_empty_str!(
	/// A device/entity name.
	pub Name,
	NameInvalidity
);

non_empty_str!(
	/// Message payload.
	pub Payload,
	PayloadInvalidity
);

non_empty_str!(
	/// [Home-Assistant template][template].
	///
	/// [template]: https://www.home-assistant.io/docs/configuration/templating/
	pub Template,
	TemplateInvalidity
);

non_empty_str!(
	/// An ID that uniquely identifies an entity. If two entities have the same unique ID,
	/// Home Assistant will raise an exception.
	pub UniqueId,
	UniqueIdInvalidity
);

#[cfg(test)]
mod tests {
	use super::*;
	use assert_matches::assert_matches;
	use serde_test::{Token, assert_tokens};

	#[test]
	fn name_ser_de() {
		assert_tokens(&Name::from("Battery Percent"), &[Token::Str("Battery Percent")])
	}

	#[test]
	fn unique_id_borrows_from_json() {
		let json = r#""abc_battery_percent""#;
		let id: UniqueId = serde_json::from_str(json).expect("should parse");
		assert!(id.is_borrowed());
		assert_eq!(id.as_str(), "abc_battery_percent");
	}

	#[test]
	fn escaped_json_is_owned() {
		let json = r#""\u0041bc""#;
		let id: UniqueId = serde_json::from_str(json).expect("should parse");
		assert_matches!(id.0, Cow::Owned(_));
		assert_eq!(id.as_str(), "Abc");
	}

	#[test]
	fn into_owned_keeps_value() {
		let value = String::from("{{ value_json.modem_voltage }}");
		let template = Template::from(&value).into_owned();
		drop(value);
		assert_eq!(&*template, "{{ value_json.modem_voltage }}");
	}

	#[test]
	fn empty_unique_id_is_invalid() {
		let err: Vec<_> = UniqueId::from("")
			.validate()
			.expect_err("should be invalid")
			.into_iter()
			.collect();

		assert_eq!(&*err, &[UniqueIdInvalidity::Empty])
	}

	#[test]
	fn empty_template_is_invalid() {
		let err: Vec<_> = Template::from("")
			.validate()
			.expect_err("should be invalid")
			.into_iter()
			.collect();

		assert_eq!(&*err, &[TemplateInvalidity::Empty])
	}

	#[test]
	fn non_empty_payload_is_valid() {
		assert!(Payload::from("online").validate().is_ok());
	}
}
