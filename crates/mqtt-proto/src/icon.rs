use crate::string::typed_str;
use semval::{Validate, ValidationResult, context::Context};
use std::{borrow::Cow, sync::Arc};

typed_str!(
	/// [Home-Assistant icon][icon], written as `prefix:name` (for instance `mdi:map-marker`).
	///
	/// [icon]: https://www.home-assistant.io/docs/configuration/customizing-devices/#icon
	pub Icon
);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IconInvalidity {
	Empty,
	MissingPrefix,
}

impl<'a> Validate for Icon<'a> {
	type Invalidity = IconInvalidity;

	fn validate(&self) -> ValidationResult<Self::Invalidity> {
		let missing_prefix = match self.split_once(':') {
			Some((prefix, name)) => prefix.is_empty() || name.is_empty(),
			None => true,
		};

		Context::new()
			.invalidate_if(self.is_empty(), IconInvalidity::Empty)
			.invalidate_if(
				!self.is_empty() && missing_prefix,
				IconInvalidity::MissingPrefix,
			)
			.into()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mdi_icon_is_valid() {
		assert!(Icon::from("mdi:battery").validate().is_ok());
	}

	#[test]
	fn icon_without_prefix_is_invalid() {
		let err: Vec<_> = Icon::from("battery")
			.validate()
			.expect_err("should be invalid")
			.into_iter()
			.collect();

		assert_eq!(&*err, &[IconInvalidity::MissingPrefix])
	}

	#[test]
	fn empty_icon_reports_only_empty() {
		let err: Vec<_> = Icon::from("")
			.validate()
			.expect_err("should be invalid")
			.into_iter()
			.collect();

		assert_eq!(&*err, &[IconInvalidity::Empty])
	}
}
