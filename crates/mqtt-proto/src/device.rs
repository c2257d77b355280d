use crate::{
	Name, NameInvalidity,
	validation::ValidateContextExt,
};
use semval::{Validate, ValidationResult, context::Context};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Information about the device an entity is a part of, used to tie it into
/// the Home Assistant device registry.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device<'a> {
	/// A list of IDs that uniquely identify the device. For example a serial number.
	#[serde(borrow, default, skip_serializing_if = "<[Cow<str>]>::is_empty")]
	pub identifiers: Cow<'a, [Cow<'a, str>]>,

	/// The manufacturer of the device.
	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub manufacturer: Option<Cow<'a, str>>,

	/// The model of the device.
	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub model: Option<Cow<'a, str>>,

	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub name: Option<Name<'a>>,

	/// The serial number of the device.
	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub serial_number: Option<Cow<'a, str>>,

	/// Suggest an area if the device isn’t in one yet.
	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub suggested_area: Option<Cow<'a, str>>,

	/// The firmware version of the device.
	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub sw_version: Option<Cow<'a, str>>,

	/// The hardware version of the device.
	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub hw_version: Option<Cow<'a, str>>,

	/// Identifier of a device that routes messages between this device and Home Assistant.
	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub via_device: Option<Cow<'a, str>>,

	/// A link to the webpage that can manage the configuration of this device.
	#[serde(borrow, default, skip_serializing_if = "Option::is_none")]
	pub configuration_url: Option<Cow<'a, str>>,
}

impl<'a> Device<'a> {
	pub fn new(identifier: impl Into<Cow<'a, str>>) -> Self {
		Self {
			identifiers: Cow::Owned(vec![identifier.into()]),
			..Default::default()
		}
	}

	pub fn manufacturer(mut self, manufacturer: impl Into<Cow<'a, str>>) -> Self {
		self.manufacturer = Some(manufacturer.into());
		self
	}

	pub fn model(mut self, model: impl Into<Cow<'a, str>>) -> Self {
		self.model = Some(model.into());
		self
	}

	pub fn name(mut self, name: impl Into<Name<'a>>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn serial_number(mut self, serial_number: impl Into<Cow<'a, str>>) -> Self {
		self.serial_number = Some(serial_number.into());
		self
	}

	pub fn sw_version(mut self, sw_version: impl Into<Cow<'a, str>>) -> Self {
		self.sw_version = Some(sw_version.into());
		self
	}

	pub fn hw_version(mut self, hw_version: impl Into<Cow<'a, str>>) -> Self {
		self.hw_version = Some(hw_version.into());
		self
	}

	pub fn configuration_url(mut self, url: impl Into<Cow<'a, str>>) -> Self {
		self.configuration_url = Some(url.into());
		self
	}

	pub fn is_empty(&self) -> bool {
		self.identifiers.is_empty()
			&& self.manufacturer.is_none()
			&& self.model.is_none()
			&& self.name.is_none()
			&& self.serial_number.is_none()
			&& self.suggested_area.is_none()
			&& self.sw_version.is_none()
			&& self.hw_version.is_none()
			&& self.via_device.is_none()
			&& self.configuration_url.is_none()
	}
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DeviceInvalidity {
	MissingIdentifiers,
	EmptyIdentifier(usize),
	Name(NameInvalidity),
}

impl<'a> Validate for Device<'a> {
	type Invalidity = DeviceInvalidity;

	fn validate(&self) -> ValidationResult<Self::Invalidity> {
		let empty_identifier = self.identifiers.iter().position(|id| id.is_empty());

		Context::new()
			.invalidate_if(
				self.identifiers.is_empty(),
				DeviceInvalidity::MissingIdentifiers,
			)
			.invalidate_if(
				empty_identifier.is_some(),
				DeviceInvalidity::EmptyIdentifier(empty_identifier.unwrap_or_default()),
			)
			.validate_with_opt(&self.name, DeviceInvalidity::Name)
			.into()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use nameof::{name_of, name_of_type};
	use serde_test::{Token, assert_ser_tokens};

	#[test]
	fn empty_device_serializes_to_empty_struct() {
		assert_ser_tokens(
			&Device::default(),
			&[
				Token::Struct {
					name: name_of_type!(Device),
					len: 0,
				},
				Token::StructEnd,
			],
		)
	}

	#[test]
	fn tracker_device_serde() {
		assert_ser_tokens(
			&Device::new("63f1c0ffee")
				.manufacturer("Airbolt")
				.model("Shield Gps")
				.name("Backpack")
				.serial_number("861234567890123"),
			&[
				Token::Struct {
					name: name_of_type!(Device),
					len: 5,
				},
				Token::Str(name_of!(identifiers in Device)),
				Token::Seq { len: Some(1) },
				Token::Str("63f1c0ffee"),
				Token::SeqEnd,
				Token::Str(name_of!(manufacturer in Device)),
				Token::Some,
				Token::Str("Airbolt"),
				Token::Str(name_of!(model in Device)),
				Token::Some,
				Token::Str("Shield Gps"),
				Token::Str(name_of!(name in Device)),
				Token::Some,
				Token::Str("Backpack"),
				Token::Str(name_of!(serial_number in Device)),
				Token::Some,
				Token::Str("861234567890123"),
				Token::StructEnd,
			],
		)
	}

	#[test]
	fn device_round_trips_through_json() {
		let json = r#"{"identifiers":["a","b"],"manufacturer":"Airbolt","hw_version":"shield_gps"}"#;
		let device: Device = serde_json::from_str(json).expect("should parse");
		assert_eq!(&*device.identifiers, &[Cow::Borrowed("a"), Cow::Borrowed("b")]);
		assert_eq!(device.hw_version.as_deref(), Some("shield_gps"));
		assert_eq!(serde_json::to_string(&device).expect("should serialize"), json);
	}

	#[test]
	fn device_without_identifiers_is_invalid() {
		let err: Vec<_> = Device::default()
			.name("Backpack")
			.validate()
			.expect_err("should be invalid")
			.into_iter()
			.collect();

		assert_eq!(&*err, &[DeviceInvalidity::MissingIdentifiers]);
	}

	#[test]
	fn empty_identifier_is_invalid() {
		let device = Device {
			identifiers: Cow::Owned(vec![Cow::Borrowed("a"), Cow::Borrowed("")]),
			..Default::default()
		};
		let err: Vec<_> = device
			.validate()
			.expect_err("should be invalid")
			.into_iter()
			.collect();

		assert_eq!(&*err, &[DeviceInvalidity::EmptyIdentifier(1)]);
	}
}
