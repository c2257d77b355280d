//! Typed [Home Assistant MQTT discovery][discovery] documents.
//!
//! [discovery]: https://www.home-assistant.io/integrations/mqtt/#mqtt-discovery

pub(crate) mod string;
pub(crate) mod validation;

pub mod availability;
pub mod device;
pub mod device_class;
pub mod entity;
pub mod entity_category;
pub mod icon;
pub mod qos;
pub mod source_type;
pub mod state_class;
pub mod topic;

#[doc(no_inline)]
pub use availability::{Availability, AvailabilityMode};
#[doc(no_inline)]
pub use device::Device;
#[doc(no_inline)]
pub use device_class::DeviceClass;
#[doc(no_inline)]
pub use entity::{DeviceTracker, Entity, EntityInvalidity, Sensor};
#[doc(no_inline)]
pub use entity_category::EntityCategory;
#[doc(no_inline)]
pub use icon::Icon;
#[doc(no_inline)]
pub use qos::MqttQoS;
#[doc(no_inline)]
pub use source_type::SourceType;
#[doc(no_inline)]
pub use state_class::StateClass;
#[doc(no_inline)]
pub use topic::Topic;

#[doc(inline)]
pub use string::{
	Name, NameInvalidity, Payload, PayloadInvalidity, Template, TemplateInvalidity, UniqueId,
	UniqueIdInvalidity,
};
#[doc(inline)]
pub use validation::{ValidateExt, ValidationError};
