//! Airbolt trackers as Home Assistant entities: tracker state, the sensors
//! and location derived from it, and the hub that keeps it current.

mod hub;
pub mod location;
pub mod sensor;
mod text;
mod tracker;

pub use hub::{Credentials, Hub, HubError, RefreshReport, TrackerApi};
pub use sensor::{SensorValue, TrackerSensor};
pub use text::title_case;
pub use tracker::{Location, MANUFACTURER, Tracker};
