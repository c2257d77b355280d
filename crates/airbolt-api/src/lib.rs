//! Typed client for the Airbolt GPS tracker cloud API.
//!
//! [schema] holds the response documents; [AirboltClient] performs the calls.

mod client;
pub mod schema;

pub use client::{AirboltClient, ApiError, ApiOptions, Endpoint, Session};
pub use reqwest::StatusCode;
pub use schema::{
	DecodeError, DeviceHistoryPage, DeviceType, FoundDevice, FoundDeviceList, HistoryEntry,
	LoginResult, OperatingMode, UpdateType,
};
