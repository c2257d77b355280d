//! Layered bridge configuration.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`AIRBOLT_BRIDGE_*`, `__` separates sections)
//! 2. The file passed with `--config`
//! 3. `<config_dir>/airbolt-bridge/config.toml`
//! 4. Built-in defaults
//!
//! `AIRBOLT_BRIDGE_MQTT__HOST` maps to `mqtt.host`, `AIRBOLT_BRIDGE_AIRBOLT__PASSWORD`
//! to `airbolt.password`.

use airbolt_api::ApiOptions;
use airbolt_hub::Credentials;
use figment::{
	Figment,
	providers::{Env, Format, Serialized, Toml},
};
use hass_mqtt_client::HassMqttOptions;
use serde::{Deserialize, Serialize};
use std::{
	fmt,
	path::{Path, PathBuf},
	time::Duration,
};
use thiserror::Error;

pub const APPLICATION_NAME: &str = "airbolt-bridge";
const ENV_PREFIX: &str = "AIRBOLT_BRIDGE_";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("configuration error: {0}")]
	Figment(#[from] figment::Error),

	#[error("configuration file '{}' does not exist", path.display())]
	MissingFile { path: PathBuf },

	#[error("'{field}' must be set")]
	Missing { field: &'static str },

	#[error("invalid value for '{field}': {reason}")]
	InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BridgeConfig {
	#[serde(default)]
	pub airbolt: AirboltConfig,
	#[serde(default)]
	pub mqtt: MqttConfig,
	#[serde(default)]
	pub log: LogConfig,
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AirboltConfig {
	pub username: String,
	pub password: String,
	pub base_url: String,
	pub poll_interval_secs: u64,
	pub request_timeout_secs: u64,
}

impl Default for AirboltConfig {
	fn default() -> Self {
		Self {
			username: String::new(),
			password: String::new(),
			base_url: ApiOptions::DEFAULT_BASE_URL.into(),
			poll_interval_secs: 300,
			request_timeout_secs: ApiOptions::DEFAULT_TIMEOUT.as_secs(),
		}
	}
}

impl fmt::Debug for AirboltConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AirboltConfig")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.field("base_url", &self.base_url)
			.field("poll_interval_secs", &self.poll_interval_secs)
			.field("request_timeout_secs", &self.request_timeout_secs)
			.finish()
	}
}

impl AirboltConfig {
	pub fn credentials(&self) -> Credentials {
		Credentials::new(&self.username, &self.password)
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_secs(self.poll_interval_secs)
	}

	pub fn api_options(&self) -> ApiOptions {
		ApiOptions::default()
			.base_url(&self.base_url)
			.timeout(Duration::from_secs(self.request_timeout_secs))
	}
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MqttConfig {
	pub host: String,
	/// Defaults to 1883, or 8883 with TLS.
	pub port: Option<u16>,
	pub tls: bool,
	pub username: Option<String>,
	pub password: Option<String>,
	pub discovery_prefix: String,
	/// Prefix of the bridge's own topics. Defaults to the application name.
	pub private_prefix: Option<String>,
	pub node_id: String,
	pub persistence_dir: Option<PathBuf>,
}

impl Default for MqttConfig {
	fn default() -> Self {
		Self {
			host: "localhost".into(),
			port: None,
			tls: false,
			username: None,
			password: None,
			discovery_prefix: HassMqttOptions::DEFAULT_DISCOVERY_PREFIX.into(),
			private_prefix: None,
			node_id: HassMqttOptions::DEFAULT_NODE_ID.into(),
			persistence_dir: None,
		}
	}
}

impl fmt::Debug for MqttConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MqttConfig")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("tls", &self.tls)
			.field("username", &self.username)
			.field("password", &self.password.as_ref().map(|_| "<redacted>"))
			.field("discovery_prefix", &self.discovery_prefix)
			.field("private_prefix", &self.private_prefix)
			.field("node_id", &self.node_id)
			.field("persistence_dir", &self.persistence_dir)
			.finish()
	}
}

impl MqttConfig {
	pub fn options(&self) -> HassMqttOptions {
		let options = match self.tls {
			true => HassMqttOptions::new_tls(&self.host, APPLICATION_NAME),
			false => HassMqttOptions::new(&self.host, APPLICATION_NAME),
		};
		let mut options = options
			.discovery_prefix(&self.discovery_prefix)
			.node_id(&self.node_id);

		if let Some(port) = self.port {
			options = options.port(port);
		}

		if let Some(username) = &self.username {
			options = options.auth(username, self.password.as_deref().unwrap_or_default());
		}

		if let Some(prefix) = &self.private_prefix {
			options = options.private_prefix(prefix);
		}

		if let Some(dir) = &self.persistence_dir {
			options = options.persistence_dir(dir);
		}

		options
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
	/// `tracing` filter directives. `RUST_LOG` takes precedence.
	pub filter: String,
}

impl Default for LogConfig {
	fn default() -> Self {
		Self {
			filter: "info".into(),
		}
	}
}

impl BridgeConfig {
	/// Load and validate the configuration.
	pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		if let Some(path) = path.filter(|p| !p.exists()) {
			return Err(ConfigError::MissingFile {
				path: path.to_owned(),
			});
		}

		let config: Self = Self::figment(path).extract()?;
		config.validate()?;
		Ok(config)
	}

	pub fn figment(path: Option<&Path>) -> Figment {
		let mut figment = Figment::from(Serialized::defaults(Self::default()));

		if let Some(global_path) = Self::global_config_path().filter(|p| p.exists()) {
			figment = figment.merge(Toml::file(global_path));
		}

		if let Some(path) = path {
			figment = figment.merge(Toml::file(path));
		}

		figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
	}

	fn global_config_path() -> Option<PathBuf> {
		dirs::config_dir().map(|p| p.join(APPLICATION_NAME).join("config.toml"))
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.airbolt.username.trim().is_empty() {
			return Err(ConfigError::Missing {
				field: "airbolt.username",
			});
		}

		if self.airbolt.password.is_empty() {
			return Err(ConfigError::Missing {
				field: "airbolt.password",
			});
		}

		if self.airbolt.poll_interval_secs == 0 {
			return Err(ConfigError::InvalidValue {
				field: "airbolt.poll_interval_secs",
				reason: "must be at least one second".into(),
			});
		}

		if self.mqtt.host.trim().is_empty() {
			return Err(ConfigError::Missing { field: "mqtt.host" });
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use figment::Jail;

	fn isolate(jail: &mut Jail) {
		let dir = jail.directory().join("xdg");
		jail.set_env("XDG_CONFIG_HOME", dir.display());
	}

	#[test]
	fn defaults_need_credentials() {
		Jail::expect_with(|jail| {
			isolate(jail);

			let err = BridgeConfig::load(None).expect_err("credentials are required");
			assert!(matches!(
				err,
				ConfigError::Missing {
					field: "airbolt.username"
				}
			));
			Ok(())
		});
	}

	#[test]
	fn file_values_are_loaded() {
		Jail::expect_with(|jail| {
			isolate(jail);
			jail.create_file(
				"bridge.toml",
				r#"
				[airbolt]
				username = "hiker"
				password = "hunter2"
				poll_interval_secs = 120

				[mqtt]
				host = "broker.lan"
				port = 1884
				username = "bridge"
				password = "secret"
				private_prefix = "airbolt"

				[log]
				filter = "airbolt_hub=debug"
				"#,
			)?;

			let config = BridgeConfig::load(Some(Path::new("bridge.toml"))).expect("config loads");
			assert_eq!(config.airbolt.username, "hiker");
			assert_eq!(config.airbolt.poll_interval(), Duration::from_secs(120));
			assert_eq!(config.airbolt.base_url, ApiOptions::DEFAULT_BASE_URL);
			assert_eq!(config.mqtt.host, "broker.lan");
			assert_eq!(config.mqtt.port, Some(1884));
			assert_eq!(config.mqtt.discovery_prefix, "homeassistant");
			assert_eq!(config.mqtt.private_prefix.as_deref(), Some("airbolt"));
			assert_eq!(config.log.filter, "airbolt_hub=debug");
			Ok(())
		});
	}

	#[test]
	fn env_overrides_file() {
		Jail::expect_with(|jail| {
			isolate(jail);
			jail.create_file(
				"bridge.toml",
				r#"
				[airbolt]
				username = "hiker"
				password = "hunter2"

				[mqtt]
				host = "broker.lan"
				"#,
			)?;
			jail.set_env("AIRBOLT_BRIDGE_MQTT__HOST", "mqtt.example.com");
			jail.set_env("AIRBOLT_BRIDGE_MQTT__TLS", "true");
			jail.set_env("AIRBOLT_BRIDGE_AIRBOLT__PASSWORD", "from-env");

			let config = BridgeConfig::load(Some(Path::new("bridge.toml"))).expect("config loads");
			assert_eq!(config.mqtt.host, "mqtt.example.com");
			assert!(config.mqtt.tls);
			assert_eq!(config.airbolt.password, "from-env");
			assert_eq!(config.airbolt.username, "hiker");
			Ok(())
		});
	}

	#[test]
	fn user_config_dir_is_read() {
		Jail::expect_with(|jail| {
			isolate(jail);
			std::fs::create_dir_all(jail.directory().join("xdg/airbolt-bridge")).expect("config dir");
			jail.create_file(
				"xdg/airbolt-bridge/config.toml",
				r#"
				[airbolt]
				username = "global"
				password = "hunter2"
				"#,
			)?;
			jail.create_file(
				"bridge.toml",
				r#"
				[airbolt]
				username = "local"
				"#,
			)?;

			let config = BridgeConfig::figment(None)
				.extract::<BridgeConfig>()
				.expect("config loads");
			assert_eq!(config.airbolt.username, "global");

			let config = BridgeConfig::load(Some(Path::new("bridge.toml"))).expect("config loads");
			assert_eq!(config.airbolt.username, "local");
			assert_eq!(config.airbolt.password, "hunter2");
			Ok(())
		});
	}

	#[test]
	fn missing_config_file_is_an_error() {
		Jail::expect_with(|jail| {
			isolate(jail);

			let err = BridgeConfig::load(Some(Path::new("nope.toml"))).expect_err("should fail");
			assert!(matches!(err, ConfigError::MissingFile { .. }));
			Ok(())
		});
	}

	#[test]
	fn zero_poll_interval_is_rejected() {
		Jail::expect_with(|jail| {
			isolate(jail);
			jail.set_env("AIRBOLT_BRIDGE_AIRBOLT__USERNAME", "hiker");
			jail.set_env("AIRBOLT_BRIDGE_AIRBOLT__PASSWORD", "hunter2");
			jail.set_env("AIRBOLT_BRIDGE_AIRBOLT__POLL_INTERVAL_SECS", "0");

			let err = BridgeConfig::load(None).expect_err("should fail");
			assert!(matches!(err, ConfigError::InvalidValue { .. }));
			Ok(())
		});
	}

	#[test]
	fn debug_hides_passwords() {
		let config = BridgeConfig {
			airbolt: AirboltConfig {
				password: "hunter2".into(),
				..Default::default()
			},
			mqtt: MqttConfig {
				password: Some("secret".into()),
				..Default::default()
			},
			..Default::default()
		};

		let debug = format!("{config:?}");
		assert!(!debug.contains("hunter2"));
		assert!(!debug.contains("secret"));
	}

	#[test]
	fn tls_defaults_to_secure_port() {
		let tls = MqttConfig {
			tls: true,
			..Default::default()
		};
		let debug = format!("{:?}", tls.options());
		assert!(debug.contains("port: 8883"), "{debug}");
		assert!(debug.contains("tls: true"), "{debug}");

		let explicit = MqttConfig {
			tls: true,
			port: Some(8884),
			..Default::default()
		};
		assert!(format!("{:?}", explicit.options()).contains("port: 8884"));

		let plain = format!("{:?}", MqttConfig::default().options());
		assert!(plain.contains("port: 1883"), "{plain}");
	}
}
