use crate::Tracker;
use airbolt_api::{AirboltClient, ApiError, FoundDeviceList, HistoryEntry, LoginResult, Session};
use async_trait::async_trait;
use std::{collections::BTreeMap, fmt, mem};
use thiserror::Error;
use tracing::{Level, debug, info, instrument, warn};

/// The calls the hub needs from the cloud API.
#[async_trait]
pub trait TrackerApi: Send + Sync {
	async fn login(&self, username: &str, password: &str) -> Result<LoginResult, ApiError>;

	async fn devices(&self, session: &Session) -> Result<FoundDeviceList, ApiError>;

	async fn latest_history(
		&self,
		session: &Session,
		device_uuid: &str,
	) -> Result<Option<HistoryEntry>, ApiError>;
}

#[async_trait]
impl TrackerApi for AirboltClient {
	async fn login(&self, username: &str, password: &str) -> Result<LoginResult, ApiError> {
		AirboltClient::login(self, username, password).await
	}

	async fn devices(&self, session: &Session) -> Result<FoundDeviceList, ApiError> {
		AirboltClient::devices(self, session).await
	}

	async fn latest_history(
		&self,
		session: &Session,
		device_uuid: &str,
	) -> Result<Option<HistoryEntry>, ApiError> {
		AirboltClient::latest_history(self, session, device_uuid).await
	}
}

#[derive(Clone)]
pub struct Credentials {
	username: String,
	password: String,
}

impl Credentials {
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			username: username.into(),
			password: password.into(),
		}
	}

	pub fn username(&self) -> &str {
		&self.username
	}
}

impl fmt::Debug for Credentials {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Credentials")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

#[derive(Debug, Error)]
pub enum HubError {
	#[error("failed to log in as '{username}'")]
	Login { username: String, source: ApiError },

	#[error("failed to list trackers")]
	Devices { source: ApiError },

	#[error("failed to fetch history of tracker '{device}'")]
	History { device: String, source: ApiError },
}

impl HubError {
	pub fn api_error(&self) -> &ApiError {
		match self {
			HubError::Login { source, .. }
			| HubError::Devices { source }
			| HubError::History { source, .. } => source,
		}
	}

	pub fn is_unauthorized(&self) -> bool {
		self.api_error().is_unauthorized()
	}
}

/// Tracker ids touched by one refresh.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshReport {
	pub added: Vec<String>,
	pub updated: Vec<String>,
	pub removed: Vec<String>,
}

impl RefreshReport {
	pub fn is_empty(&self) -> bool {
		self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
	}
}

/// Owner of the API session and the latest state of every tracker on the account.
pub struct Hub<A> {
	api: A,
	credentials: Credentials,
	session: Option<Session>,
	trackers: BTreeMap<String, Tracker>,
}

impl<A: TrackerApi> Hub<A> {
	pub fn new(api: A, credentials: Credentials) -> Self {
		Self {
			api,
			credentials,
			session: None,
			trackers: BTreeMap::new(),
		}
	}

	/// Display name of the account, once logged in. Falls back to the username.
	pub fn name(&self) -> &str {
		match &self.session {
			Some(session) if !session.user().name.is_empty() => &session.user().name,
			_ => self.credentials.username(),
		}
	}

	pub fn trackers(&self) -> impl ExactSizeIterator<Item = &Tracker> {
		self.trackers.values()
	}

	pub fn tracker(&self, id: &str) -> Option<&Tracker> {
		self.trackers.get(id)
	}

	/// Log in with the configured credentials and return the account name.
	pub async fn verify_credentials(&mut self) -> Result<String, HubError> {
		self.session = None;
		self.session().await?;
		Ok(self.name().to_owned())
	}

	#[instrument(level = Level::DEBUG, skip(self), fields(username = %self.credentials.username))]
	async fn session(&mut self) -> Result<Session, HubError> {
		if let Some(session) = &self.session {
			return Ok(session.clone());
		}

		let result = self
			.api
			.login(&self.credentials.username, &self.credentials.password)
			.await
			.map_err(|source| HubError::Login {
				username: self.credentials.username.clone(),
				source,
			})?;

		let session = Session::from(result);
		info!(account = %session.user().name, "logged in");
		self.session = Some(session.clone());
		Ok(session)
	}

	/// Poll every tracker on the account.
	///
	/// A rejected session is replaced by a new login once before the refresh
	/// gives up.
	#[instrument(level = Level::DEBUG, skip(self))]
	pub async fn refresh(&mut self) -> Result<RefreshReport, HubError> {
		let had_session = self.session.is_some();
		match self.refresh_once().await {
			Err(e) if had_session && e.is_unauthorized() => {
				warn!(error = %e, "session rejected, logging in again");
				self.session = None;
				self.refresh_once().await
			}
			result => result,
		}
	}

	async fn refresh_once(&mut self) -> Result<RefreshReport, HubError> {
		let session = self.session().await?;
		let devices = self
			.api
			.devices(&session)
			.await
			.map_err(|source| HubError::Devices { source })?;

		let mut trackers = BTreeMap::new();
		for device in devices.iter().filter(|d| !d.deleted) {
			let history = match self.api.latest_history(&session, &device.device_uuid).await {
				Ok(history) => history,
				Err(source) if source.is_unauthorized() => {
					return Err(HubError::History {
						device: device.id.clone(),
						source,
					});
				}
				Err(e) => {
					warn!(device = %device.id, error = %e, "failed to fetch history, using device state");
					None
				}
			};

			trackers.insert(device.id.clone(), Tracker::new(device, history.as_ref()));
		}

		let previous = mem::replace(&mut self.trackers, trackers);
		let mut report = RefreshReport::default();
		for id in self.trackers.keys() {
			if previous.contains_key(id) {
				report.updated.push(id.clone());
			} else {
				report.added.push(id.clone());
			}
		}

		report.removed = previous
			.into_keys()
			.filter(|id| !self.trackers.contains_key(id))
			.collect();

		debug!(
			added = report.added.len(),
			updated = report.updated.len(),
			removed = report.removed.len(),
			"refreshed trackers"
		);

		Ok(report)
	}
}
