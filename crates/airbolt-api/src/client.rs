use crate::schema::{
	self, DecodeError, DeviceHistoryPage, FoundDeviceList, HistoryEntry, LoginResult, SessionInfo,
	UserInfo,
};
use hass_dyn_error::DynError;
use reqwest::{Method, Request, StatusCode, Url, header};
use serde::{Serialize, de::DeserializeOwned};
use std::{fmt, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{Level, debug, instrument};

const MAX_ERROR_BODY: usize = 256;

/// The API call an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
	Login,
	Devices,
	DeviceHistory,
}

impl Endpoint {
	pub const fn as_str(self) -> &'static str {
		match self {
			Endpoint::Login => "user/login",
			Endpoint::Devices => "device/getDevices",
			Endpoint::DeviceHistory => "history/getDeviceHistory",
		}
	}
}

impl fmt::Display for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Error)]
pub enum ApiError {
	#[error("invalid API base url '{url}'")]
	BaseUrl { url: String, source: Option<DynError> },

	#[error("failed to create HTTP client")]
	Client { source: DynError },

	#[error("request to {endpoint} failed")]
	Request { endpoint: Endpoint, source: DynError },

	#[error("{endpoint} rejected the credentials ({status})")]
	Unauthorized { endpoint: Endpoint, status: StatusCode },

	#[error("{endpoint} returned {status}: {body}")]
	Status {
		endpoint: Endpoint,
		status: StatusCode,
		body: String,
	},

	#[error("unexpected response from {endpoint}")]
	Decode {
		endpoint: Endpoint,
		source: DecodeError,
	},
}

impl ApiError {
	fn request(endpoint: Endpoint, error: reqwest::Error) -> Self {
		ApiError::Request {
			endpoint,
			source: DynError::new(error),
		}
	}

	/// `true` when the session is missing or expired and a new login may help.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, ApiError::Unauthorized { .. })
	}

	pub fn endpoint(&self) -> Option<Endpoint> {
		match self {
			ApiError::BaseUrl { .. } | ApiError::Client { .. } => None,
			ApiError::Request { endpoint, .. }
			| ApiError::Unauthorized { endpoint, .. }
			| ApiError::Status { endpoint, .. }
			| ApiError::Decode { endpoint, .. } => Some(*endpoint),
		}
	}
}

#[derive(Debug, Clone)]
pub struct ApiOptions {
	pub base_url: String,
	pub timeout: Duration,
	pub user_agent: String,
}

impl ApiOptions {
	pub const DEFAULT_BASE_URL: &'static str = "https://api.airbolt.com";
	pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

	pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();
		self
	}

	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();
		self
	}
}

impl Default for ApiOptions {
	fn default() -> Self {
		Self {
			base_url: Self::DEFAULT_BASE_URL.into(),
			timeout: Self::DEFAULT_TIMEOUT,
			user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).into(),
		}
	}
}

/// An authenticated session, kept from a successful login.
#[derive(Clone)]
pub struct Session {
	auth_header: Arc<str>,
	user: Arc<UserInfo>,
	info: Arc<SessionInfo>,
}

impl Session {
	pub fn auth_header(&self) -> &str {
		&self.auth_header
	}

	pub fn user(&self) -> &UserInfo {
		&self.user
	}

	pub fn info(&self) -> &SessionInfo {
		&self.info
	}
}

impl From<LoginResult> for Session {
	fn from(value: LoginResult) -> Self {
		Session {
			auth_header: value.auth_header.into(),
			user: Arc::new(value.user),
			info: Arc::new(value.session),
		}
	}
}

impl fmt::Debug for Session {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Session")
			.field("user", &self.user.username)
			.field("session", &self.info.id)
			.field("auth_header", &"<redacted>")
			.finish()
	}
}

#[derive(Serialize)]
struct Credentials<'a> {
	username: &'a str,
	password: &'a str,
}

/// HTTP client for the Airbolt cloud API.
#[derive(Debug, Clone)]
pub struct AirboltClient {
	http: reqwest::Client,
	base_url: Url,
}

static_assertions::assert_impl_all!(AirboltClient: Send, Sync, Clone);

impl AirboltClient {
	pub fn new(options: ApiOptions) -> Result<Self, ApiError> {
		let mut base_url = Url::parse(&options.base_url).map_err(|e| ApiError::BaseUrl {
			url: options.base_url.clone(),
			source: Some(DynError::new(e)),
		})?;

		if base_url.cannot_be_a_base() {
			return Err(ApiError::BaseUrl {
				url: options.base_url,
				source: None,
			});
		}

		base_url.set_query(None);
		base_url.set_fragment(None);

		let http = reqwest::Client::builder()
			.timeout(options.timeout)
			.user_agent(options.user_agent)
			.build()
			.map_err(|e| ApiError::Client {
				source: DynError::new(e),
			})?;

		Ok(Self { http, base_url })
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	fn url<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Url {
		let mut url = self.base_url.clone();
		if let Ok(mut path) = url.path_segments_mut() {
			path.pop_if_empty().extend(segments);
		}

		url
	}

	fn login_request(&self, username: &str, password: &str) -> Result<Request, ApiError> {
		self
			.http
			.request(Method::POST, self.url(["user", "login"]))
			.json(&Credentials { username, password })
			.build()
			.map_err(|e| ApiError::request(Endpoint::Login, e))
	}

	fn devices_request(&self, session: &Session) -> Result<Request, ApiError> {
		self
			.http
			.request(Method::GET, self.url(["device", "getDevices"]))
			.header(header::AUTHORIZATION, session.auth_header())
			.build()
			.map_err(|e| ApiError::request(Endpoint::Devices, e))
	}

	fn history_request(
		&self,
		session: &Session,
		device_uuid: &str,
		page: u32,
		per_page: u32,
	) -> Result<Request, ApiError> {
		self
			.http
			.request(
				Method::GET,
				self.url(["history", "getDeviceHistory", device_uuid]),
			)
			.header(header::AUTHORIZATION, session.auth_header())
			.query(&[("page", page), ("perPage", per_page)])
			.build()
			.map_err(|e| ApiError::request(Endpoint::DeviceHistory, e))
	}

	async fn execute<T: DeserializeOwned>(
		&self,
		endpoint: Endpoint,
		request: Request,
	) -> Result<T, ApiError> {
		let response = self
			.http
			.execute(request)
			.await
			.map_err(|e| ApiError::request(endpoint, e))?;

		let status = response.status();
		let body = response
			.bytes()
			.await
			.map_err(|e| ApiError::request(endpoint, e))?;

		debug!(%endpoint, %status, len = body.len(), "received response");
		check_status(endpoint, status, &body)?;
		schema::decode(&body).map_err(|source| ApiError::Decode { endpoint, source })
	}

	/// Log in with the account credentials.
	#[instrument(level = Level::DEBUG, skip(self, password), err)]
	pub async fn login(&self, username: &str, password: &str) -> Result<LoginResult, ApiError> {
		let request = self.login_request(username, password)?;
		self.execute(Endpoint::Login, request).await
	}

	/// List every tracker on the account.
	#[instrument(level = Level::DEBUG, skip_all, err)]
	pub async fn devices(&self, session: &Session) -> Result<FoundDeviceList, ApiError> {
		let request = self.devices_request(session)?;
		self.execute(Endpoint::Devices, request).await
	}

	/// Fetch one page of a tracker's history, newest first. Pages start at 1.
	#[instrument(level = Level::DEBUG, skip(self, session), err)]
	pub async fn device_history(
		&self,
		session: &Session,
		device_uuid: &str,
		page: u32,
		per_page: u32,
	) -> Result<DeviceHistoryPage, ApiError> {
		let request = self.history_request(session, device_uuid, page, per_page)?;
		self.execute(Endpoint::DeviceHistory, request).await
	}

	/// The most recent history entry of a tracker, if it ever reported.
	pub async fn latest_history(
		&self,
		session: &Session,
		device_uuid: &str,
	) -> Result<Option<HistoryEntry>, ApiError> {
		let page = self.device_history(session, device_uuid, 1, 1).await?;
		Ok(page.data.into_iter().next())
	}
}

fn check_status(endpoint: Endpoint, status: StatusCode, body: &[u8]) -> Result<(), ApiError> {
	if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
		return Err(ApiError::Unauthorized { endpoint, status });
	}

	if !status.is_success() {
		return Err(ApiError::Status {
			endpoint,
			status,
			body: truncate_body(body),
		});
	}

	Ok(())
}

fn truncate_body(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let text = text.trim();
	match text.char_indices().nth(MAX_ERROR_BODY) {
		Some((end, _)) => format!("{}…", &text[..end]),
		None => text.to_owned(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_matches::assert_matches;
	use tokio::{
		io::{AsyncReadExt, AsyncWriteExt},
		net::TcpListener,
		task::JoinHandle,
	};

	const LOGIN: &[u8] = include_bytes!("../fixtures/login.json");

	fn client(base_url: &str) -> AirboltClient {
		AirboltClient::new(ApiOptions::default().base_url(base_url)).expect("valid options")
	}

	fn session() -> Session {
		schema::decode::<LoginResult>(LOGIN)
			.expect("fixture decodes")
			.into()
	}

	#[test]
	fn login_posts_credentials() {
		let request = client("https://api.airbolt.test")
			.login_request("hiker", "hunter2")
			.unwrap();

		assert_eq!(request.method(), Method::POST);
		assert_eq!(request.url().as_str(), "https://api.airbolt.test/user/login");
		assert!(request.headers().get(header::AUTHORIZATION).is_none());

		let body = request.body().and_then(|b| b.as_bytes()).expect("buffered body");
		let body: serde_json::Value = serde_json::from_slice(body).unwrap();
		assert_eq!(
			body,
			serde_json::json!({ "username": "hiker", "password": "hunter2" })
		);
	}

	#[test]
	fn devices_sends_auth_header() {
		let request = client("https://api.airbolt.test/")
			.devices_request(&session())
			.unwrap();

		assert_eq!(request.method(), Method::GET);
		assert_eq!(
			request.url().as_str(),
			"https://api.airbolt.test/device/getDevices"
		);
		assert_eq!(
			request.headers()[header::AUTHORIZATION],
			"Bearer 6b1f0c5e-session-key"
		);
	}

	#[test]
	fn history_is_paged() {
		let request = client("https://proxy.test/airbolt/v1")
			.history_request(&session(), "a001-uuid-backpack", 3, 25)
			.unwrap();

		assert_eq!(
			request.url().as_str(),
			"https://proxy.test/airbolt/v1/history/getDeviceHistory/a001-uuid-backpack?page=3&perPage=25"
		);
	}

	#[test]
	fn path_segments_are_escaped() {
		let request = client("https://api.airbolt.test")
			.history_request(&session(), "a/b c", 1, 1)
			.unwrap();

		assert_eq!(
			request.url().path(),
			"/history/getDeviceHistory/a%2Fb%20c"
		);
	}

	#[test]
	fn rejects_invalid_base_url() {
		let err = AirboltClient::new(ApiOptions::default().base_url("not a url"))
			.expect_err("should fail");
		assert_matches!(err, ApiError::BaseUrl { .. });

		let err = AirboltClient::new(ApiOptions::default().base_url("mailto:support@airbolt.com"))
			.expect_err("should fail");
		assert_matches!(err, ApiError::BaseUrl { source: None, .. });
	}

	#[test]
	fn unauthorized_statuses() {
		for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
			let err = check_status(Endpoint::Devices, status, b"").expect_err("should fail");
			assert!(err.is_unauthorized());
			assert_eq!(err.endpoint(), Some(Endpoint::Devices));
		}
	}

	#[test]
	fn other_statuses_keep_truncated_body() {
		let body = "x".repeat(1000);
		let err = check_status(
			Endpoint::DeviceHistory,
			StatusCode::INTERNAL_SERVER_ERROR,
			body.as_bytes(),
		)
		.expect_err("should fail");

		assert!(!err.is_unauthorized());
		assert_matches!(err, ApiError::Status { status, body, .. } => {
			assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
			assert_eq!(body.chars().count(), MAX_ERROR_BODY + 1);
			assert!(body.ends_with('…'));
		});
	}

	#[test]
	fn success_passes() {
		assert_matches!(check_status(Endpoint::Login, StatusCode::OK, b"{}"), Ok(()));
	}

	#[test]
	fn session_debug_hides_auth_header() {
		let session = session();
		let debug = format!("{session:?}");

		assert!(debug.contains("hiker"));
		assert!(!debug.contains("6b1f0c5e"));
		assert_eq!(session.auth_header(), "Bearer 6b1f0c5e-session-key");
		assert_eq!(session.user().email, "hiker@example.com");
	}

	/// Answer a single HTTP request with `status` and `body`. Resolves to the
	/// request line that was received.
	async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
		let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
		let addr = listener.local_addr().expect("local addr");

		let server = tokio::spawn(async move {
			let (mut stream, _) = listener.accept().await.expect("accept");
			let mut request = Vec::new();
			let mut buf = [0u8; 1024];
			loop {
				let n = stream.read(&mut buf).await.expect("read");
				request.extend_from_slice(&buf[..n]);
				if n == 0 || request_complete(&request) {
					break;
				}
			}

			let response = format!(
				"HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
				body.len()
			);
			stream.write_all(response.as_bytes()).await.expect("write");
			stream.shutdown().await.ok();

			let request = String::from_utf8_lossy(&request);
			request.lines().next().unwrap_or_default().to_owned()
		});

		(format!("http://{addr}"), server)
	}

	fn request_complete(request: &[u8]) -> bool {
		let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
			return false;
		};
		let head = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
		let length = head
			.lines()
			.find_map(|line| line.strip_prefix("content-length:"))
			.and_then(|v| v.trim().parse::<usize>().ok())
			.unwrap_or(0);
		request.len() >= end + 4 + length
	}

	#[tokio::test]
	async fn rejected_login_is_unauthorized() {
		let (base_url, server) = serve_once("401 Unauthorized", r#"{"success":false}"#).await;

		let err = client(&base_url)
			.login("hiker", "wrong")
			.await
			.expect_err("should fail");

		assert!(err.is_unauthorized());
		assert_matches!(err, ApiError::Unauthorized { endpoint: Endpoint::Login, status } => {
			assert_eq!(status, StatusCode::UNAUTHORIZED);
		});
		assert_eq!(server.await.unwrap(), "POST /user/login HTTP/1.1");
	}

	#[tokio::test]
	async fn malformed_device_list_names_endpoint() {
		let (base_url, server) = serve_once("200 OK", r#"{"success":true,"data":"#).await;

		let err = client(&base_url)
			.devices(&session())
			.await
			.expect_err("should fail");

		assert_eq!(err.endpoint(), Some(Endpoint::Devices));
		assert_matches!(err, ApiError::Decode { endpoint: Endpoint::Devices, source } => {
			assert_eq!(source.document(), "FoundDeviceList");
		});
		assert_eq!(server.await.unwrap(), "GET /device/getDevices HTTP/1.1");
	}

	#[tokio::test]
	async fn empty_history_has_no_latest_entry() {
		let (base_url, server) = serve_once(
			"200 OK",
			r#"{"success":true,"data":[],"pagination":{"total":0,"totalPages":0,"next":0,"hasNext":false,"prev":0,"hasPrev":false,"perPage":1,"current":1}}"#,
		)
		.await;

		let latest = client(&base_url)
			.latest_history(&session(), "a001-uuid-backpack")
			.await
			.expect("should succeed");

		assert!(latest.is_none());
		assert_eq!(
			server.await.unwrap(),
			"GET /history/getDeviceHistory/a001-uuid-backpack?page=1&perPage=1 HTTP/1.1"
		);
	}
}
