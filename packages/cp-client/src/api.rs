// std
use std::time::Duration;

// crates.io
use reqwest::{
	Client, Method, RequestBuilder, Response, StatusCode,
	header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::Deserialize;

use crate::{Error, Result};

pub const USER_ID_HEADER: &str = "x-clinicpro-user-id";
pub const TIER_HEADER: &str = "x-clinicpro-tier";
pub const MOBILE_TOKEN_HEADER: &str = "x-clinicpro-mobile-token";

#[derive(Debug, Clone)]
pub enum Credentials {
	/// Requests relayed by the auth proxy on behalf of a signed-in practitioner.
	Owner { user_id: String, tier: Option<String>, proxy_token: Option<String> },
	Mobile { token: String },
}
impl Credentials {
	fn headers(&self) -> Result<HeaderMap> {
		let mut headers = HeaderMap::new();

		match self {
			Self::Owner { user_id, tier, proxy_token } => {
				headers.insert(USER_ID_HEADER, HeaderValue::from_str(user_id)?);

				if let Some(tier) = tier {
					headers.insert(TIER_HEADER, HeaderValue::from_str(tier)?);
				}
				if let Some(proxy_token) = proxy_token {
					let bearer = HeaderValue::from_str(&format!("Bearer {proxy_token}"))?;

					headers.insert(AUTHORIZATION, bearer);
				}
			},
			Self::Mobile { token } => {
				headers.insert(MOBILE_TOKEN_HEADER, HeaderValue::from_str(token)?);
			},
		}

		Ok(headers)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
}
impl RetryPolicy {
	/// Delay before retry number `retry` (1-based): doubling from `base_delay`, capped.
	pub fn delay_for(&self, retry: u32) -> Duration {
		let factor = 2_u32.saturating_pow(retry.saturating_sub(1));

		self.base_delay.saturating_mul(factor).min(self.max_delay)
	}
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(250),
			max_delay: Duration::from_secs(4),
		}
	}
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
	http: Client,
	base_url: String,
	credentials: Credentials,
	retry: RetryPolicy,
}
impl ApiClient {
	pub fn new(base_url: &str, credentials: Credentials, timeout: Duration) -> Result<Self> {
		let http = Client::builder().timeout(timeout).build()?;

		Ok(Self {
			http,
			base_url: base_url.trim_end_matches('/').to_string(),
			credentials,
			retry: RetryPolicy::default(),
		})
	}

	pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	pub fn url(&self, path: &str) -> String {
		format!("{}{path}", self.base_url)
	}

	/// Sends an idempotent request, retrying transport failures and 5xx responses.
	///
	/// 4xx responses are returned at once as [`Error::Api`].
	pub async fn fetch_with_retry(
		&self,
		method: Method,
		path: &str,
		query: &[(&str, String)],
	) -> Result<Response> {
		let max_attempts = self.retry.max_attempts.max(1);
		let mut attempt = 1;

		loop {
			let request = self.request(method.clone(), path)?.query(query);
			let retries_left = attempt < max_attempts;

			match request.send().await {
				Ok(response) if response.status().is_success() => return Ok(response),
				Ok(response) if is_retryable_status(response.status()) && retries_left => {
					tracing::warn!(
						status = %response.status(),
						attempt,
						path,
						"Retrying after server error."
					);
				},
				Ok(response) => return Err(api_error(response).await),
				Err(err) if retries_left && !err.is_builder() => {
					tracing::warn!(error = %err, attempt, path, "Retrying after transport error.");
				},
				Err(err) => return Err(err.into()),
			}

			tokio::time::sleep(self.retry.delay_for(attempt)).await;

			attempt += 1;
		}
	}

	fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
		Ok(self.http.request(method, self.url(path)).headers(self.credentials.headers()?))
	}
}

pub fn is_retryable_status(status: StatusCode) -> bool {
	status.is_server_error()
}

async fn api_error(response: Response) -> Error {
	let status = response.status().as_u16();

	match response.json::<ErrorBody>().await {
		Ok(body) => Error::Api { status, error_code: body.error_code, message: body.message },
		Err(_) => Error::Api {
			status,
			error_code: "UNKNOWN".to_string(),
			message: "Response carried no error body.".to_string(),
		},
	}
}
