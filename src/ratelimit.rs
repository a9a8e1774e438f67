use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use governor::{
	clock::QuantaInstant,
	middleware::{RateLimitingMiddleware, StateInformationMiddleware},
};
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::{KeyExtractor, PeerIpKeyExtractor},
	GovernorError, GovernorLayer,
};

use crate::error::{self, ErrorShape};

pub type Config = Arc<GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>>;

#[derive(Debug, thiserror::Error)]
#[error("rate limiter rejected request: {0}")]
pub struct Error(GovernorError);

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match &self.0 {
			GovernorError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
			GovernorError::UnableToExtractKey => StatusCode::INTERNAL_SERVER_ERROR,
			GovernorError::Other { code, .. } => *code,
		}
	}

	fn message(&self) -> String {
		match &self.0 {
			GovernorError::TooManyRequests { wait_time, .. } => {
				format!("Too many requests. Try again in {wait_time} seconds.")
			}
			_ => "Something went wrong.".into(),
		}
	}
}

/// Quota applied to every route.
pub fn default() -> Config {
	Arc::new(
		GovernorConfigBuilder::default()
			.per_second(10)
			.burst_size(50)
			.use_headers()
			.error_handler(error_handler)
			.finish()
			.expect("rate limit quota is non-zero"),
	)
}

/// Quota for routes that are attractive to abuse, such as logging in.
pub fn secure() -> Config {
	Arc::new(
		GovernorConfigBuilder::default()
			.per_second(1)
			.burst_size(5)
			.use_headers()
			.error_handler(error_handler)
			.finish()
			.expect("rate limit quota is non-zero"),
	)
}

pub fn layer(config: &Config) -> GovernorLayer<PeerIpKeyExtractor, StateInformationMiddleware> {
	GovernorLayer {
		config: Arc::clone(config),
	}
}

fn error_handler(error: GovernorError) -> Response<Body> {
	let headers = match &error {
		GovernorError::TooManyRequests { headers, .. } | GovernorError::Other { headers, .. } => {
			headers.clone()
		}
		GovernorError::UnableToExtractKey => None,
	};

	let mut response = error::RouteError::from(Error(error)).into_response();

	if let Some(headers) = headers {
		response.headers_mut().extend(headers);
	}

	response
}

pub fn cleanup_old_limits<T, M>(configs: &[&Arc<GovernorConfig<T, M>>])
where
	T: KeyExtractor,
	<T as KeyExtractor>::Key: Send + Sync + 'static,
	M: RateLimitingMiddleware<QuantaInstant> + Send + Sync + 'static,
{
	let limiters = configs
		.iter()
		.map(|config| config.limiter().clone())
		.collect::<Vec<_>>();
	let interval = Duration::from_secs(60);

	std::thread::spawn(move || loop {
		std::thread::sleep(interval);

		for limiter in &limiters {
			tracing::debug!("rate limiting storage size: {}", limiter.len());

			limiter.retain_recent();
		}
	});
}
