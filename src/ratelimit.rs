use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	http::StatusCode,
	response::{Html, IntoResponse, Response},
};
use governor::{
	clock::QuantaInstant,
	middleware::{RateLimitingMiddleware, StateInformationMiddleware},
};
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::{KeyExtractor, PeerIpKeyExtractor},
	GovernorError,
};

/// Limiter for the credential routes; registration and login are the only
/// endpoints worth brute-forcing.
pub fn auth() -> Arc<GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>> {
	Arc::new(
		GovernorConfigBuilder::default()
			.per_second(1)
			.burst_size(10)
			.use_headers()
			.error_handler(error_handler)
			.finish()
			.unwrap(),
	)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	let status = match error {
		GovernorError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
		GovernorError::UnableToExtractKey | GovernorError::Other { .. } => {
			StatusCode::INTERNAL_SERVER_ERROR
		}
	};

	(status, Html("<p>Too many attempts, slow down.</p>")).into_response()
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
