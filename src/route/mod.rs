use axum::Router;

use crate::{config::Config, ratelimit, AppState};

pub mod auth;
pub mod comment;
pub mod model;
pub mod page;
pub mod post;

/// Builds the application router.
///
/// With rate limiting enabled, the server must be started with peer address
/// information (`into_make_service_with_connect_info::<SocketAddr>`).
pub fn routes(config: &Config) -> Router<AppState> {
	let mut auth = auth::routes();
	let mut comment = comment::routes();

	let limits = config.rate_limit.then(|| {
		let strict = ratelimit::secure();
		let default = ratelimit::default();

		ratelimit::cleanup_old_limits(&[&strict, &default]);

		(strict, default)
	});

	// Logging in and commenting get the stricter quota
	if let Some((strict, _)) = &limits {
		auth = auth.layer(ratelimit::layer(strict));
		comment = comment.layer(ratelimit::layer(strict));
	}

	let router = Router::new()
		.merge(post::routes())
		.merge(comment)
		.merge(page::routes())
		.nest("/accounts", auth)
		.fallback(page::not_found);

	match &limits {
		Some((_, default)) => router.layer(ratelimit::layer(default)),
		None => router,
	}
}
