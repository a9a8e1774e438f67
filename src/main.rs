#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod form;
mod ratelimit;
mod route;
mod session;
mod store;
mod template;
mod trace;


use std::{net::SocketAddr, sync::Arc};

use argon2::Argon2;
use axum::{middleware, Router};
use tower::{Layer, ServiceBuilder};
use tower_http::{
	compression::CompressionLayer,
	normalize_path::NormalizePathLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	trace::TraceLayer,
};

use crate::{
	config::Config,
	store::{Database, MemoryStore, PgStore},
};

pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as the store, a hash configuration (if it's expensive to create),
/// or the application configuration.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub config: Arc<Config>,
}

/// Builds the router with its middleware and state.
///
/// Trailing slashes are trimmed before routing, so the normalizing router
/// hands every request to the inner one as its fallback.
pub fn app(state: AppState) -> Router {
	let router = route::routes(&state.config)
		.layer(middleware::from_fn_with_state(
			state.clone(),
			error::error_page_reader,
		))
		.layer(
			ServiceBuilder::new()
				.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
				.layer(TraceLayer::new_for_http().on_response(trace::RecordLatency))
				.layer(PropagateRequestIdLayer::x_request_id())
				.layer(CompressionLayer::new()),
		)
		.with_state(state);

	Router::new().fallback_service(NormalizePathLayer::trim_trailing_slash().layer(router))
}

async fn shutdown_signal() {
	if let Err(error) = tokio::signal::ctrl_c().await {
		tracing::error!(%error, "failed to listen for shutdown signal");
	}

	tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	dotenvy::dotenv().ok();

	let config = Arc::new(Config::from_env()?);
	let _guard = trace::init_tracing_subscriber(&config)?;

	let database: Database = match &config.database_url {
		Some(url) => Arc::new(PgStore::connect(url).await?),
		None => {
			tracing::warn!("DATABASE_URL is not set, data is kept in memory");
			Arc::new(MemoryStore::new())
		}
	};

	let state = State {
		database,
		hasher: Argon2::default(),
		config: Arc::clone(&config),
	};

	let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;

	tracing::info!("listening on {}", listener.local_addr()?);

	axum::serve(
		listener,
		app(state).into_make_service_with_connect_info::<SocketAddr>(),
	)
	.with_graceful_shutdown(shutdown_signal())
	.await?;

	Ok(())
}
