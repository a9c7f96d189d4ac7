#![warn(clippy::pedantic)]

mod csrf;
mod error;
mod extract;
mod flash;
mod model;
mod ratelimit;
mod route;
mod session;
mod template;
#[cfg(test)]
mod test;

use std::sync::Arc;

use argon2::Argon2;
use axum::Router;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_governor::GovernorLayer;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

pub use error::Error;

pub type Database = sqlx::Pool<sqlx::Postgres>;
pub type AppState = State;

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access:
/// the connection pool, the hash configuration and the parsed template set.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub hasher: Argon2<'static>,
	pub templates: Arc<tera::Tera>,
}

#[tokio::main]
async fn main() {
	tracing_subscriber::fmt::init();
	dotenvy::dotenv().ok();

	let database = Database::connect(
		&std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
	)
	.await
	.expect("failed to connect to database");

	sqlx::migrate!()
		.run(&database)
		.await
		.expect("failed to run migrations");

	let state = State {
		database,
		hasher: Argon2::default(),
		templates: Arc::new(template::engine().expect("failed to parse templates")),
	};

	// brute-force protection on the credential routes only
	let auth_limit = ratelimit::auth();
	ratelimit::cleanup_old_limits(&[&auth_limit]);

	let app = Router::new()
		.merge(route::auth::routes().layer(GovernorLayer { config: auth_limit }))
		.merge(route::post::routes())
		.merge(route::pages::routes())
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CompressionLayer::new())
				.layer(CookieManagerLayer::new()),
		)
		.with_state(state);

	let port = std::env::var("PORT").map_or_else(
		|_| 3000,
		|port| port.parse().expect("PORT must be a number"),
	);

	let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on port {}", port);

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
	)
	.await
	.unwrap();
}
