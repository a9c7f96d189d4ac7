//! Helpers shared by the route tests: a cookie-persisting test server over
//! the full router (minus the rate limiter, which needs real peer
//! addresses) and shortcuts for the common form submissions.

use std::sync::Arc;

use argon2::Argon2;
use axum::Router;
use axum_test::{TestServer, TestServerConfig};
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

pub use axum_test::TestResponse;
pub use serde_json::json;

pub use crate::Database;

pub fn app(pool: Database) -> TestServer {
	let state = crate::State {
		database: pool,
		hasher: Argon2::default(),
		templates: Arc::new(crate::template::engine().expect("failed to parse templates")),
	};

	let router = Router::new()
		.merge(crate::route::auth::routes())
		.merge(crate::route::post::routes())
		.merge(crate::route::pages::routes())
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CompressionLayer::new())
				.layer(CookieManagerLayer::new()),
		)
		.with_state(state);

	let config = TestServerConfig::builder().save_cookies().build();

	TestServer::new_with_config(router, config).expect("failed to start test server")
}

/// Fetches a form page so the server issues a CSRF cookie, and returns the
/// token to echo back in the hidden field.
pub async fn csrf_token(server: &TestServer, path: &str) -> String {
	let response = server.get(path).await;

	response.cookie(crate::csrf::COOKIE_NAME).value().to_owned()
}

pub async fn register(
	server: &TestServer,
	email: &str,
	password: &str,
	name: &str,
) -> TestResponse {
	let token = csrf_token(server, "/register").await;

	server
		.post("/register")
		.form(&json!({
			"csrf_token": token,
			"email": email,
			"password": password,
			"name": name,
		}))
		.await
}

pub async fn login(server: &TestServer, email: &str, password: &str) -> TestResponse {
	let token = csrf_token(server, "/login").await;

	server
		.post("/login")
		.form(&json!({
			"csrf_token": token,
			"email": email,
			"password": password,
		}))
		.await
}

pub async fn create_post(
	server: &TestServer,
	title: &str,
	subtitle: &str,
	body: &str,
) -> TestResponse {
	let token = csrf_token(server, "/new-post").await;

	server
		.post("/new-post")
		.form(&json!({
			"csrf_token": token,
			"title": title,
			"subtitle": subtitle,
			"img_url": "https://example.com/cover.png",
			"body": body,
		}))
		.await
}

pub async fn comment(server: &TestServer, post_id: i32, text: &str) -> TestResponse {
	let token = csrf_token(server, &format!("/post/{post_id}")).await;

	server
		.post(&format!("/post/{post_id}"))
		.form(&json!({ "csrf_token": token, "text": text }))
		.await
}
