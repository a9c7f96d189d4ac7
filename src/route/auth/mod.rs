use axum::routing::get;

use crate::AppState;

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the visitor as flash text, so
/// they should not contain sensitive information. Unknown email and wrong
/// password share one variant on purpose, so login failures cannot be used
/// to enumerate accounts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid email or password, please try again.")]
	InvalidCredentials,
	#[error("Please log in to continue.")]
	LoginRequired,
	#[error("You already have an account with that email, please log in.")]
	EmailTaken,
	#[error("password hashing error: {0}")]
	Hash(#[from] argon2::password_hash::Error),
}

pub fn routes() -> axum::Router<AppState> {
	use route::{login, login_page, logout, register, register_page};

	axum::Router::new()
		.route("/register", get(register_page).post(register))
		.route("/login", get(login_page).post(login))
		.route("/logout", get(logout))
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[sqlx::test]
	async fn test_register_creates_user_and_logs_in(pool: Database) {
		let server = app(pool.clone());

		let response = register(&server, "a@x.com", "password1", "A").await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/");
		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.contains("session="));

		let users: i64 = sqlx::query_scalar("SELECT count(*) FROM users")
			.fetch_one(&pool)
			.await
			.unwrap();

		assert_eq!(users, 1);

		// the session cookie is honored on the next request
		let home = server.get("/").await;

		home.assert_status_ok();
		assert!(home.text().contains("Log out"));
	}

	#[sqlx::test]
	async fn test_concurrent_registrations_mint_exactly_one_admin(pool: Database) {
		let first = app(pool.clone());
		let second = app(pool.clone());

		// both transactions start against an empty users table; the
		// advisory lock forces one to wait for the other's commit
		let (a, b) = tokio::join!(
			register(&first, "a@x.com", "password1", "A"),
			register(&second, "b@x.com", "password2", "B"),
		);

		assert_eq!(a.status_code(), 303);
		assert_eq!(b.status_code(), 303);

		let users: i64 = sqlx::query_scalar("SELECT count(*) FROM users")
			.fetch_one(&pool)
			.await
			.unwrap();

		assert_eq!(users, 2);

		let admins: i64 = sqlx::query_scalar("SELECT count(*) FROM users WHERE role = 'admin'")
			.fetch_one(&pool)
			.await
			.unwrap();

		assert_eq!(admins, 1);
	}

	#[sqlx::test]
	async fn test_auth_cookies_are_inaccessible_to_scripts(pool: Database) {
		let server = app(pool);

		let page = server.get("/login").await;
		let csrf = page.cookie(crate::csrf::COOKIE_NAME);

		assert_eq!(csrf.http_only(), Some(true));

		let response = register(&server, "a@x.com", "password1", "A").await;
		let session = response.cookie(crate::session::COOKIE_NAME);

		assert_eq!(session.http_only(), Some(true));
	}

	#[sqlx::test]
	async fn test_duplicate_email_redirects_to_login(pool: Database) {
		let server = app(pool.clone());

		register(&server, "a@x.com", "password1", "A").await;

		let other = app(pool.clone());
		let response = register(&other, "a@x.com", "different2", "Also A").await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/login");

		// the flash message is rendered once on the next page load
		let login = other.get("/login").await;
		assert!(login.text().contains("please log in"));

		let users: i64 = sqlx::query_scalar("SELECT count(*) FROM users")
			.fetch_one(&pool)
			.await
			.unwrap();

		assert_eq!(users, 1);
	}

	#[sqlx::test]
	async fn test_register_requires_every_field(pool: Database) {
		let server = app(pool.clone());

		let token = csrf_token(&server, "/register").await;
		let response = server
			.post("/register")
			.form(&json!({
				"csrf_token": token,
				"email": "a@x.com",
				"password": "password1",
				"name": "",
			}))
			.await;

		// re-rendered with an inline error, nothing persisted
		response.assert_status_ok();
		assert!(response.text().contains("This field is required."));

		let users: i64 = sqlx::query_scalar("SELECT count(*) FROM users")
			.fetch_one(&pool)
			.await
			.unwrap();

		assert_eq!(users, 0);
	}

	#[sqlx::test]
	async fn test_register_rejects_missing_csrf_token(pool: Database) {
		let server = app(pool.clone());

		let response = server
			.post("/register")
			.form(&json!({
				"csrf_token": "",
				"email": "a@x.com",
				"password": "password1",
				"name": "A",
			}))
			.await;

		assert_eq!(response.status_code(), 400);

		let users: i64 = sqlx::query_scalar("SELECT count(*) FROM users")
			.fetch_one(&pool)
			.await
			.unwrap();

		assert_eq!(users, 0);
	}

	#[sqlx::test]
	async fn test_login_flow(pool: Database) {
		let server = app(pool.clone());

		register(&server, "a@x.com", "password1", "A").await;

		let response = server.get("/logout").await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/");

		let home = server.get("/").await;
		assert!(home.text().contains("Log in"));

		// wrong password and unknown email both bounce back to /login
		let response = login(&server, "a@x.com", "wrongpassword").await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/login");

		let response = login(&server, "nobody@x.com", "password1").await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/login");

		let home = server.get("/").await;
		assert!(home.text().contains("Log in"));

		// correct credentials establish the same identity again
		let response = login(&server, "a@x.com", "password1").await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/");

		let home = server.get("/").await;
		assert!(home.text().contains("Log out"));
		assert!(home.text().contains("Signed in as A"));
	}
}
