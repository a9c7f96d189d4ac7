use argon2::{
	password_hash::{rand_core::OsRng, SaltString},
	Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{
	extract::State,
	response::{Html, IntoResponse, Redirect, Response},
	Form,
};
use tower_cookies::Cookies;
use uuid::Uuid;
use validator::Validate;

use crate::{csrf, flash, model, session, template, AppState, Database, Error};

use super::{
	model::{LoginForm, RegisterForm},
	Error as AuthError,
};

/// Hashes a password into a PHC string with a random per-password salt.
fn hash_password(hasher: &Argon2, password: &str) -> Result<String, AuthError> {
	let salt = SaltString::generate(&mut OsRng);

	Ok(hasher.hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Verifies a password against a stored PHC string. Any failure, including
/// an unparseable hash, is reported as bad credentials.
fn verify_password(hasher: &Argon2, password: &str, hash: &str) -> Result<(), AuthError> {
	let parsed = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

	hasher
		.verify_password(password.as_bytes(), &parsed)
		.map_err(|_| AuthError::InvalidCredentials)
}

async fn create_session(
	database: &Database,
	user_id: i32,
	cookies: &Cookies,
) -> Result<(), Error> {
	let session =
		sqlx::query_as::<_, model::Session>("INSERT INTO sessions (user_id) VALUES ($1) RETURNING *")
			.bind(user_id)
			.fetch_one(database)
			.await?;

	cookies.add(session::create_cookie(session.id));

	Ok(())
}

fn render_register(
	state: &AppState,
	cookies: &Cookies,
	form: &RegisterForm,
	errors: Option<&validator::ValidationErrors>,
) -> Result<Html<String>, Error> {
	let mut ctx = template::context(None, flash::take(cookies));

	ctx.insert("csrf_token", &csrf::issue(cookies));
	ctx.insert("form", form);

	if let Some(errors) = errors {
		ctx.insert("errors", &template::error_map(errors));
	}

	template::render(&state.templates, "register.html.tera", &ctx)
}

fn render_login(
	state: &AppState,
	cookies: &Cookies,
	form: &LoginForm,
	errors: Option<&validator::ValidationErrors>,
) -> Result<Html<String>, Error> {
	let mut ctx = template::context(None, flash::take(cookies));

	ctx.insert("csrf_token", &csrf::issue(cookies));
	ctx.insert("form", form);

	if let Some(errors) = errors {
		ctx.insert("errors", &template::error_map(errors));
	}

	template::render(&state.templates, "login.html.tera", &ctx)
}

pub async fn register_page(
	State(state): State<AppState>,
	cookies: Cookies,
) -> Result<Html<String>, Error> {
	let form = RegisterForm {
		csrf_token: String::new(),
		email: String::new(),
		password: String::new(),
		name: String::new(),
	};

	render_register(&state, &cookies, &form, None)
}

/// Advisory lock key serializing the first-admin decision across
/// concurrent registrations.
const ADMIN_BOOTSTRAP_LOCK: i64 = 0x5155_494c_4c01;

/// Registers a new account, logs it in and redirects to the post listing.
///
/// The first account ever created is stored with the admin role. Under
/// READ COMMITTED the `EXISTS` check cannot see another transaction's
/// uncommitted row, so the insert runs behind a transaction-scoped
/// advisory lock: racing registrations queue until the winner commits.
/// A partial unique index on `role = 'admin'` backstops the invariant
/// at the schema level.
pub async fn register(
	State(state): State<AppState>,
	cookies: Cookies,
	Form(input): Form<RegisterForm>,
) -> Result<Response, Error> {
	csrf::verify(&cookies, &input.csrf_token)?;

	if let Err(errors) = input.validate() {
		return Ok(render_register(&state, &cookies, &input, Some(&errors))?.into_response());
	}

	let hash = hash_password(&state.hasher, &input.password)?;

	let mut tx = state.database.begin().await?;

	sqlx::query("SELECT pg_advisory_xact_lock($1)")
		.bind(ADMIN_BOOTSTRAP_LOCK)
		.execute(&mut *tx)
		.await?;

	let user = sqlx::query_as::<_, model::User>(
		r#"
			INSERT INTO users (email, password_hash, name, role)
			VALUES ($1, $2, $3,
				CASE WHEN EXISTS (SELECT 1 FROM users) THEN 'member'::user_role ELSE 'admin'::user_role END)
			RETURNING *
		"#,
	)
	.bind(&input.email)
	.bind(&hash)
	.bind(&input.name)
	.fetch_one(&mut *tx)
	.await
	.map_err(|e| match e {
		sqlx::Error::Database(ref d) if d.constraint() == Some("users_email_key") => {
			Error::from(AuthError::EmailTaken)
		}
		e => Error::from(e),
	})?;

	let session =
		sqlx::query_as::<_, model::Session>("INSERT INTO sessions (user_id) VALUES ($1) RETURNING *")
			.bind(user.id)
			.fetch_one(&mut *tx)
			.await?;

	tx.commit().await?;

	tracing::info!(user = user.id, role = ?user.role, "registered new user");

	cookies.add(session::create_cookie(session.id));

	Ok(Redirect::to("/").into_response())
}

pub async fn login_page(
	State(state): State<AppState>,
	cookies: Cookies,
) -> Result<Html<String>, Error> {
	let form = LoginForm {
		csrf_token: String::new(),
		email: String::new(),
		password: String::new(),
	};

	render_login(&state, &cookies, &form, None)
}

/// Logs in to an account and redirects to the post listing.
pub async fn login(
	State(state): State<AppState>,
	cookies: Cookies,
	Form(input): Form<LoginForm>,
) -> Result<Response, Error> {
	csrf::verify(&cookies, &input.csrf_token)?;

	if let Err(errors) = input.validate() {
		return Ok(render_login(&state, &cookies, &input, Some(&errors))?.into_response());
	}

	let user = sqlx::query_as::<_, model::User>("SELECT * FROM users WHERE email = $1")
		.bind(&input.email)
		.fetch_optional(&state.database)
		.await?;

	// unknown email and wrong password produce the same flash message
	let Some(user) = user else {
		return Err(AuthError::InvalidCredentials.into());
	};

	verify_password(&state.hasher, &input.password, &user.password_hash)?;

	create_session(&state.database, user.id, &cookies).await?;

	Ok(Redirect::to("/").into_response())
}

/// Clears the session. Always succeeds, even for anonymous visitors.
pub async fn logout(State(state): State<AppState>, cookies: Cookies) -> Result<Redirect, Error> {
	let session_id = cookies
		.get(session::COOKIE_NAME)
		.and_then(|cookie| Uuid::parse_str(cookie.value()).ok());

	if let Some(session_id) = session_id {
		sqlx::query("DELETE FROM sessions WHERE id = $1")
			.bind(session_id)
			.execute(&state.database)
			.await?;
	}

	cookies.add(session::clear_cookie());

	Ok(Redirect::to("/"))
}
