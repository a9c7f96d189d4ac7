use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};
use uuid::Uuid;

use crate::{model, route::auth, session, Database, Error};

/// Extracts the session and related user from the request.
///
/// If no session cookie exists, or it does not point at a live session row,
/// an [`auth::Error::LoginRequired`] is returned, which redirects the
/// browser to the login page with a flash message.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: model::User,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let cookies = parts
			.headers
			.get_all(header::COOKIE)
			.into_iter()
			.filter_map(|value| value.to_str().ok());

		let session_id = cookies
			.flat_map(cookie::Cookie::split_parse)
			.filter_map(Result::ok)
			.find(|cookie| cookie.name() == session::COOKIE_NAME)
			.ok_or(auth::Error::LoginRequired)?;

		let session_id =
			Uuid::parse_str(session_id.value()).map_err(|_| auth::Error::LoginRequired)?;

		let database = Database::from_ref(state);
		let user = sqlx::query_as::<_, model::User>(
			r#"
			SELECT * FROM users WHERE id = (
				SELECT user_id FROM sessions WHERE id = $1
			)
		"#,
		)
		.bind(session_id)
		.fetch_optional(&database)
		.await?;

		let user = user.ok_or(auth::Error::LoginRequired)?;

		Ok(Self {
			id: session_id,
			user,
		})
	}
}

/// Like [`Session`], but anonymous visitors extract as `None` instead of
/// being bounced to the login page. Used by every public page.
#[derive(Debug)]
pub struct MaybeUser(pub Option<model::User>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		match Session::from_request_parts(parts, state).await {
			Ok(session) => Ok(Self(Some(session.user))),
			Err(Error::Auth(auth::Error::LoginRequired)) => Ok(Self(None)),
			Err(error) => Err(error),
		}
	}
}

/// Guard for the post-management routes.
///
/// Resolves the session and rejects with a hard 403 unless the user's
/// stored role is admin. Anonymous requests are also 403, not a login
/// redirect, so the guard never leaks which routes exist behind it.
#[derive(Debug)]
pub struct Admin(pub Session);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Admin
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Error;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let session = match Session::from_request_parts(parts, state).await {
			Ok(session) => session,
			Err(Error::Auth(auth::Error::LoginRequired)) => return Err(Error::Forbidden),
			Err(error) => return Err(error),
		};

		if !session.user.is_admin() {
			return Err(Error::Forbidden);
		}

		Ok(Self(session))
	}
}
