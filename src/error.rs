use axum::{
	body::Body,
	http::{Response, StatusCode},
	response::{Html, IntoResponse},
};

use crate::{flash::Flash, route::auth};

/// Error type for the application.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("auth error: {0}")]
	Auth(#[from] auth::Error),
	#[error("forbidden")]
	Forbidden,
	#[error("not found")]
	NotFound,
	#[error("missing or mismatched csrf token")]
	InvalidCsrf,
	#[error("template error: {0}")]
	Template(#[from] tera::Error),
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
}

fn page(status: StatusCode, title: &str, detail: &str) -> Response<Body> {
	(
		status,
		Html(format!(
			"<!DOCTYPE html><html><head><title>{title}</title></head>\
			 <body><h1>{title}</h1><p>{detail}</p><p><a href=\"/\">Back to the blog</a></p></body></html>"
		)),
	)
		.into_response()
}

impl IntoResponse for Error {
	fn into_response(self) -> Response<Body> {
		match self {
			// Hashing failures are operational problems, not bad credentials.
			Error::Auth(auth::Error::Hash(error)) => {
				tracing::error!(%error, "password hashing failed");
				page(
					StatusCode::INTERNAL_SERVER_ERROR,
					"Something went wrong",
					"Please try again later.",
				)
			}
			Error::Auth(error) => crate::flash::redirect("/login", &Flash::error(error.to_string())),
			Error::Forbidden => page(
				StatusCode::FORBIDDEN,
				"Forbidden",
				"You are not allowed to do that.",
			),
			Error::NotFound => page(
				StatusCode::NOT_FOUND,
				"Not found",
				"That page does not exist.",
			),
			Error::InvalidCsrf => page(
				StatusCode::BAD_REQUEST,
				"Bad request",
				"The form has expired. Go back, reload the page and try again.",
			),
			Error::Template(error) => {
				tracing::error!(%error, "template rendering failed");
				page(
					StatusCode::INTERNAL_SERVER_ERROR,
					"Something went wrong",
					"Please try again later.",
				)
			}
			Error::Database(error) => {
				tracing::error!(%error, "database query failed");
				page(
					StatusCode::INTERNAL_SERVER_ERROR,
					"Something went wrong",
					"Please try again later.",
				)
			}
		}
	}
}
