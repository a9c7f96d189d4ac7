//! One-time notices carried in a cookie and rendered on the next page load.

use axum::{
	http::{header, HeaderValue, StatusCode},
	response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

const FLASH_COOKIE_NAME: &str = "_flash";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flash {
	pub kind: String,
	pub message: String,
}

impl Flash {
	pub fn error(message: impl Into<String>) -> Self {
		Self {
			kind: "error".to_owned(),
			message: message.into(),
		}
	}

	pub fn success(message: impl Into<String>) -> Self {
		Self {
			kind: "success".to_owned(),
			message: message.into(),
		}
	}
}

fn cookie(flash: &Flash) -> Option<cookie::Cookie<'static>> {
	let value = serde_json::to_string(flash).ok()?;

	Some(cookie::Cookie::build((FLASH_COOKIE_NAME, value)).path("/").into())
}

/// Reads and clears the pending flash message, if any.
pub fn take(cookies: &Cookies) -> Option<Flash> {
	let flash = cookies
		.get(FLASH_COOKIE_NAME)
		.and_then(|cookie| serde_json::from_str(cookie.value()).ok())?;

	cookies.remove(cookie::Cookie::build(FLASH_COOKIE_NAME).path("/").into());

	Some(flash)
}

/// Stores a flash message for the next request.
pub fn set(cookies: &Cookies, flash: &Flash) {
	if let Some(cookie) = cookie(flash) {
		cookies.add(cookie);
	}
}

/// A redirect response that carries a flash message, usable from places
/// without access to the request's cookie jar (e.g. error conversion).
pub fn redirect(location: &str, flash: &Flash) -> Response {
	let mut response = axum::response::Redirect::to(location).into_response();

	if let Some(cookie) = cookie(flash) {
		if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
			response.headers_mut().append(header::SET_COOKIE, value);
		}
	}

	debug_assert_eq!(response.status(), StatusCode::SEE_OTHER);

	response
}
