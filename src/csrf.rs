//! Double-submit CSRF protection: a token issued as a cookie on every
//! rendered form, echoed back in a hidden field and compared on submit.

use tower_cookies::Cookies;
use uuid::Uuid;

use crate::Error;

pub const COOKIE_NAME: &str = "csrf_token";

/// Returns the current CSRF token, minting one if the browser has none yet.
/// The cookie is (re)set on every rendered form page.
pub fn issue(cookies: &Cookies) -> String {
	let token = cookies
		.get(COOKIE_NAME)
		.map_or_else(|| Uuid::new_v4().to_string(), |cookie| cookie.value().to_owned());

	cookies.add(
		cookie::Cookie::build((COOKIE_NAME, token.clone()))
			.secure(!cfg!(debug_assertions))
			.http_only(true)
			.path("/")
			.into(),
	);

	token
}

/// Compares the submitted token against the cookie copy.
pub fn verify(cookies: &Cookies, submitted: &str) -> Result<(), Error> {
	match cookies.get(COOKIE_NAME) {
		Some(cookie) if !submitted.is_empty() && cookie.value() == submitted => Ok(()),
		_ => Err(Error::InvalidCsrf),
	}
}
