use axum::{extract::State, response::Html, routing::get};
use tower_cookies::Cookies;

use crate::{extract::MaybeUser, flash, template, AppState, Error};

pub fn routes() -> axum::Router<AppState> {
	axum::Router::new().route("/about", get(about))
}

/// Static informational page.
pub async fn about(
	State(state): State<AppState>,
	user: MaybeUser,
	cookies: Cookies,
) -> Result<Html<String>, Error> {
	let ctx = template::context(user.0.as_ref(), flash::take(&cookies));

	template::render(&state.templates, "about.html.tera", &ctx)
}
