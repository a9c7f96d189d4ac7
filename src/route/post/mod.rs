use axum::routing::get;

use crate::AppState;

pub mod model;
pub mod route;

pub fn routes() -> axum::Router<AppState> {
	use route::{comment, create_post, delete_post, edit_post, edit_post_page, index, new_post_page, show};

	axum::Router::new()
		.route("/", get(index))
		.route("/post/:id", get(show).post(comment))
		.route("/new-post", get(new_post_page).post(create_post))
		.route("/edit-post/:id", get(edit_post_page).post(edit_post))
		.route("/delete/:id", get(delete_post))
}
