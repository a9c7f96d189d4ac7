use serde::{Deserialize, Serialize};
use validator::Validate;

/// A post joined with its author's display name, ready for a template.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PostWithAuthor {
	pub id: i32,
	pub author_id: i32,
	pub title: String,
	pub subtitle: String,
	pub date: String,
	pub body: String,
	pub img_url: String,
	pub author_name: String,
}

/// A comment joined with its author's display name.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CommentWithAuthor {
	pub id: i32,
	pub author_id: i32,
	pub post_id: i32,
	pub text: String,
	pub author_name: String,
}

/// The authoring form, shared by the create and edit pages.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct PostForm {
	#[serde(default)]
	pub csrf_token: String,
	#[validate(length(min = 1, message = "This field is required."))]
	pub title: String,
	#[validate(length(min = 1, message = "This field is required."))]
	pub subtitle: String,
	#[validate(
		length(min = 1, message = "This field is required."),
		url(message = "Must be a valid URL.")
	)]
	pub img_url: String,
	#[validate(length(min = 1, message = "This field is required."))]
	pub body: String,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CommentForm {
	#[serde(default)]
	pub csrf_token: String,
	#[validate(length(min = 1, message = "This field is required."))]
	pub text: String,
}
