use serde::{Deserialize, Serialize};
use validator::Validate;

/// The registration form. Every field is required; email uniqueness is
/// enforced by the database, not here.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RegisterForm {
	#[serde(default)]
	pub csrf_token: String,
	#[validate(length(min = 1, message = "This field is required."))]
	pub email: String,
	#[serde(skip_serializing)]
	#[validate(length(min = 1, message = "This field is required."))]
	pub password: String,
	#[validate(length(min = 1, message = "This field is required."))]
	pub name: String,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct LoginForm {
	#[serde(default)]
	pub csrf_token: String,
	#[validate(length(min = 1, message = "This field is required."))]
	pub email: String,
	#[serde(skip_serializing)]
	#[validate(length(min = 1, message = "This field is required."))]
	pub password: String,
}
