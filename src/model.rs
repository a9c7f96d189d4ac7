use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role stored on every user row.
///
/// The first account ever registered is persisted as [`Role::Admin`];
/// everyone after that is a [`Role::Member`]. Authorization checks read
/// this column instead of comparing row ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
	Admin,
	Member,
}

/// A model representing a single user.
///
/// The `email` and `password_hash` fields are never serialized into
/// a template context.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
	pub id: i32,
	#[serde(skip_serializing)]
	pub email: String,
	/// Argon2 PHC string, salted per password.
	#[serde(skip_serializing)]
	pub password_hash: String,
	pub name: String,
	pub role: Role,
	pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
	pub fn is_admin(&self) -> bool {
		self.role == Role::Admin
	}
}

/// A single blog post, authored by the admin.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Post {
	pub id: i32,
	pub author_id: i32,
	pub title: String,
	pub subtitle: String,
	/// Display string stamped at creation time, e.g. "August 23, 2026".
	pub date: String,
	pub body: String,
	pub img_url: String,
}

/// A comment on a post, authored by any registered user.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Comment {
	pub id: i32,
	pub author_id: i32,
	pub post_id: i32,
	pub text: String,
}

/// A server-side session row; the cookie only carries `id`.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Session {
	pub id: Uuid,
	pub user_id: i32,
	pub created_at: chrono::DateTime<chrono::Utc>,
}
