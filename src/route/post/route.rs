use axum::{
	extract::{Path, State},
	response::{Html, IntoResponse, Response},
	Form,
};
use tower_cookies::Cookies;
use validator::Validate;

use crate::{
	csrf,
	extract::{Admin, MaybeUser, Session},
	flash::{self, Flash},
	model, template, AppState, Error,
};

use super::model::{CommentForm, CommentWithAuthor, PostForm, PostWithAuthor};

async fn fetch_post(state: &AppState, id: i32) -> Result<PostWithAuthor, Error> {
	let post = sqlx::query_as::<_, PostWithAuthor>(
		r#"
			SELECT p.*, u.name AS author_name
			FROM blog_posts p
			JOIN users u ON u.id = p.author_id
			WHERE p.id = $1
		"#,
	)
	.bind(id)
	.fetch_optional(&state.database)
	.await?;

	post.ok_or(Error::NotFound)
}

/// Renders the single-post page: the post, its comments in insertion
/// order and (for logged-in visitors) the comment form.
async fn render_post_page(
	state: &AppState,
	cookies: &Cookies,
	user: Option<&model::User>,
	post: &PostWithAuthor,
	form: &CommentForm,
	errors: Option<&validator::ValidationErrors>,
) -> Result<Html<String>, Error> {
	let comments = sqlx::query_as::<_, CommentWithAuthor>(
		r#"
			SELECT c.*, u.name AS author_name
			FROM comments c
			JOIN users u ON u.id = c.author_id
			WHERE c.post_id = $1
			ORDER BY c.id
		"#,
	)
	.bind(post.id)
	.fetch_all(&state.database)
	.await?;

	let mut ctx = template::context(user, flash::take(cookies));

	ctx.insert("post", post);
	ctx.insert("comments", &comments);
	ctx.insert("csrf_token", &csrf::issue(cookies));
	ctx.insert("form", form);

	if let Some(errors) = errors {
		ctx.insert("errors", &template::error_map(errors));
	}

	template::render(&state.templates, "post.html.tera", &ctx)
}

fn render_editor(
	state: &AppState,
	cookies: &Cookies,
	user: &model::User,
	form: &PostForm,
	is_edit: bool,
	errors: Option<&validator::ValidationErrors>,
) -> Result<Html<String>, Error> {
	let mut ctx = template::context(Some(user), flash::take(cookies));

	ctx.insert("csrf_token", &csrf::issue(cookies));
	ctx.insert("form", form);
	ctx.insert("is_edit", &is_edit);

	if let Some(errors) = errors {
		ctx.insert("errors", &template::error_map(errors));
	}

	template::render(&state.templates, "make-post.html.tera", &ctx)
}

fn empty_form() -> PostForm {
	PostForm {
		csrf_token: String::new(),
		title: String::new(),
		subtitle: String::new(),
		img_url: String::new(),
		body: String::new(),
	}
}

/// Returns every post in storage order. Open to all visitors.
pub async fn index(
	State(state): State<AppState>,
	user: MaybeUser,
	cookies: Cookies,
) -> Result<Html<String>, Error> {
	let posts = sqlx::query_as::<_, PostWithAuthor>(
		r#"
			SELECT p.*, u.name AS author_name
			FROM blog_posts p
			JOIN users u ON u.id = p.author_id
			ORDER BY p.id
		"#,
	)
	.fetch_all(&state.database)
	.await?;

	let mut ctx = template::context(user.0.as_ref(), flash::take(&cookies));

	ctx.insert("posts", &posts);

	template::render(&state.templates, "index.html.tera", &ctx)
}

/// Shows a single post with its comments. Open to all visitors.
pub async fn show(
	State(state): State<AppState>,
	user: MaybeUser,
	cookies: Cookies,
	Path(post_id): Path<i32>,
) -> Result<Html<String>, Error> {
	let post = fetch_post(&state, post_id).await?;

	let form = CommentForm {
		csrf_token: String::new(),
		text: String::new(),
	};

	render_post_page(&state, &cookies, user.0.as_ref(), &post, &form, None).await
}

/// Adds a comment to a post. Requires a session; anonymous attempts are
/// redirected to the login page by the extractor. On success the same
/// page is re-rendered with the new comment (no redirect, as the original
/// flow did; refreshing can resubmit).
pub async fn comment(
	State(state): State<AppState>,
	session: Session,
	cookies: Cookies,
	Path(post_id): Path<i32>,
	Form(input): Form<CommentForm>,
) -> Result<Html<String>, Error> {
	csrf::verify(&cookies, &input.csrf_token)?;

	let post = fetch_post(&state, post_id).await?;

	if let Err(errors) = input.validate() {
		return render_post_page(
			&state,
			&cookies,
			Some(&session.user),
			&post,
			&input,
			Some(&errors),
		)
		.await;
	}

	let comment = sqlx::query_as::<_, model::Comment>(
		"INSERT INTO comments (author_id, post_id, text) VALUES ($1, $2, $3) RETURNING *",
	)
	.bind(session.user.id)
	.bind(post.id)
	.bind(&input.text)
	.fetch_one(&state.database)
	.await?;

	tracing::debug!(comment = comment.id, post = post.id, "added comment");

	let form = CommentForm {
		csrf_token: String::new(),
		text: String::new(),
	};

	render_post_page(&state, &cookies, Some(&session.user), &post, &form, None).await
}

/// Shows the empty authoring form. Admin only.
pub async fn new_post_page(
	State(state): State<AppState>,
	Admin(session): Admin,
	cookies: Cookies,
) -> Result<Html<String>, Error> {
	render_editor(&state, &cookies, &session.user, &empty_form(), false, None)
}

/// Creates a post, stamping the creation date and attributing authorship
/// to the current session user. Admin only.
pub async fn create_post(
	State(state): State<AppState>,
	Admin(session): Admin,
	cookies: Cookies,
	Form(input): Form<PostForm>,
) -> Result<Response, Error> {
	csrf::verify(&cookies, &input.csrf_token)?;

	if let Err(errors) = input.validate() {
		return Ok(
			render_editor(&state, &cookies, &session.user, &input, false, Some(&errors))?
				.into_response(),
		);
	}

	let date = chrono::Utc::now().format("%B %d, %Y").to_string();

	let inserted = sqlx::query(
		r#"
			INSERT INTO blog_posts (author_id, title, subtitle, date, body, img_url)
			VALUES ($1, $2, $3, $4, $5, $6)
		"#,
	)
	.bind(session.user.id)
	.bind(&input.title)
	.bind(&input.subtitle)
	.bind(&date)
	.bind(&input.body)
	.bind(&input.img_url)
	.execute(&state.database)
	.await;

	if let Err(error) = inserted {
		if is_title_conflict(&error) {
			return Ok(flash::redirect(
				"/new-post",
				&Flash::error("A post with that title already exists."),
			));
		}

		return Err(error.into());
	}

	Ok(flash::redirect("/", &Flash::success("Post published.")))
}

/// Shows the authoring form pre-populated with an existing post. Admin only.
pub async fn edit_post_page(
	State(state): State<AppState>,
	Admin(session): Admin,
	cookies: Cookies,
	Path(post_id): Path<i32>,
) -> Result<Html<String>, Error> {
	let post = sqlx::query_as::<_, model::Post>("SELECT * FROM blog_posts WHERE id = $1")
		.bind(post_id)
		.fetch_optional(&state.database)
		.await?
		.ok_or(Error::NotFound)?;

	let form = PostForm {
		csrf_token: String::new(),
		title: post.title,
		subtitle: post.subtitle,
		img_url: post.img_url,
		body: post.body,
	};

	render_editor(&state, &cookies, &session.user, &form, true, None)
}

/// Overwrites every editable field of a post. Authorship is reassigned to
/// whoever performs the edit, mirroring the original behavior. Admin only.
pub async fn edit_post(
	State(state): State<AppState>,
	Admin(session): Admin,
	cookies: Cookies,
	Path(post_id): Path<i32>,
	Form(input): Form<PostForm>,
) -> Result<Response, Error> {
	csrf::verify(&cookies, &input.csrf_token)?;

	if let Err(errors) = input.validate() {
		return Ok(
			render_editor(&state, &cookies, &session.user, &input, true, Some(&errors))?
				.into_response(),
		);
	}

	let updated = sqlx::query(
		r#"
			UPDATE blog_posts
			SET title = $1, subtitle = $2, img_url = $3, body = $4, author_id = $5
			WHERE id = $6
		"#,
	)
	.bind(&input.title)
	.bind(&input.subtitle)
	.bind(&input.img_url)
	.bind(&input.body)
	.bind(session.user.id)
	.bind(post_id)
	.execute(&state.database)
	.await;

	match updated {
		Ok(result) if result.rows_affected() == 0 => Err(Error::NotFound),
		Ok(_) => Ok(flash::redirect(
			&format!("/post/{post_id}"),
			&Flash::success("Post updated."),
		)),
		Err(error) if is_title_conflict(&error) => Ok(flash::redirect(
			&format!("/edit-post/{post_id}"),
			&Flash::error("A post with that title already exists."),
		)),
		Err(error) => Err(error.into()),
	}
}

/// Deletes a post and all of its comments in one transaction, so a failure
/// partway through leaves both intact. Admin only.
pub async fn delete_post(
	State(state): State<AppState>,
	_admin: Admin,
	Path(post_id): Path<i32>,
) -> Result<Response, Error> {
	let mut tx = state.database.begin().await?;

	sqlx::query("DELETE FROM comments WHERE post_id = $1")
		.bind(post_id)
		.execute(&mut *tx)
		.await?;

	let deleted = sqlx::query("DELETE FROM blog_posts WHERE id = $1")
		.bind(post_id)
		.execute(&mut *tx)
		.await?;

	// dropping the transaction rolls the comment delete back
	if deleted.rows_affected() == 0 {
		return Err(Error::NotFound);
	}

	tx.commit().await?;

	tracing::info!(post = post_id, "deleted post");

	Ok(flash::redirect("/", &Flash::success("Post deleted.")))
}

fn is_title_conflict(error: &sqlx::Error) -> bool {
	matches!(
		error,
		sqlx::Error::Database(d) if d.constraint() == Some("blog_posts_title_key")
	)
}
