use std::collections::HashMap;

use axum::response::Html;
use tera::Tera;

use crate::{flash::Flash, model, Error};

/// Parses every template under `templates/` once, at startup.
pub fn engine() -> Result<Tera, tera::Error> {
	Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*"))
}

/// A base context every page shares: the current user (or `null`), the
/// pending flash message (or `null`) and an empty field-error map.
pub fn context(user: Option<&model::User>, flash: Option<Flash>) -> tera::Context {
	let mut ctx = tera::Context::new();

	ctx.insert("current_user", &user);
	ctx.insert("flash", &flash);
	ctx.insert("errors", &HashMap::<String, String>::new());

	ctx
}

pub fn render(templates: &Tera, name: &str, ctx: &tera::Context) -> Result<Html<String>, Error> {
	Ok(Html(templates.render(name, ctx)?))
}

/// Flattens [`validator::ValidationErrors`] into one message per field,
/// for inline display next to the offending input.
pub fn error_map(errors: &validator::ValidationErrors) -> HashMap<String, String> {
	errors
		.field_errors()
		.into_iter()
		.map(|(field, errors)| {
			let message = errors
				.first()
				.and_then(|error| error.message.as_ref())
				.map_or_else(|| "Invalid value.".to_owned(), ToString::to_string);

			(field.to_owned(), message)
		})
		.collect()
}

#[cfg(test)]
mod test {
	use validator::Validate;

	#[derive(Validate)]
	struct Input {
		#[validate(length(min = 1, message = "This field is required."))]
		title: String,
		#[validate(url(message = "Must be a valid URL."))]
		img_url: String,
	}

	#[test]
	fn test_error_map_takes_first_message() {
		let input = Input {
			title: String::new(),
			img_url: "not a url".to_owned(),
		};

		let errors = input.validate().unwrap_err();
		let map = super::error_map(&errors);

		assert_eq!(map["title"], "This field is required.");
		assert_eq!(map["img_url"], "Must be a valid URL.");
	}

	#[test]
	fn test_valid_input_has_no_errors() {
		let input = Input {
			title: "Hello".to_owned(),
			img_url: "https://example.com/cat.png".to_owned(),
		};

		assert!(input.validate().is_ok());
	}
}
