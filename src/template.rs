//! HTML pages, compiled from `templates/` by askama.
//!
//! Every page carries `user`, the name of the logged in user (if any), which
//! the base layout uses to pick the navigation links.

use askama::Template;
use axum::response::Html;

use crate::{
	form::FormErrors,
	route::{
		comment::model::{Comment, CommentForm},
		post::model::{Post, PostForm, PostListing},
	},
};

pub fn render<T: Template>(template: &T) -> Result<Html<String>, askama::Error> {
	Ok(Html(template.render()?))
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
	pub user: Option<String>,
	pub status: u16,
	pub reason: &'static str,
	pub message: String,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutPage {
	pub user: Option<String>,
}

#[derive(Template)]
#[template(path = "post_list.html")]
pub struct PostListPage {
	pub user: Option<String>,
	pub posts: Vec<PostListing>,
	pub page: i64,
	pub size: i64,
	pub has_next: bool,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailPage {
	pub user: Option<String>,
	pub post: Post,
	/// Only the comments the reader may see.
	pub comments: Vec<Comment>,
}

/// Used for both creating and editing a post.
#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormPage {
	pub user: Option<String>,
	pub heading: &'static str,
	pub action: String,
	pub form: PostForm,
	pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "post_confirm_delete.html")]
pub struct PostConfirmDeletePage {
	pub user: Option<String>,
	pub post: Post,
}

#[derive(Template)]
#[template(path = "post_draft_list.html")]
pub struct DraftListPage {
	pub user: Option<String>,
	pub posts: Vec<Post>,
}

#[derive(Template)]
#[template(path = "comment_form.html")]
pub struct CommentFormPage {
	pub user: Option<String>,
	pub post: Post,
	pub form: CommentForm,
	pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
	pub user: Option<String>,
	pub username: String,
	pub next: String,
	pub errors: FormErrors,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterPage {
	pub user: Option<String>,
	pub username: String,
	pub errors: FormErrors,
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_escapes_user_content() {
		let page = PostDetailPage {
			user: None,
			post: Post {
				title: "<script>alert(1)</script>".into(),
				..Default::default()
			},
			comments: Vec::new(),
		};

		let html = page.render().unwrap();

		assert!(!html.contains("<script>"));
		assert!(html.contains("&lt;script&gt;"));
	}

	#[test]
	fn test_navigation_depends_on_user() {
		let anonymous = AboutPage { user: None }.render().unwrap();
		let author = AboutPage {
			user: Some("ferris".into()),
		}
		.render()
		.unwrap();

		assert!(anonymous.contains("/accounts/login"));
		assert!(!anonymous.contains("/drafts"));
		assert!(author.contains("/drafts"));
		assert!(author.contains("ferris"));
	}
}
