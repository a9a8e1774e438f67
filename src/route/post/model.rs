use chrono::{DateTime, Utc};
use macros::model;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A single blog post.
///
/// A post without a `published_at` timestamp is a draft.
#[model]
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, sqlx::FromRow)]
pub struct Post {
	/// The unique identifier of the post.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The user that wrote the post.
	#[serde(skip_deserializing)]
	pub author_id: Uuid,
	/// The title of the post.
	#[serde(default)]
	#[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters."))]
	pub title: String,
	/// The body of the post.
	#[serde(default)]
	#[validate(length(min = 1, message = "This field is required."))]
	pub text: String,
	/// The creation time of the post.
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
	/// The publication time of the post, if any.
	#[serde(skip_deserializing)]
	pub published_at: Option<DateTime<Utc>>,
}

impl Post {
	/// Whether the post is visible to anonymous readers at `now`.
	pub fn is_published(&self, now: DateTime<Utc>) -> bool {
		self.published_at.is_some_and(|at| at <= now)
	}

	pub fn is_draft(&self) -> bool {
		self.published_at.is_none()
	}
}

impl PostForm {
	/// Strips surrounding whitespace, so that blank fields fail validation.
	pub fn trimmed(self) -> Self {
		Self {
			title: self.title.trim().to_owned(),
			text: self.text.trim().to_owned(),
		}
	}
}

/// A published post as shown on the front page.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostListing {
	#[sqlx(flatten)]
	pub post: Post,
	pub approved_comments: i64,
}

#[cfg(test)]
mod test {
	use chrono::{Duration, Utc};

	use super::*;

	#[test]
	fn test_published_requires_past_timestamp() {
		let now = Utc::now();
		let mut post = Post::default();

		assert!(!post.is_published(now));
		assert!(post.is_draft());

		post.published_at = Some(now + Duration::hours(1));

		assert!(!post.is_published(now));
		assert!(!post.is_draft());

		post.published_at = Some(now);

		assert!(post.is_published(now));
	}

	#[test]
	fn test_form_validation() {
		let form = PostForm {
			title: String::new(),
			text: "body".into(),
		};

		let errors = form.validate().unwrap_err();

		assert!(errors.field_errors().contains_key("title"));
		assert!(!errors.field_errors().contains_key("text"));

		let form = PostForm {
			title: "x".repeat(201),
			text: String::new(),
		};

		let errors = form.validate().unwrap_err();

		assert_eq!(errors.field_errors().len(), 2);
	}

	#[test]
	fn test_blank_title_is_rejected() {
		let form = PostForm {
			title: "   ".into(),
			text: "body".into(),
		}
		.trimmed();

		assert!(form.title.is_empty());
		assert!(form.validate().is_err());
	}

	#[test]
	fn test_form_from_post() {
		let post = Post {
			title: "Hello".into(),
			text: "World".into(),
			..Default::default()
		};

		let form = PostForm::from(&post);

		assert_eq!(form.title, "Hello");
		assert_eq!(form.text, "World");
	}
}
