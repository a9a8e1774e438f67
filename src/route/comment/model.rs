use chrono::{DateTime, Utc};
use macros::model;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A comment left on a post.
///
/// Comments are hidden from anonymous readers until they are approved.
#[model]
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, sqlx::FromRow)]
pub struct Comment {
	/// The unique identifier of the comment.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The post the comment belongs to.
	#[serde(skip_deserializing)]
	pub post_id: Uuid,
	/// The display name given by the commenter.
	#[serde(default)]
	#[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters."))]
	pub author: String,
	/// The comment itself.
	#[serde(default)]
	#[validate(length(min = 1, message = "This field is required."))]
	pub text: String,
	/// The creation time of the comment.
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
	#[serde(skip_deserializing)]
	pub approved: bool,
}

impl CommentForm {
	pub fn trimmed(self) -> Self {
		Self {
			author: self.author.trim().to_owned(),
			text: self.text.trim().to_owned(),
		}
	}
}
