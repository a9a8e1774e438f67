use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_username(username: &str) -> Result<(), ValidationError> {
	if username.chars().any(|c| !c.is_alphanumeric()) {
		let mut error = ValidationError::new("alphanumeric");
		error.message = Some("Username may only contain letters and digits.".into());

		return Err(error);
	}

	Ok(())
}

/// A single user, allowed to write posts and moderate comments.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
	/// The unique identifier of the user.
	pub id: Uuid,
	/// The username that is displayed to the public and used to log in.
	pub username: String,
	/// The Argon2 hash of the password, salted with `id`.
	#[serde(skip)]
	pub password: Vec<u8>,
	/// The creation time of the user.
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
	/// The session id, stored in the session cookie.
	pub id: Uuid,
	/// The user that owns the session.
	pub user_id: Uuid,
	#[allow(dead_code)]
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginInput {
	#[serde(default)]
	#[validate(length(min = 1, message = "This field is required."))]
	pub username: String,
	#[serde(default)]
	#[validate(length(min = 1, message = "This field is required."))]
	pub password: String,
	/// Where to go after logging in.
	#[serde(default)]
	pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterInput {
	#[serde(default)]
	#[validate(
		length(min = 3, max = 16, message = "Username must be between 3 and 16 characters."),
		custom(function = "validate_username")
	)]
	pub username: String,
	#[serde(default)]
	#[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters."))]
	pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct NextQuery {
	pub next: Option<String>,
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_register_username_rules() {
		let input = RegisterInput {
			username: "ferris!".into(),
			password: "hunter2hunter".into(),
		};

		assert!(input.validate().is_err());

		let input = RegisterInput {
			username: "ferris".into(),
			password: "hunter2hunter".into(),
		};

		assert!(input.validate().is_ok());
	}
}
