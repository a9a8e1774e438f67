use argon2::Argon2;
use axum::{
	extract::State,
	http::header,
	response::{Html, IntoResponse, Redirect, Response},
	Form,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
	extract::{Query, Session},
	form::FormErrors,
	session, store,
	template::{self, LoginPage, RegisterPage},
	AppState,
};

use super::{model, model::User, safe_next, Error, RouteError};

pub const KEY_LENGTH: usize = 32;

const INVALID_LOGIN: &str = "Please enter a correct username and password.";

/// Hashes a password with Argon2, using the user's id as a salt.
/// Since this is only used for logging in and creating a new password,
/// the scope of this function can remain in here with no issues.
pub fn hash_password(
	hasher: &Argon2,
	password: &str,
	id: &Uuid,
) -> Result<[u8; KEY_LENGTH], argon2::Error> {
	let mut hash = [0; KEY_LENGTH];

	hasher.hash_password_into(password.as_bytes(), id.as_bytes(), &mut hash)?;
	Ok(hash)
}

/// Checks `password` against the stored hash of `user`.
///
/// Without a user the password is still hashed against a fixed salt, so
/// unknown usernames take as long to reject as wrong passwords.
fn verify_password(
	hasher: &Argon2,
	user: Option<&User>,
	password: &str,
) -> Result<bool, argon2::Error> {
	let salt = user.map_or(Uuid::nil(), |user| user.id);
	let hashed = hash_password(hasher, password, &salt)?;

	Ok(user.is_some_and(|user| user.password == hashed))
}

/// Starts a session for the user and sends them on.
async fn start_session(
	state: &AppState,
	user_id: Uuid,
	location: &str,
) -> Result<Response, RouteError> {
	let session = state.database.create_session(user_id).await?;
	let cookie = session::create_cookie(session.id, state.config.secure_cookies);

	tracing::info!(user = %user_id, "logged in");

	Ok((
		[(header::SET_COOKIE, cookie.to_string())],
		Redirect::to(location),
	)
		.into_response())
}

/// Login form
pub async fn login_form(
	session: Option<Session>,
	Query(query): Query<model::NextQuery>,
) -> Result<Html<String>, RouteError> {
	Ok(template::render(&LoginPage {
		user: Session::username(session.as_ref()),
		username: String::new(),
		next: query.next.unwrap_or_default(),
		errors: FormErrors::new(),
	})?)
}

/// Log in
/// Checks the credentials and starts a new session.
pub async fn login(
	State(state): State<AppState>,
	Form(input): Form<model::LoginInput>,
) -> Result<Response, RouteError> {
	let rejected = |input: model::LoginInput, errors: FormErrors| -> Result<Response, RouteError> {
		Ok(template::render(&LoginPage {
			user: None,
			username: input.username,
			next: input.next.unwrap_or_default(),
			errors,
		})?
		.into_response())
	};

	if let Err(errors) = input.validate() {
		return rejected(input, errors.into());
	}

	let user = state.database.user_by_username(&input.username).await?;
	let verified =
		verify_password(&state.hasher, user.as_ref(), &input.password).map_err(Error::Argon)?;

	let Some(user) = user.filter(|_| verified) else {
		tracing::info!(username = %input.username, "rejected login");
		return rejected(input, FormErrors::general(INVALID_LOGIN));
	};

	start_session(&state, user.id, safe_next(input.next.as_deref())).await
}

/// Log out
/// Ends the current session, if there is one.
pub async fn logout(
	State(state): State<AppState>,
	session: Option<Session>,
) -> Result<impl IntoResponse, RouteError> {
	if let Some(session) = session {
		state.database.delete_session(session.id).await?;
		tracing::info!(user = %session.user.id, "logged out");
	}

	// Clear the session cookie
	Ok((
		[(
			header::SET_COOKIE,
			session::clear_cookie(state.config.secure_cookies).to_string(),
		)],
		Redirect::to("/"),
	))
}

/// Registration form
pub async fn register_form(
	State(state): State<AppState>,
	session: Option<Session>,
) -> Result<Html<String>, RouteError> {
	if !state.config.allow_registration {
		return Err(Error::RegistrationDisabled.into());
	}

	Ok(template::render(&RegisterPage {
		user: Session::username(session.as_ref()),
		username: String::new(),
		errors: FormErrors::new(),
	})?)
}

/// Register account
/// Creates an author account and logs it in.
pub async fn register(
	State(state): State<AppState>,
	Form(input): Form<model::RegisterInput>,
) -> Result<Response, RouteError> {
	if !state.config.allow_registration {
		return Err(Error::RegistrationDisabled.into());
	}

	let rejected = |input: model::RegisterInput, errors: FormErrors| -> Result<Response, RouteError> {
		Ok(template::render(&RegisterPage {
			user: None,
			username: input.username,
			errors,
		})?
		.into_response())
	};

	if let Err(errors) = input.validate() {
		return rejected(input, errors.into());
	}

	let user_id = Uuid::new_v4();
	let hashed = hash_password(&state.hasher, &input.password, &user_id).map_err(Error::Argon)?;

	let user = match state
		.database
		.create_user(user_id, &input.username, &hashed)
		.await
	{
		Ok(user) => user,
		Err(store::Error::Conflict(..)) => {
			let mut errors = FormErrors::new();
			errors.add("username", "This username is already taken.");

			return rejected(input, errors);
		}
		Err(error) => return Err(error.into()),
	};

	tracing::info!(user = %user.id, username = %user.username, "registered user");

	start_session(&state, user.id, "/").await
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_hash_password_depends_on_salt() {
		let hasher = Argon2::default();
		let id = Uuid::new_v4();

		let first = hash_password(&hasher, "hunter2hunter", &id).unwrap();
		let second = hash_password(&hasher, "hunter2hunter", &id).unwrap();
		let other = hash_password(&hasher, "hunter2hunter", &Uuid::new_v4()).unwrap();

		assert_eq!(first, second);
		assert_ne!(first, other);
	}

	#[test]
	fn test_verify_password() {
		let hasher = Argon2::default();
		let id = Uuid::new_v4();
		let user = User {
			id,
			username: "ferris".into(),
			password: hash_password(&hasher, "hunter2hunter", &id).unwrap().to_vec(),
			created_at: chrono::Utc::now(),
		};

		assert!(verify_password(&hasher, Some(&user), "hunter2hunter").unwrap());
		assert!(!verify_password(&hasher, Some(&user), "wrong password").unwrap());
		assert!(!verify_password(&hasher, None, "hunter2hunter").unwrap());
	}
}
