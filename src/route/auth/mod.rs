use axum::{
	http::StatusCode,
	routing::{get, post},
	Router,
};

use crate::{
	error::{self, ErrorShape},
	AppState,
};

pub mod model;
pub mod route;

pub const LOGIN_URL: &str = "/accounts/login";

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("login required")]
	LoginRequired { next: Option<String> },
	#[error("password hashing error")]
	Argon(#[from] argon2::Error),
	#[error("registration is disabled")]
	RegistrationDisabled,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> Router<AppState> {
	use route::*;

	Router::new()
		.route("/login", get(login_form).post(login))
		.route("/logout", post(logout))
		.route("/register", get(register_form).post(register))
}

/// The login page, remembering where to return to.
pub fn login_url(next: Option<&str>) -> String {
	match next.map(|next| serde_urlencoded::to_string([("next", next)])) {
		Some(Ok(query)) => format!("{LOGIN_URL}?{query}"),
		_ => LOGIN_URL.into(),
	}
}

/// Returns `next` if it points into this site, otherwise the front page.
///
/// The result ends up in a `Location` header, so it must be printable ASCII.
pub fn safe_next(next: Option<&str>) -> &str {
	match next {
		Some(next)
			if next.starts_with('/')
				&& !next.starts_with("//")
				&& next.bytes().all(|b| b.is_ascii_graphic() && b != b'\\') =>
		{
			next
		}
		_ => "/",
	}
}

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::LoginRequired { .. } => StatusCode::UNAUTHORIZED,
			Self::Argon(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::RegistrationDisabled => StatusCode::NOT_FOUND,
		}
	}

	fn message(&self) -> String {
		match self {
			Self::LoginRequired { .. } => "You need to log in first.".into(),
			Self::Argon(..) => "Something went wrong.".into(),
			Self::RegistrationDisabled => "The requested page does not exist.".into(),
		}
	}

	fn redirect(&self) -> Option<String> {
		match self {
			Self::LoginRequired { next } => Some(login_url(next.as_deref())),
			_ => None,
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::test::*;

	#[test]
	fn test_safe_next() {
		assert_eq!(safe_next(Some("/drafts")), "/drafts");
		assert_eq!(safe_next(Some("//evil.example")), "/");
		assert_eq!(safe_next(Some("https://evil.example")), "/");
		assert_eq!(safe_next(Some("/\\evil.example")), "/");
		assert_eq!(safe_next(Some("/drafts\r\nX-Injected: 1")), "/");
		assert_eq!(safe_next(Some("/post/caf\u{e9}")), "/");
		assert_eq!(safe_next(Some("/drafts?page=2&size=5")), "/drafts?page=2&size=5");
		assert_eq!(safe_next(None), "/");
	}

	#[test]
	fn test_login_url() {
		assert_eq!(login_url(None), "/accounts/login");
		assert_eq!(
			login_url(Some("/drafts?page=2")),
			"/accounts/login?next=%2Fdrafts%3Fpage%3D2"
		);
	}

	#[tokio::test]
	async fn test_login_flow() {
		let (server, _) = app();

		login(&server, "ferris").await;
		server.post("/accounts/logout").await;

		let response = server.get("/drafts").await;

		assert_eq!(response.status_code(), 303);

		let response = server
			.post("/accounts/login")
			.form(&[
				("username", "ferris"),
				("password", PASSWORD),
				("next", "/drafts"),
			])
			.await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/drafts");
		assert!(response
			.header("set-cookie")
			.to_str()
			.unwrap()
			.contains("session="));

		assert_eq!(server.get("/drafts").await.status_code(), 200);
	}

	#[tokio::test]
	async fn test_login_ignores_malformed_next() {
		let (server, database) = app();

		login(&server, "ferris").await;
		server.post("/accounts/logout").await;

		let response = server
			.post("/accounts/login")
			.form(&[
				("username", "ferris"),
				("password", PASSWORD),
				("next", "/drafts\r\nX-Injected: 1"),
			])
			.await;

		assert_eq!(response.status_code(), 303);
		assert_eq!(response.header("location"), "/");
		assert!(response.headers().get("x-injected").is_none());

		let user = database.user_by_username("ferris").await.unwrap().unwrap();
		let session = server.get("/drafts").await;

		assert_eq!(session.status_code(), 200);
		assert!(session.text().contains(&user.username));
	}

	#[tokio::test]
	async fn test_wrong_password() {
		let (server, _) = app();

		login(&server, "ferris").await;
		server.post("/accounts/logout").await;

		let response = server
			.post("/accounts/login")
			.form(&[("username", "ferris"), ("password", "wrong password")])
			.await;

		assert_eq!(response.status_code(), 200);
		assert!(response
			.text()
			.contains("Please enter a correct username and password."));

		let response = server
			.post("/accounts/login")
			.form(&[("username", "nobody"), ("password", PASSWORD)])
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(server.get("/drafts").await.status_code(), 303);
	}

	#[tokio::test]
	async fn test_username_taken() {
		let (server, _) = app();

		login(&server, "ferris").await;
		server.post("/accounts/logout").await;

		let response = server
			.post("/accounts/register")
			.form(&[("username", "ferris"), ("password", PASSWORD)])
			.await;

		assert_eq!(response.status_code(), 200);
		assert!(response.text().contains("This username is already taken."));
	}

	#[tokio::test]
	async fn test_registration_disabled() {
		let (server, _) = app_with_config(crate::config::Config {
			allow_registration: false,
			..test_config()
		});

		assert_eq!(server.get("/accounts/register").await.status_code(), 404);

		let response = server
			.post("/accounts/register")
			.form(&[("username", "ferris"), ("password", PASSWORD)])
			.await;

		assert_eq!(response.status_code(), 404);
	}
}
