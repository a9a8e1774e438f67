use axum::{http::StatusCode, response::Html, routing::get, Router};

use crate::{
	error::{self, ErrorShape},
	extract::Session,
	template::{self, AboutPage},
	AppState,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("no route matched")]
	NotFound,
}

pub type RouteError = error::RouteError<Error>;

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		StatusCode::NOT_FOUND
	}

	fn message(&self) -> String {
		"The requested page does not exist.".into()
	}
}

pub fn routes() -> Router<AppState> {
	Router::new().route("/about", get(about))
}

async fn about(session: Option<Session>) -> Result<Html<String>, RouteError> {
	Ok(template::render(&AboutPage {
		user: Session::username(session.as_ref()),
	})?)
}

pub async fn not_found() -> RouteError {
	Error::NotFound.into()
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_about() {
		let (server, _) = app();

		let response = server.get("/about").await;

		assert_eq!(response.status_code(), 200);
		assert!(response.text().contains("About"));
	}

	#[tokio::test]
	async fn test_trailing_slash() {
		let (server, _) = app();

		let response = server.get("/about/").await;

		assert_eq!(response.status_code(), 200);
		assert!(response.text().contains("<h2>About</h2>"));

		assert_eq!(server.get("/drafts/").await.status_code(), 303);

		login(&server, "ferris").await;

		let response = server.get("/drafts/").await;

		assert_eq!(response.status_code(), 200);
		assert!(response.text().contains("Drafts"));
	}

	#[tokio::test]
	async fn test_unknown_route() {
		let (server, _) = app();

		let response = server.get("/wp-admin").await;

		assert_eq!(response.status_code(), 404);
		assert!(response.text().contains("404 Not Found"));
	}
}
