use axum::{
	body::Body,
	extract::{Request, State},
	http::{header, StatusCode},
	middleware::Next,
	response::{Html, IntoResponse, Redirect, Response},
};

use crate::{
	extract,
	store::{self, Database},
	template,
};

/// Describes how a route error is presented to the client.
///
/// The [`std::fmt::Display`] output of the error is only logged, [`ErrorShape::message`]
/// is what ends up on the error page.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	fn message(&self) -> String {
		self.to_string()
	}

	/// Sends the client elsewhere instead of rendering an error page.
	fn redirect(&self) -> Option<String> {
		None
	}
}

/// Error type returned by route handlers.
///
/// `E` is the error type of the route module, the other variants are shared
/// infrastructure failures that are never shown to the client in detail.
#[derive(Debug, thiserror::Error)]
pub enum RouteError<E> {
	#[error(transparent)]
	Route(E),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
	#[error("template error: {0}")]
	Template(#[from] askama::Error),
}

impl<E> From<E> for RouteError<E>
where
	E: ErrorShape,
{
	fn from(error: E) -> Self {
		Self::Route(error)
	}
}

impl<E> IntoResponse for RouteError<E>
where
	E: ErrorShape,
{
	fn into_response(self) -> Response {
		match self {
			Self::Route(error) => {
				if let Some(location) = error.redirect() {
					return Redirect::to(&location).into_response();
				}

				let status = error.status();

				if status.is_server_error() {
					tracing::error!(%error, "request failed");
				}

				error_page(status, error.message())
			}
			Self::Store(error) => {
				tracing::error!(%error, "store failure");
				error_page(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong.".into())
			}
			Self::Template(error) => {
				tracing::error!(%error, "template failure");
				error_page(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong.".into())
			}
		}
	}
}

/// Message of a rendered error page, kept so that the page can be rendered
/// again for a logged-in reader.
#[derive(Debug, Clone)]
struct ErrorMessage(String);

fn error_page_for(
	status: StatusCode,
	user: Option<String>,
	message: String,
) -> Result<String, template::ErrorPage> {
	let page = template::ErrorPage {
		user,
		status: status.as_u16(),
		reason: status.canonical_reason().unwrap_or("Error"),
		message,
	};

	template::render(&page).map(|html| html.0).map_err(|error| {
		tracing::error!(%error, "failed to render error page");
		page
	})
}

/// Renders the error page, falling back to plain text if that fails too.
///
/// The page is rendered for an anonymous reader. [`error_page_reader`] swaps
/// in the navigation of a logged-in one.
fn error_page(status: StatusCode, message: String) -> Response {
	let mut response = match error_page_for(status, None, message.clone()) {
		Ok(html) => (status, Html(html)).into_response(),
		Err(page) => (status, page.message).into_response(),
	};

	response.extensions_mut().insert(ErrorMessage(message));
	response
}

/// Renders error pages again for the reader behind the session cookie.
///
/// Only error responses cost a session lookup.
pub async fn error_page_reader(
	State(database): State<Database>,
	request: Request,
	next: Next,
) -> Response {
	let session_id = extract::session_id(request.headers());
	let response = next.run(request).await;

	let (Some(session_id), Some(ErrorMessage(message))) =
		(session_id, response.extensions().get::<ErrorMessage>().cloned())
	else {
		return response;
	};

	let username = match database.session_user(session_id).await {
		Ok(Some(user)) => user.username,
		Ok(None) => return response,
		Err(error) => {
			tracing::warn!(%error, "failed to resolve session for error page");
			return response;
		}
	};

	let Ok(html) = error_page_for(response.status(), Some(username), message) else {
		return response;
	};

	let (mut parts, _) = response.into_parts();
	parts.headers.remove(header::CONTENT_LENGTH);

	Response::from_parts(parts, Body::from(html))
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::test::*;

	#[derive(Debug, thiserror::Error)]
	enum Error {
		#[error("gone")]
		Gone,
		#[error("login")]
		Login,
	}

	impl ErrorShape for Error {
		fn status(&self) -> StatusCode {
			StatusCode::NOT_FOUND
		}

		fn redirect(&self) -> Option<String> {
			matches!(self, Self::Login).then(|| "/accounts/login".into())
		}
	}

	#[test]
	fn test_route_error_status() {
		let response = RouteError::from(Error::Gone).into_response();

		assert_eq!(response.status(), StatusCode::NOT_FOUND);
	}

	#[test]
	fn test_route_error_redirect() {
		let response = RouteError::from(Error::Login).into_response();

		assert_eq!(response.status(), StatusCode::SEE_OTHER);
		assert_eq!(response.headers()["location"], "/accounts/login");
	}

	#[test]
	fn test_store_error_is_internal() {
		let response =
			RouteError::<Error>::from(store::Error::Conflict("username")).into_response();

		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}

	#[tokio::test]
	async fn test_error_page_shows_reader() {
		let (server, _) = app();

		let response = server.get("/wp-admin").await;

		assert_eq!(response.status_code(), 404);
		assert!(response.text().contains("Log in"));

		login(&server, "ferris").await;

		let response = server.get(&format!("/post/{}", uuid::Uuid::new_v4())).await;

		assert_eq!(response.status_code(), 404);
		assert!(response.text().contains("Log out (ferris)"));
		assert!(!response.text().contains("Log in"));
		assert_eq!(response.header("content-type"), "text/html; charset=utf-8");
	}
}
