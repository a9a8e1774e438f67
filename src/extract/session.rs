use axum::{
	async_trait,
	extract::{FromRef, FromRequestParts},
	http::{header, request, HeaderMap, Method},
};
use uuid::Uuid;

use crate::{
	route::auth::{self, model::User},
	session,
	store::Database,
};

/// Extracts the session and related user from the request.
///
/// Without a valid session cookie, the request is rejected with
/// [`auth::Error::LoginRequired`], which redirects to the login page.
/// Views that are public but adapt to the reader take `Option<Session>`.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub user: User,
}

impl Session {
	/// Name shown in the page navigation.
	pub fn username(session: Option<&Self>) -> Option<String> {
		session.map(|session| session.user.username.clone())
	}
}

/// Builds the login redirect for a rejected request.
///
/// Only GET requests are sent back to where they came from after logging in,
/// since every other protected route is the target of a form.
fn login_required(parts: &request::Parts) -> auth::Error {
	let next = (parts.method == Method::GET).then(|| {
		parts
			.uri
			.path_and_query()
			.map_or_else(|| parts.uri.path().to_owned(), ToString::to_string)
	});

	auth::Error::LoginRequired { next }
}

/// Reads the session id from the request cookies.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
	headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(cookie::Cookie::split_parse)
		.filter_map(Result::ok)
		.find(|cookie| cookie.name() == session::COOKIE_NAME)
		.and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = auth::RouteError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let Some(session_id) = session_id(&parts.headers) else {
			return Err(login_required(parts).into());
		};

		// Public pages take `Option<Session>`, which drops the rejection
		let database = Database::from_ref(state);
		let user = database.session_user(session_id).await.map_err(|error| {
			tracing::warn!(%error, session = %session_id, "failed to resolve session");
			error
		})?;

		let Some(user) = user else {
			return Err(login_required(parts).into());
		};

		Ok(Session {
			id: session_id,
			user,
		})
	}
}

#[cfg(test)]
mod test {
	use std::sync::{atomic::Ordering, Arc};

	use crate::test::*;

	#[tokio::test]
	async fn test_session_outage() {
		let outage = Arc::new(SessionOutage::default());
		let (server, _) = app_with_database(test_config(), outage.clone());

		login(&server, "ferris").await;

		assert!(server.get("/about").await.text().contains("Log out (ferris)"));

		outage.down.store(true, Ordering::SeqCst);

		// Public pages fall back to the anonymous view
		let response = server.get("/about").await;

		assert_eq!(response.status_code(), 200);
		assert!(response.text().contains("Log in"));

		// Protected pages fail instead of asking for a login
		let response = server.get("/drafts").await;

		assert_eq!(response.status_code(), 500);
		assert!(response.text().contains("Something went wrong."));
	}
}
