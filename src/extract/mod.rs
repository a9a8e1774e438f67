mod session;

pub use session::{session_id, Session};

use axum::{
	async_trait,
	extract::{
		rejection::{PathRejection, QueryRejection},
		FromRequestParts,
	},
	http::{request, StatusCode},
};
use serde::de;

use crate::error::{self, ErrorShape};

/// Failures of the extractors in this module.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("path error: {0}")]
	Path(#[from] PathRejection),
	#[error("query error: {0}")]
	Query(#[from] QueryRejection),
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
}

pub type RouteError = error::RouteError<Error>;

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			// A malformed id can never match a record
			Self::Path(..) => StatusCode::NOT_FOUND,
			Self::Query(..) | Self::Validation(..) => StatusCode::BAD_REQUEST,
		}
	}

	fn message(&self) -> String {
		match self {
			Self::Path(..) => "The requested page does not exist.".into(),
			Self::Query(..) | Self::Validation(..) => "The request contained invalid parameters.".into(),
		}
	}
}

/// Extractor that deserializes path parameters.
///
/// Unlike [`axum::extract::Path`], a parameter that fails to parse
/// results in the "not found" page.
///
/// ```rust
/// async fn route(Path(post_id): Path<Uuid>) {
///   // ...
/// }
/// ```
pub struct Path<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
	T: de::DeserializeOwned + Send,
	S: Send + Sync,
{
	type Rejection = RouteError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let result = axum::extract::Path::<T>::from_request_parts(parts, state)
			.await
			.map_err(Error::Path)?
			.0;

		Ok(Self(result))
	}
}

/// Extractor that deserializes a query string and validates it.
pub struct Query<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Query<T>
where
	T: de::DeserializeOwned + validator::Validate,
	S: Send + Sync,
{
	type Rejection = RouteError;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let result = axum::extract::Query::<T>::from_request_parts(parts, state)
			.await
			.map_err(Error::Query)?
			.0;

		result.validate().map_err(Error::Validation)?;
		Ok(Self(result))
	}
}
