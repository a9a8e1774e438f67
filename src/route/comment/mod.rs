use axum::{
	http::StatusCode,
	routing::{get, post},
	Router,
};
use uuid::Uuid;

use crate::{
	error::{self, ErrorShape},
	AppState,
};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unknown post {0}")]
	UnknownPost(Uuid),
	#[error("unknown comment {0}")]
	UnknownComment(Uuid),
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> Router<AppState> {
	use route::*;

	Router::new()
		.route(
			"/post/:id/comment",
			get(comment_form).post(add_comment_to_post),
		)
		.route("/comment/:id/approve", post(comment_approve))
		.route("/comment/:id/remove", post(comment_remove))
}

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::UnknownComment(..) => StatusCode::NOT_FOUND,
		}
	}

	fn message(&self) -> String {
		match self {
			Self::UnknownPost(..) => "No post matches the given query.".into(),
			Self::UnknownComment(..) => "No comment matches the given query.".into(),
		}
	}
}
