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
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> Router<AppState> {
	use route::*;

	Router::new()
		.route("/", get(post_list))
		.route("/drafts", get(draft_list))
		.route("/post/new", get(post_new).post(post_create))
		.route("/post/:id", get(post_detail))
		.route("/post/:id/edit", get(post_edit).post(post_update))
		.route(
			"/post/:id/remove",
			get(post_confirm_delete).post(post_delete),
		)
		.route("/post/:id/publish", post(post_publish))
}

impl ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) => StatusCode::NOT_FOUND,
		}
	}

	fn message(&self) -> String {
		match self {
			Self::UnknownPost(..) => "No post matches the given query.".into(),
		}
	}
}
