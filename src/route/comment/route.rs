use axum::{
	extract::State,
	response::{Html, IntoResponse, Redirect, Response},
	Form,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
	extract::{Path, Session},
	form::FormErrors,
	route::post::model::Post,
	store::Database,
	template::{self, CommentFormPage},
};

use super::{model, Error, RouteError};

/// Looks up a post the reader is allowed to comment on.
async fn visible_post(
	database: &Database,
	session: Option<&Session>,
	post_id: Uuid,
) -> Result<Post, RouteError> {
	let post = database
		.post(post_id)
		.await?
		.filter(|post| session.is_some() || post.is_published(Utc::now()))
		.ok_or(Error::UnknownPost(post_id))?;

	Ok(post)
}

/// Comment form
/// Shows an empty comment form for a post.
pub async fn comment_form(
	State(database): State<Database>,
	session: Option<Session>,
	Path(post_id): Path<Uuid>,
) -> Result<Html<String>, RouteError> {
	let post = visible_post(&database, session.as_ref(), post_id).await?;

	Ok(template::render(&CommentFormPage {
		user: Session::username(session.as_ref()),
		post,
		form: model::CommentForm::default(),
		errors: FormErrors::new(),
	})?)
}

/// Add comment
/// Attaches a comment to a post. It stays hidden until approved.
pub async fn add_comment_to_post(
	State(database): State<Database>,
	session: Option<Session>,
	Path(post_id): Path<Uuid>,
	Form(form): Form<model::CommentForm>,
) -> Result<Response, RouteError> {
	let post = visible_post(&database, session.as_ref(), post_id).await?;
	let form = form.trimmed();

	if let Err(errors) = form.validate() {
		return Ok(template::render(&CommentFormPage {
			user: Session::username(session.as_ref()),
			post,
			form,
			errors: errors.into(),
		})?
		.into_response());
	}

	let comment = database.create_comment(post.id, &form).await?;

	tracing::info!(post = %post.id, comment = %comment.id, "comment submitted");

	Ok(Redirect::to(&format!("/post/{}", post.id)).into_response())
}

/// Approve comment
/// Makes a comment visible to everyone.
pub async fn comment_approve(
	State(database): State<Database>,
	session: Session,
	Path(comment_id): Path<Uuid>,
) -> Result<Redirect, RouteError> {
	let comment = database
		.approve_comment(comment_id)
		.await?
		.ok_or(Error::UnknownComment(comment_id))?;

	tracing::info!(comment = %comment.id, user = %session.user.id, "approved comment");

	Ok(Redirect::to(&format!("/post/{}", comment.post_id)))
}

/// Remove comment
/// Deletes a comment and returns to its post.
pub async fn comment_remove(
	State(database): State<Database>,
	session: Session,
	Path(comment_id): Path<Uuid>,
) -> Result<Redirect, RouteError> {
	let comment = database
		.delete_comment(comment_id)
		.await?
		.ok_or(Error::UnknownComment(comment_id))?;

	tracing::info!(comment = %comment.id, user = %session.user.id, "removed comment");

	Ok(Redirect::to(&format!("/post/{}", comment.post_id)))
}
