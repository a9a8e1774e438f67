use axum::{
	extract::State,
	response::{Html, IntoResponse, Redirect, Response},
	Form,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
	extract::{Path, Query, Session},
	form::FormErrors,
	route::model::Paginate,
	store::Database,
	template::{self, DraftListPage, PostConfirmDeletePage, PostDetailPage, PostFormPage, PostListPage},
};

use super::{model, Error, RouteError};

fn detail_url(post_id: Uuid) -> String {
	format!("/post/{post_id}")
}

/// Post list
/// Published posts, most recently published first.
pub async fn post_list(
	State(database): State<Database>,
	session: Option<Session>,
	Query(paginate): Query<Paginate>,
) -> Result<Html<String>, RouteError> {
	// One extra row tells whether there is a next page
	let mut posts = database
		.published_posts(Utc::now(), paginate.limit() + 1, paginate.offset())
		.await?;

	let has_next = posts.len() as i64 > paginate.limit();
	posts.truncate(paginate.size as usize);

	Ok(template::render(&PostListPage {
		user: Session::username(session.as_ref()),
		posts,
		page: paginate.page,
		size: paginate.size,
		has_next,
	})?)
}

/// Post detail
/// A single post with its comments. Unpublished posts and unapproved
/// comments are only shown to authors.
pub async fn post_detail(
	State(database): State<Database>,
	session: Option<Session>,
	Path(post_id): Path<Uuid>,
) -> Result<Html<String>, RouteError> {
	let post = database
		.post(post_id)
		.await?
		.ok_or(Error::UnknownPost(post_id))?;

	if session.is_none() && !post.is_published(Utc::now()) {
		return Err(Error::UnknownPost(post_id).into());
	}

	let mut comments = database.comments(post.id).await?;

	if session.is_none() {
		comments.retain(|comment| comment.approved);
	}

	Ok(template::render(&PostDetailPage {
		user: Session::username(session.as_ref()),
		post,
		comments,
	})?)
}

/// New post
/// Shows an empty post form.
pub async fn post_new(session: Session) -> Result<Html<String>, RouteError> {
	Ok(template::render(&PostFormPage {
		user: Some(session.user.username),
		heading: "New post",
		action: "/post/new".into(),
		form: model::PostForm::default(),
		errors: FormErrors::new(),
	})?)
}

/// Create post
/// Saves a new draft written by the logged in user.
pub async fn post_create(
	State(database): State<Database>,
	session: Session,
	Form(form): Form<model::PostForm>,
) -> Result<Response, RouteError> {
	let form = form.trimmed();

	if let Err(errors) = form.validate() {
		return Ok(template::render(&PostFormPage {
			user: Some(session.user.username),
			heading: "New post",
			action: "/post/new".into(),
			form,
			errors: errors.into(),
		})?
		.into_response());
	}

	let post = database.create_post(session.user.id, &form).await?;

	tracing::info!(post = %post.id, author = %session.user.id, "created post");

	Ok(Redirect::to(&detail_url(post.id)).into_response())
}

/// Edit post
/// Shows the post form, filled in with the current post.
pub async fn post_edit(
	State(database): State<Database>,
	session: Session,
	Path(post_id): Path<Uuid>,
) -> Result<Html<String>, RouteError> {
	let post = database
		.post(post_id)
		.await?
		.ok_or(Error::UnknownPost(post_id))?;

	Ok(template::render(&PostFormPage {
		user: Some(session.user.username),
		heading: "Edit post",
		action: format!("/post/{post_id}/edit"),
		form: model::PostForm::from(&post),
		errors: FormErrors::new(),
	})?)
}

/// Update post
/// Replaces the title and text of a post.
pub async fn post_update(
	State(database): State<Database>,
	session: Session,
	Path(post_id): Path<Uuid>,
	Form(form): Form<model::PostForm>,
) -> Result<Response, RouteError> {
	let form = form.trimmed();

	if let Err(errors) = form.validate() {
		return Ok(template::render(&PostFormPage {
			user: Some(session.user.username),
			heading: "Edit post",
			action: format!("/post/{post_id}/edit"),
			form,
			errors: errors.into(),
		})?
		.into_response());
	}

	let post = database
		.update_post(post_id, &form)
		.await?
		.ok_or(Error::UnknownPost(post_id))?;

	tracing::info!(post = %post.id, editor = %session.user.id, "updated post");

	Ok(Redirect::to(&detail_url(post.id)).into_response())
}

/// Confirm post deletion
/// Asks before deleting a post.
pub async fn post_confirm_delete(
	State(database): State<Database>,
	session: Session,
	Path(post_id): Path<Uuid>,
) -> Result<Html<String>, RouteError> {
	let post = database
		.post(post_id)
		.await?
		.ok_or(Error::UnknownPost(post_id))?;

	Ok(template::render(&PostConfirmDeletePage {
		user: Some(session.user.username),
		post,
	})?)
}

/// Delete post
/// Deletes a post together with its comments.
pub async fn post_delete(
	State(database): State<Database>,
	session: Session,
	Path(post_id): Path<Uuid>,
) -> Result<Redirect, RouteError> {
	if !database.delete_post(post_id).await? {
		return Err(Error::UnknownPost(post_id).into());
	}

	tracing::info!(post = %post_id, user = %session.user.id, "deleted post");

	Ok(Redirect::to("/"))
}

/// Draft list
/// Unpublished posts, oldest first.
pub async fn draft_list(
	State(database): State<Database>,
	session: Session,
) -> Result<Html<String>, RouteError> {
	let posts = database.draft_posts().await?;

	Ok(template::render(&DraftListPage {
		user: Some(session.user.username),
		posts,
	})?)
}

/// Publish post
/// Makes a post public as of now.
pub async fn post_publish(
	State(database): State<Database>,
	session: Session,
	Path(post_id): Path<Uuid>,
) -> Result<Redirect, RouteError> {
	let post = database
		.publish_post(post_id, Utc::now())
		.await?
		.ok_or(Error::UnknownPost(post_id))?;

	tracing::info!(post = %post.id, user = %session.user.id, "published post");

	Ok(Redirect::to(&detail_url(post.id)))
}
