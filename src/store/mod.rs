//! Persistence for posts, comments, users and sessions.
//!
//! Routes only talk to the [`Store`] trait. [`PgStore`] is used in production,
//! [`MemoryStore`] when no database is configured and in tests.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::route::{
	auth::model::{Session, User},
	comment::model::{Comment, CommentForm},
	post::model::{Post, PostForm, PostListing},
};

/// A shared handle to the configured store.
pub type Database = Arc<dyn Store>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
	#[error("unique constraint violated: {0}")]
	Conflict(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[async_trait]
pub trait Store: Send + Sync {
	/// Posts published at or before `now`, most recently published first.
	async fn published_posts(
		&self,
		now: DateTime<Utc>,
		limit: i64,
		offset: i64,
	) -> Result<Vec<PostListing>>;

	/// Posts without a publication time, oldest first.
	async fn draft_posts(&self) -> Result<Vec<Post>>;

	async fn post(&self, id: Uuid) -> Result<Option<Post>>;

	/// Creates an unpublished post.
	async fn create_post(&self, author_id: Uuid, form: &PostForm) -> Result<Post>;

	async fn update_post(&self, id: Uuid, form: &PostForm) -> Result<Option<Post>>;

	/// Deletes a post and its comments, returning whether it existed.
	async fn delete_post(&self, id: Uuid) -> Result<bool>;

	async fn publish_post(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<Post>>;

	/// All comments on a post, oldest first.
	async fn comments(&self, post_id: Uuid) -> Result<Vec<Comment>>;

	async fn comment(&self, id: Uuid) -> Result<Option<Comment>>;

	/// Creates an unapproved comment on an existing post.
	async fn create_comment(&self, post_id: Uuid, form: &CommentForm) -> Result<Comment>;

	async fn approve_comment(&self, id: Uuid) -> Result<Option<Comment>>;

	/// Deletes a comment, returning it if it existed.
	async fn delete_comment(&self, id: Uuid) -> Result<Option<Comment>>;

	async fn user_by_username(&self, username: &str) -> Result<Option<User>>;

	/// Inserts a user, failing with [`Error::Conflict`] if the username is taken.
	async fn create_user(&self, id: Uuid, username: &str, password: &[u8]) -> Result<User>;

	async fn create_session(&self, user_id: Uuid) -> Result<Session>;

	async fn session_user(&self, session_id: Uuid) -> Result<Option<User>>;

	async fn delete_session(&self, session_id: Uuid) -> Result<()>;
}
