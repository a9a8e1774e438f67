use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Error, Result, Store};
use crate::route::{
	auth::model::{Session, User},
	comment::model::{Comment, CommentForm},
	post::model::{Post, PostForm, PostListing},
};

/// A [`Store`] backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStore {
	pool: sqlx::PgPool,
}

impl PgStore {
	/// Connects to the database and applies any pending migrations.
	pub async fn connect(url: &str) -> Result<Self> {
		let pool = sqlx::PgPool::connect(url).await?;

		sqlx::migrate!("./migrations").run(&pool).await?;
		tracing::info!("database migrations applied");

		Ok(Self { pool })
	}
}

#[async_trait]
impl Store for PgStore {
	async fn published_posts(
		&self,
		now: DateTime<Utc>,
		limit: i64,
		offset: i64,
	) -> Result<Vec<PostListing>> {
		let posts = sqlx::query_as::<_, PostListing>(
			r#"
				SELECT post.*, (
					SELECT COUNT(*) FROM comment
					WHERE comment.post_id = post.id AND comment.approved
				) AS approved_comments
				FROM post
				WHERE published_at <= $1
				ORDER BY published_at DESC
				LIMIT $2 OFFSET $3
			"#,
		)
		.bind(now)
		.bind(limit)
		.bind(offset)
		.fetch_all(&self.pool)
		.await?;

		Ok(posts)
	}

	async fn draft_posts(&self) -> Result<Vec<Post>> {
		let posts = sqlx::query_as::<_, Post>(
			r#"
				SELECT * FROM post
				WHERE published_at IS NULL
				ORDER BY created_at ASC
			"#,
		)
		.fetch_all(&self.pool)
		.await?;

		Ok(posts)
	}

	async fn post(&self, id: Uuid) -> Result<Option<Post>> {
		let post = sqlx::query_as::<_, Post>("SELECT * FROM post WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(post)
	}

	async fn create_post(&self, author_id: Uuid, form: &PostForm) -> Result<Post> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				INSERT INTO post (author_id, title, text)
				VALUES ($1, $2, $3)
				RETURNING *
			"#,
		)
		.bind(author_id)
		.bind(&form.title)
		.bind(&form.text)
		.fetch_one(&self.pool)
		.await?;

		Ok(post)
	}

	async fn update_post(&self, id: Uuid, form: &PostForm) -> Result<Option<Post>> {
		let post = sqlx::query_as::<_, Post>(
			r#"
				UPDATE post
				SET title = $1, text = $2
				WHERE id = $3
				RETURNING *
			"#,
		)
		.bind(&form.title)
		.bind(&form.text)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(post)
	}

	async fn delete_post(&self, id: Uuid) -> Result<bool> {
		let result = sqlx::query("DELETE FROM post WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?;

		Ok(result.rows_affected() > 0)
	}

	async fn publish_post(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<Post>> {
		let post = sqlx::query_as::<_, Post>(
			"UPDATE post SET published_at = $1 WHERE id = $2 RETURNING *",
		)
		.bind(at)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(post)
	}

	async fn comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
		let comments = sqlx::query_as::<_, Comment>(
			r#"
				SELECT * FROM comment
				WHERE post_id = $1
				ORDER BY created_at ASC
			"#,
		)
		.bind(post_id)
		.fetch_all(&self.pool)
		.await?;

		Ok(comments)
	}

	async fn comment(&self, id: Uuid) -> Result<Option<Comment>> {
		let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comment WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.pool)
			.await?;

		Ok(comment)
	}

	async fn create_comment(&self, post_id: Uuid, form: &CommentForm) -> Result<Comment> {
		let comment = sqlx::query_as::<_, Comment>(
			r#"
				INSERT INTO comment (post_id, author, text)
				VALUES ($1, $2, $3)
				RETURNING *
			"#,
		)
		.bind(post_id)
		.bind(&form.author)
		.bind(&form.text)
		.fetch_one(&self.pool)
		.await?;

		Ok(comment)
	}

	async fn approve_comment(&self, id: Uuid) -> Result<Option<Comment>> {
		let comment = sqlx::query_as::<_, Comment>(
			"UPDATE comment SET approved = TRUE WHERE id = $1 RETURNING *",
		)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(comment)
	}

	async fn delete_comment(&self, id: Uuid) -> Result<Option<Comment>> {
		let comment =
			sqlx::query_as::<_, Comment>("DELETE FROM comment WHERE id = $1 RETURNING *")
				.bind(id)
				.fetch_optional(&self.pool)
				.await?;

		Ok(comment)
	}

	async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
		let user = sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE username = $1"#)
			.bind(username)
			.fetch_optional(&self.pool)
			.await?;

		Ok(user)
	}

	async fn create_user(&self, id: Uuid, username: &str, password: &[u8]) -> Result<User> {
		sqlx::query_as::<_, User>(
			r#"
				INSERT INTO "user" (id, username, password) VALUES ($1, $2, $3)
				RETURNING *
			"#,
		)
		.bind(id)
		.bind(username)
		.bind(password)
		.fetch_one(&self.pool)
		.await
		.map_err(|e| match e {
			sqlx::Error::Database(ref d) if d.constraint() == Some("user_username_key") => {
				Error::Conflict("username")
			}
			e => Error::from(e),
		})
	}

	async fn create_session(&self, user_id: Uuid) -> Result<Session> {
		let session = sqlx::query_as::<_, Session>(
			"INSERT INTO session (user_id) VALUES ($1) RETURNING *",
		)
		.bind(user_id)
		.fetch_one(&self.pool)
		.await?;

		Ok(session)
	}

	async fn session_user(&self, session_id: Uuid) -> Result<Option<User>> {
		let user = sqlx::query_as::<_, User>(
			r#"
				SELECT * FROM "user" WHERE id = (
					SELECT user_id FROM session WHERE id = $1
				)
			"#,
		)
		.bind(session_id)
		.fetch_optional(&self.pool)
		.await?;

		Ok(user)
	}

	async fn delete_session(&self, session_id: Uuid) -> Result<()> {
		sqlx::query("DELETE FROM session WHERE id = $1")
			.bind(session_id)
			.execute(&self.pool)
			.await?;

		Ok(())
	}
}
