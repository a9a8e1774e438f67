use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Error, Result, Store};
use crate::route::{
	auth::model::{Session, User},
	comment::model::{Comment, CommentForm},
	post::model::{Post, PostForm, PostListing},
};

#[derive(Default)]
struct Tables {
	users: HashMap<Uuid, User>,
	sessions: HashMap<Uuid, Session>,
	// Kept in insertion order so that equal timestamps sort stably
	posts: Vec<Post>,
	comments: Vec<Comment>,
}

impl Tables {
	fn post_mut(&mut self, id: Uuid) -> Option<&mut Post> {
		self.posts.iter_mut().find(|post| post.id == id)
	}

	fn comment_mut(&mut self, id: Uuid) -> Option<&mut Comment> {
		self.comments.iter_mut().find(|comment| comment.id == id)
	}
}

/// A [`Store`] that keeps everything in process memory.
///
/// Data is lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
	tables: RwLock<Tables>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl Store for MemoryStore {
	async fn published_posts(
		&self,
		now: DateTime<Utc>,
		limit: i64,
		offset: i64,
	) -> Result<Vec<PostListing>> {
		let tables = self.tables.read().await;

		let mut posts = tables
			.posts
			.iter()
			.filter(|post| post.is_published(now))
			.collect::<Vec<_>>();

		posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));

		Ok(posts
			.into_iter()
			.skip(usize::try_from(offset).unwrap_or(0))
			.take(usize::try_from(limit).unwrap_or(0))
			.map(|post| PostListing {
				post: post.clone(),
				approved_comments: tables
					.comments
					.iter()
					.filter(|comment| comment.post_id == post.id && comment.approved)
					.count() as i64,
			})
			.collect())
	}

	async fn draft_posts(&self) -> Result<Vec<Post>> {
		let tables = self.tables.read().await;

		let mut posts = tables
			.posts
			.iter()
			.filter(|post| post.is_draft())
			.cloned()
			.collect::<Vec<_>>();

		posts.sort_by_key(|post| post.created_at);

		Ok(posts)
	}

	async fn post(&self, id: Uuid) -> Result<Option<Post>> {
		let tables = self.tables.read().await;

		Ok(tables.posts.iter().find(|post| post.id == id).cloned())
	}

	async fn create_post(&self, author_id: Uuid, form: &PostForm) -> Result<Post> {
		let post = Post {
			id: Uuid::new_v4(),
			author_id,
			title: form.title.clone(),
			text: form.text.clone(),
			created_at: Utc::now(),
			published_at: None,
		};

		self.tables.write().await.posts.push(post.clone());

		Ok(post)
	}

	async fn update_post(&self, id: Uuid, form: &PostForm) -> Result<Option<Post>> {
		let mut tables = self.tables.write().await;

		Ok(tables.post_mut(id).map(|post| {
			post.title.clone_from(&form.title);
			post.text.clone_from(&form.text);
			post.clone()
		}))
	}

	async fn delete_post(&self, id: Uuid) -> Result<bool> {
		let mut tables = self.tables.write().await;

		let Some(index) = tables.posts.iter().position(|post| post.id == id) else {
			return Ok(false);
		};

		tables.posts.remove(index);
		tables.comments.retain(|comment| comment.post_id != id);

		Ok(true)
	}

	async fn publish_post(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<Post>> {
		let mut tables = self.tables.write().await;

		Ok(tables.post_mut(id).map(|post| {
			post.published_at = Some(at);
			post.clone()
		}))
	}

	async fn comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
		let tables = self.tables.read().await;

		let mut comments = tables
			.comments
			.iter()
			.filter(|comment| comment.post_id == post_id)
			.cloned()
			.collect::<Vec<_>>();

		comments.sort_by_key(|comment| comment.created_at);

		Ok(comments)
	}

	async fn comment(&self, id: Uuid) -> Result<Option<Comment>> {
		let tables = self.tables.read().await;

		Ok(tables.comments.iter().find(|comment| comment.id == id).cloned())
	}

	async fn create_comment(&self, post_id: Uuid, form: &CommentForm) -> Result<Comment> {
		let comment = Comment {
			id: Uuid::new_v4(),
			post_id,
			author: form.author.clone(),
			text: form.text.clone(),
			created_at: Utc::now(),
			approved: false,
		};

		self.tables.write().await.comments.push(comment.clone());

		Ok(comment)
	}

	async fn approve_comment(&self, id: Uuid) -> Result<Option<Comment>> {
		let mut tables = self.tables.write().await;

		Ok(tables.comment_mut(id).map(|comment| {
			comment.approved = true;
			comment.clone()
		}))
	}

	async fn delete_comment(&self, id: Uuid) -> Result<Option<Comment>> {
		let mut tables = self.tables.write().await;
		let index = tables.comments.iter().position(|comment| comment.id == id);

		Ok(index.map(|index| tables.comments.remove(index)))
	}

	async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
		let tables = self.tables.read().await;

		Ok(tables
			.users
			.values()
			.find(|user| user.username == username)
			.cloned())
	}

	async fn create_user(&self, id: Uuid, username: &str, password: &[u8]) -> Result<User> {
		let mut tables = self.tables.write().await;

		if tables.users.values().any(|user| user.username == username) {
			return Err(Error::Conflict("username"));
		}

		let user = User {
			id,
			username: username.to_owned(),
			password: password.to_vec(),
			created_at: Utc::now(),
		};

		tables.users.insert(id, user.clone());

		Ok(user)
	}

	async fn create_session(&self, user_id: Uuid) -> Result<Session> {
		let session = Session {
			id: Uuid::new_v4(),
			user_id,
			created_at: Utc::now(),
		};

		self.tables
			.write()
			.await
			.sessions
			.insert(session.id, session.clone());

		Ok(session)
	}

	async fn session_user(&self, session_id: Uuid) -> Result<Option<User>> {
		let tables = self.tables.read().await;

		Ok(tables
			.sessions
			.get(&session_id)
			.and_then(|session| tables.users.get(&session.user_id))
			.cloned())
	}

	async fn delete_session(&self, session_id: Uuid) -> Result<()> {
		self.tables.write().await.sessions.remove(&session_id);

		Ok(())
	}
}

#[cfg(test)]
mod test {
	use chrono::Duration;

	use super::*;

	fn form(title: &str) -> PostForm {
		PostForm {
			title: title.into(),
			text: "text".into(),
		}
	}

	#[tokio::test]
	async fn test_published_posts_order_and_visibility() {
		let store = MemoryStore::new();
		let author = Uuid::new_v4();
		let now = Utc::now();

		let old = store.create_post(author, &form("old")).await.unwrap();
		let new = store.create_post(author, &form("new")).await.unwrap();
		let future = store.create_post(author, &form("future")).await.unwrap();
		store.create_post(author, &form("draft")).await.unwrap();

		store
			.publish_post(old.id, now - Duration::days(2))
			.await
			.unwrap();
		store
			.publish_post(new.id, now - Duration::days(1))
			.await
			.unwrap();
		store
			.publish_post(future.id, now + Duration::days(1))
			.await
			.unwrap();

		let posts = store.published_posts(now, 10, 0).await.unwrap();
		let titles = posts
			.iter()
			.map(|listing| listing.post.title.as_str())
			.collect::<Vec<_>>();

		assert_eq!(titles, ["new", "old"]);

		let page = store.published_posts(now, 1, 1).await.unwrap();

		assert_eq!(page.len(), 1);
		assert_eq!(page[0].post.id, old.id);
	}

	#[tokio::test]
	async fn test_drafts_oldest_first() {
		let store = MemoryStore::new();
		let author = Uuid::new_v4();

		let first = store.create_post(author, &form("first")).await.unwrap();
		let second = store.create_post(author, &form("second")).await.unwrap();
		let published = store.create_post(author, &form("published")).await.unwrap();

		store.publish_post(published.id, Utc::now()).await.unwrap();

		let drafts = store.draft_posts().await.unwrap();
		let ids = drafts.iter().map(|post| post.id).collect::<Vec<_>>();

		assert_eq!(ids, [first.id, second.id]);
	}

	#[tokio::test]
	async fn test_delete_post_cascades_to_comments() {
		let store = MemoryStore::new();
		let post = store
			.create_post(Uuid::new_v4(), &form("post"))
			.await
			.unwrap();

		let comment = store
			.create_comment(
				post.id,
				&CommentForm {
					author: "ferris".into(),
					text: "hi".into(),
				},
			)
			.await
			.unwrap();

		assert!(!comment.approved);
		assert!(store.delete_post(post.id).await.unwrap());
		assert!(store.comment(comment.id).await.unwrap().is_none());
		assert!(!store.delete_post(post.id).await.unwrap());
	}

	#[tokio::test]
	async fn test_approved_comment_count() {
		let store = MemoryStore::new();
		let post = store
			.create_post(Uuid::new_v4(), &form("post"))
			.await
			.unwrap();
		let now = Utc::now();

		store.publish_post(post.id, now).await.unwrap();

		let comment = CommentForm {
			author: "ferris".into(),
			text: "hi".into(),
		};
		let approved = store.create_comment(post.id, &comment).await.unwrap();
		store.create_comment(post.id, &comment).await.unwrap();
		store.approve_comment(approved.id).await.unwrap();

		let posts = store.published_posts(now, 10, 0).await.unwrap();

		assert_eq!(posts[0].approved_comments, 1);
	}

	#[tokio::test]
	async fn test_unique_usernames() {
		let store = MemoryStore::new();

		store
			.create_user(Uuid::new_v4(), "ferris", b"hash")
			.await
			.unwrap();

		let result = store.create_user(Uuid::new_v4(), "ferris", b"hash").await;

		assert!(matches!(result, Err(Error::Conflict("username"))));
	}

	#[tokio::test]
	async fn test_session_lookup() {
		let store = MemoryStore::new();
		let user = store
			.create_user(Uuid::new_v4(), "ferris", b"hash")
			.await
			.unwrap();
		let session = store.create_session(user.id).await.unwrap();

		let found = store.session_user(session.id).await.unwrap().unwrap();

		assert_eq!(found.id, user.id);

		store.delete_session(session.id).await.unwrap();

		assert!(store.session_user(session.id).await.unwrap().is_none());
	}
}
