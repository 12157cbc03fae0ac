use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{sort_newest_first, NewPost, Post, PostFilter, PostId, PostRepository, StoreError};
use crate::lifecycle::LifecycleState;

/// On-disk layout of the JSON store
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    next_id: PostId,
    posts: Vec<Post>,
}

impl Document {
    fn post_mut(&mut self, id: PostId) -> Result<&mut Post, StoreError> {
        self.posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or(StoreError::NotFound { id })
    }
}

/// JSON-file store shared between processes.
///
/// Every operation holds an exclusive `fd-lock` on the file for its whole
/// read-modify-write cycle, so concurrent CLI invocations serialize and the
/// compare-and-set in `transition` stays meaningful across processes.
#[derive(Debug, Clone)]
pub struct FilePostRepository {
    path: PathBuf,
}

impl FilePostRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn with_document<T, F>(&self, persist: bool, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Document) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || locked_cycle(&path, persist, f))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }
}

fn open_store(path: &Path) -> Result<File, StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    Ok(file)
}

fn locked_cycle<T, F>(path: &Path, persist: bool, f: F) -> Result<T, StoreError>
where
    F: FnOnce(&mut Document) -> Result<T, StoreError>,
{
    let mut lock = fd_lock::RwLock::new(open_store(path)?);
    let mut guard = lock.write()?;

    let mut raw = String::new();
    guard.read_to_string(&mut raw)?;
    let mut document: Document = if raw.trim().is_empty() {
        Document::default()
    } else {
        serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            reason: format!("{}: {e}", path.display()),
        })?
    };

    let result = f(&mut document)?;

    if persist {
        let serialized = serde_json::to_vec_pretty(&document)?;
        guard.set_len(0)?;
        guard.seek(SeekFrom::Start(0))?;
        guard.write_all(&serialized)?;
        guard.sync_all()?;
        debug!(path = %path.display(), posts = document.posts.len(), "Post store written");
    }

    Ok(result)
}

#[async_trait]
impl PostRepository for FilePostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, StoreError> {
        self.with_document(true, move |document| {
            document.next_id += 1;
            let now = Utc::now();
            let post = Post {
                id: document.next_id,
                title: post.title().to_string(),
                content: post.content().to_string(),
                state: LifecycleState::Created,
                created_at: now,
                updated_at: now,
            };
            document.posts.push(post.clone());
            Ok(post)
        })
        .await
    }

    async fn find(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        self.with_document(false, move |document| {
            Ok(document.posts.iter().find(|post| post.id == id).cloned())
        })
        .await
    }

    async fn update_content(&self, id: PostId, post: NewPost) -> Result<Post, StoreError> {
        self.with_document(true, move |document| {
            let stored = document.post_mut(id)?;
            stored.title = post.title().to_string();
            stored.content = post.content().to_string();
            stored.updated_at = Utc::now();
            Ok(stored.clone())
        })
        .await
    }

    async fn transition(
        &self,
        id: PostId,
        expected: LifecycleState,
        next: LifecycleState,
    ) -> Result<Post, StoreError> {
        self.with_document(true, move |document| {
            let stored = document.post_mut(id)?;
            if stored.state != expected {
                return Err(StoreError::Conflict {
                    id,
                    expected,
                    actual: stored.state,
                });
            }
            stored.state = next;
            stored.updated_at = Utc::now();
            Ok(stored.clone())
        })
        .await
    }

    async fn list(&self, filter: PostFilter) -> Result<Vec<Post>, StoreError> {
        self.with_document(false, move |document| {
            let mut posts: Vec<Post> = document
                .posts
                .iter()
                .filter(|post| filter.matches(post.state))
                .cloned()
                .collect();
            sort_newest_first(&mut posts);
            Ok(posts)
        })
        .await
    }
}
