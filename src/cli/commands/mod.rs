use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

use crate::config::{PostgateConfig, StorageBackend, StorageConfig};
use crate::moderation::{ModerationOrchestrator, OpenAiTransport};
use crate::service::PostService;
use crate::store::{FilePostRepository, InMemoryPostRepository, Post, PostRepository};

pub mod init_config;
pub mod posts;
pub mod transition;

pub type CliService = PostService<Box<dyn PostRepository>>;

/// Open the record store selected by the configuration
pub async fn open_repository(storage: &StorageConfig) -> Result<Box<dyn PostRepository>> {
    debug!(backend = ?storage.backend, path = %storage.path, "Opening post store");
    match storage.backend {
        StorageBackend::Memory => Ok(Box::new(InMemoryPostRepository::new())),
        StorageBackend::File => Ok(Box::new(FilePostRepository::new(&storage.path))),
        StorageBackend::Sqlite => open_sqlite(storage).await,
    }
}

#[cfg(feature = "database")]
async fn open_sqlite(storage: &StorageConfig) -> Result<Box<dyn PostRepository>> {
    use crate::store::SqlitePostRepository;

    let url = if storage.path.starts_with("sqlite:") {
        storage.path.clone()
    } else {
        if let Some(parent) = std::path::Path::new(&storage.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        format!("sqlite://{}", storage.path)
    };

    let repository =
        SqlitePostRepository::connect(&url, storage.max_connections, storage.auto_migrate)
            .await
            .with_context(|| format!("failed to open database {url}"))?;
    Ok(Box::new(repository))
}

#[cfg(not(feature = "database"))]
async fn open_sqlite(_storage: &StorageConfig) -> Result<Box<dyn PostRepository>> {
    anyhow::bail!("the sqlite storage backend requires building postgate with the `database` feature")
}

/// Wire the store, the moderation transport and the service together
pub async fn build_service(config: &PostgateConfig) -> Result<CliService> {
    let repository = open_repository(&config.storage).await?;

    let moderation = &config.moderation;
    let transport = OpenAiTransport::new(
        moderation.api_key.clone(),
        &moderation.base_url,
        moderation.requests_per_minute,
    )
    .context("failed to set up the moderation client")?;
    let orchestrator = ModerationOrchestrator::new(Arc::new(transport), moderation.timeout());

    Ok(PostService::new(repository, Arc::new(orchestrator)))
}

pub(crate) fn print_post(post: &Post) {
    println!("📄 Post #{}: {}", post.id, post.title);
    println!("   🏷️  State: {}", post.state);
    println!("   🕒 Created: {}", post.created_at.to_rfc3339());
    println!("   🕒 Updated: {}", post.updated_at.to_rfc3339());
}

pub fn show_how_to_get_started() {
    println!("🚦 Postgate - moderation-gated publishing");
    println!();
    println!("To get started:");
    println!("  ✏️  postgate create --title T --content C   # Add a post");
    println!("  🤖 postgate verify-ai ID                   # Automated moderation");
    println!("  👀 postgate verify ID                      # Human verification");
    println!("  🚀 postgate publish ID                     # Publish");
    println!();
    println!("Other commands:");
    println!("  📋 postgate list --scope pending-review");
    println!("  ⚙️  postgate init-config                   # Write postgate.toml");
}
