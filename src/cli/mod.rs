use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::store::{PostFilter, PostId};

pub mod commands;

#[derive(Parser)]
#[command(name = "postgate")]
#[command(about = "Moderation-gated publishing workflow for posts")]
#[command(long_about = "Postgate keeps posts behind a staged review: an automated moderation \
                       check, then human verification, then publication. Start with \
                       'postgate create' to add a post.")]
pub struct Cli {
    /// Configuration file (defaults to ./postgate.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new post in the `created` state
    Create {
        #[arg(long, help = "Post title")]
        title: String,
        #[arg(long, help = "Post body")]
        content: String,
    },
    /// Edit a post; reviewed posts go back to `created`
    Update {
        id: PostId,
        #[arg(long, help = "New title (keeps the current one if omitted)")]
        title: Option<String>,
        #[arg(long, help = "New body (keeps the current one if omitted)")]
        content: Option<String>,
    },
    /// Show one post and what can be done with it next
    Show { id: PostId },
    /// List posts, newest first
    List {
        #[arg(long, value_enum, default_value = "active", help = "Which posts to list")]
        scope: Scope,
    },
    /// Run automated moderation on a post
    #[command(name = "verify-ai")]
    VerifyAi { id: PostId },
    /// Mark an AI-verified post as verified by a human
    Verify { id: PostId },
    /// Publish a verified post
    Publish { id: PostId },
    /// Soft-delete a post
    Delete { id: PostId },
    /// Bring a deleted post back as `created`
    Restore { id: PostId },
    /// Write a configuration file with default values
    #[command(name = "init-config")]
    InitConfig {
        #[arg(long, default_value = crate::config::DEFAULT_CONFIG_FILE, help = "Where to write the file")]
        path: PathBuf,
        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scope {
    Active,
    Published,
    PendingReview,
    All,
}

impl From<Scope> for PostFilter {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::Active => PostFilter::Active,
            Scope::Published => PostFilter::Published,
            Scope::PendingReview => PostFilter::PendingReview,
            Scope::All => PostFilter::All,
        }
    }
}
