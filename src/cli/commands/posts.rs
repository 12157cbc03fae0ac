use anyhow::Result;

use super::{print_post, CliService};
use crate::lifecycle::{available_events, LifecycleEvent};
use crate::store::{PostFilter, PostId};

pub struct CreateCommand {
    pub title: String,
    pub content: String,
}

impl CreateCommand {
    pub async fn execute(&self, service: &CliService) -> Result<()> {
        let post = service.create_post(&self.title, &self.content).await?;
        println!("✅ Created post #{}", post.id);
        print_post(&post);
        Ok(())
    }
}

pub struct UpdateCommand {
    pub id: PostId,
    pub title: Option<String>,
    pub content: Option<String>,
}

impl UpdateCommand {
    pub async fn execute(&self, service: &CliService) -> Result<()> {
        if self.title.is_none() && self.content.is_none() {
            anyhow::bail!("nothing to update: pass --title and/or --content");
        }

        let post = service
            .update_post(self.id, self.title.as_deref(), self.content.as_deref())
            .await?;
        println!("✅ Updated post #{}", post.id);
        print_post(&post);
        Ok(())
    }
}

pub struct ShowCommand {
    pub id: PostId,
}

impl ShowCommand {
    pub async fn execute(&self, service: &CliService) -> Result<()> {
        let post = service.get_post(self.id).await?;
        print_post(&post);
        println!();
        println!("{}", post.content);
        println!();

        let next: Vec<&str> = available_events(post.state)
            .into_iter()
            .filter(|event| *event != LifecycleEvent::ResetToCreated)
            .map(|event| event.as_str())
            .collect();
        if next.is_empty() {
            println!("💡 No further actions available");
        } else {
            println!("💡 Next: {}", next.join(", "));
        }
        Ok(())
    }
}

pub struct ListCommand {
    pub filter: PostFilter,
}

impl ListCommand {
    pub async fn execute(&self, service: &CliService) -> Result<()> {
        let posts = service.list(self.filter).await?;
        if posts.is_empty() {
            println!("📋 No posts found");
            return Ok(());
        }

        println!("📋 {} post(s)", posts.len());
        for post in &posts {
            println!("   #{:<5} {:<12} {}", post.id, post.state.as_str(), post.title);
        }
        Ok(())
    }
}
