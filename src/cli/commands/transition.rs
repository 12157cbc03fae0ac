use anyhow::Result;

use super::CliService;
use crate::lifecycle::LifecycleEvent;
use crate::store::PostId;

/// Runs one lifecycle event against a stored post
pub struct TransitionCommand {
    pub id: PostId,
    pub event: LifecycleEvent,
}

impl TransitionCommand {
    pub fn new(id: PostId, event: LifecycleEvent) -> Self {
        Self { id, event }
    }

    pub async fn execute(&self, service: &CliService) -> Result<()> {
        let state = match self.event {
            LifecycleEvent::VerifyWithAi => {
                println!("🤖 Sending post #{} to automated moderation...", self.id);
                let verification = service.verify_with_ai(self.id).await?;
                println!("   💬 {}", verification.message);
                verification.state
            }
            LifecycleEvent::Verify => service.verify(self.id).await?,
            LifecycleEvent::Publish => service.publish(self.id).await?,
            LifecycleEvent::Delete => service.delete(self.id).await?,
            LifecycleEvent::Restore => service.restore(self.id).await?,
            LifecycleEvent::ResetToCreated => {
                anyhow::bail!("posts are reset by editing them, use 'postgate update'")
            }
        };

        println!("✅ Post #{} is now {}", self.id, state);
        Ok(())
    }
}
