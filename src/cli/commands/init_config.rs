use anyhow::Result;
use std::path::PathBuf;

use crate::config::PostgateConfig;

pub struct InitConfigCommand {
    pub path: PathBuf,
    pub force: bool,
}

impl InitConfigCommand {
    /// Write a default configuration file. Never stores an API key.
    pub fn execute(&self) -> Result<()> {
        if self.path.exists() && !self.force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                self.path.display()
            );
        }

        PostgateConfig::default().save_to_file(&self.path)?;
        println!("⚙️  Wrote default configuration to {}", self.path.display());
        println!("   💡 Set OPENAI_API_KEY or POSTGATE__MODERATION__API_KEY for automated moderation");
        Ok(())
    }
}
