//! Ls command - List a remote folder
//!
//! Unlike the daemon, which treats listing failures as an empty folder,
//! this command reports the underlying error.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::CliContext;
use crate::output::get_formatter;

#[derive(Debug, Args)]
pub struct LsCommand {
    /// Folder relative to the configured base path
    #[arg(default_value = "/")]
    pub path: String,
}

impl LsCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let config = ctx.config();
        let client = ctx.client(&config)?;

        info!(path = %self.path, "Listing remote folder");
        let folder = client
            .list_folder(&self.path)
            .await
            .with_context(|| format!("Failed to list '{}'", self.path))?;

        formatter.folder(&folder);
        Ok(())
    }
}
