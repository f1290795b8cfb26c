//! Rm command - Remove a remote file

use anyhow::Result;
use clap::Args;
use tracing::info;
use trackdav_core::ports::IRemoteStore;

use super::CliContext;
use crate::output::get_formatter;

#[derive(Debug, Args)]
pub struct RmCommand {
    /// File relative to the configured base path
    pub path: String,
}

impl RmCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let config = ctx.config();
        let store = ctx.remote_store(&config)?;

        info!(path = %self.path, "Removing remote file");
        let deleted = store.delete(&self.path).await;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": deleted,
                "path": self.path,
            }));
        }
        if !deleted {
            anyhow::bail!("Could not remove {} (run with -v for details)", self.path);
        }
        formatter.success(&format!("Removed {}", self.path));
        Ok(())
    }
}
