//! Flush command - Upload everything in the persisted offline queue
//!
//! Runs an upload controller over the persisted queue, so entries are
//! delivered oldest first, removed only after a confirmed upload, and the
//! file is rewritten as they go. Should not run while the daemon is active.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;
use trackdav_sync::controller::UploadController;

use super::{queue::load_queue, CliContext};
use crate::output::get_formatter;

#[derive(Debug, Args)]
pub struct FlushCommand {}

impl FlushCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let (path, queue) = load_queue(ctx).await?;
        if queue.is_empty() {
            formatter.flush(0, 0);
            return Ok(());
        }

        let config = ctx.config();
        let store = ctx.remote_store(&config)?;
        let (controller, handle) = UploadController::new(store, config.tracking.clone(), queue);
        let task = tokio::spawn(controller.with_persistence(path).run());

        info!("Flushing offline queue");
        let flushed = handle.flush_queue().await?;
        drop(handle);
        let remaining = task.await.context("Upload controller task failed")?.len();

        formatter.flush(flushed, remaining);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use trackdav_core::config::ConfigBuilder;

    use super::*;
    use crate::output::OutputFormat;

    #[tokio::test]
    async fn test_empty_queue_needs_no_server() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        ConfigBuilder::new()
            .queue_path(dir.path().join("absent.json"))
            .build()
            .save(&config_path)
            .unwrap();
        let ctx = CliContext::new(OutputFormat::Human, Some(config_path.display().to_string()));

        // no server section: reaching the store would fail
        FlushCommand {}.execute(&ctx).await.unwrap();
    }
}
