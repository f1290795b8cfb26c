//! Queue command - Show the persisted offline queue

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use trackdav_sync::offline_queue::OfflineQueue;

use super::CliContext;
use crate::output::{get_formatter, QueueView};

#[derive(Debug, Args)]
pub struct QueueCommand {
    /// Show at most this many entries (oldest first)
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,
}

impl QueueCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let (path, queue) = load_queue(ctx).await?;
        let shown = queue.peek_oldest(self.limit);

        formatter.queue(&QueueView::new(&path, &queue, &shown));
        Ok(())
    }
}

/// Reads the queue file named by the configuration the daemon uses
pub(crate) async fn load_queue(ctx: &CliContext) -> Result<(PathBuf, OfflineQueue)> {
    let config = ctx.config();
    let path = config.queue.path;
    let queue = OfflineQueue::load(&path, config.tracking.offline_queue_capacity)
        .await
        .with_context(|| format!("Failed to read offline queue {}", path.display()))?;
    Ok((path, queue))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use trackdav_core::config::ConfigBuilder;

    use super::*;
    use crate::output::OutputFormat;

    async fn context_with_queue(dir: &tempfile::TempDir, entries: usize) -> CliContext {
        let queue_path = dir.path().join("offline_queue.json");
        let mut queue = OfflineQueue::new(10);
        for i in 0..entries {
            queue.push(format!("{i}.json"), "{}", Utc::now());
        }
        queue.save(&queue_path).await.unwrap();

        let config_path = dir.path().join("config.yaml");
        ConfigBuilder::new()
            .queue_path(queue_path)
            .build()
            .save(&config_path)
            .unwrap();
        CliContext::new(
            OutputFormat::Json,
            Some(config_path.display().to_string()),
        )
    }

    #[tokio::test]
    async fn test_reads_queue_named_in_config() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_with_queue(&dir, 3).await;

        let (path, queue) = load_queue(&ctx).await.unwrap();
        assert_eq!(path, dir.path().join("offline_queue.json"));
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek_oldest(1)[0].remote_path, "0.json");
    }

    #[tokio::test]
    async fn test_corrupt_queue_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context_with_queue(&dir, 1).await;
        std::fs::write(dir.path().join("offline_queue.json"), "not json").unwrap();

        let err = QueueCommand { limit: 5 }.execute(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("Failed to read offline queue"));
    }
}
