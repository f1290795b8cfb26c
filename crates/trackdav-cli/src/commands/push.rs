//! Push command - Upload one position immediately
//!
//! Uses the same record naming and content as the daemon, but bypasses the
//! offline queue: a failed upload is reported, not queued.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use tracing::info;
use trackdav_core::{domain::Position, ports::IRemoteStore};
use trackdav_sync::controller::remote_path_for;

use super::CliContext;
use crate::output::get_formatter;

#[derive(Debug, Args)]
pub struct PushCommand {
    /// Latitude in degrees
    #[arg(allow_negative_numbers = true)]
    pub latitude: f64,
    /// Longitude in degrees
    #[arg(allow_negative_numbers = true)]
    pub longitude: f64,
}

impl PushCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);
        let position = Position::new(self.latitude, self.longitude, Utc::now())
            .context("Invalid position")?;

        let config = ctx.config();
        let store = ctx.remote_store(&config)?;

        let path = remote_path_for(position.captured_at());
        let content = serde_json::to_vec(&position).context("Failed to serialize position")?;

        info!(%position, path = %path, "Uploading position");
        let uploaded = store.upload(&path, &content).await;

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": uploaded,
                "path": path,
                "position": position,
            }));
        }
        if !uploaded {
            anyhow::bail!("Upload of {} failed (run with -v for details)", path);
        }
        formatter.success(&format!("Uploaded {}", path));
        formatter.info(&position.to_string());
        Ok(())
    }
}
