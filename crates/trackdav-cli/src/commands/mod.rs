//! CLI subcommands
//!
//! Every command receives a [`CliContext`] carrying the output format and
//! the configuration file location.

pub mod completions;
pub mod config;
pub mod flush;
pub mod ls;
pub mod push;
pub mod queue;
pub mod rm;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use trackdav_core::{config::Config, domain::ServerConfig};
use trackdav_webdav::{client::WebDavClient, provider::WebDavRemoteStore};

use crate::output::OutputFormat;

/// Options shared by all subcommands
#[derive(Debug, Clone)]
pub struct CliContext {
    pub format: OutputFormat,
    pub config_path: PathBuf,
}

impl CliContext {
    pub fn new(format: OutputFormat, config_override: Option<String>) -> Self {
        let config_path = config_override
            .map(PathBuf::from)
            .unwrap_or_else(Config::default_path);
        Self {
            format,
            config_path,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Loads the configuration, falling back to defaults when the file is missing
    pub fn config(&self) -> Config {
        Config::load_or_default(&self.config_path)
    }

    /// Returns the server configuration or explains what is missing
    pub fn server(&self, config: &Config) -> Result<ServerConfig> {
        config.server_config().with_context(|| {
            format!(
                "Server is not configured. Set server.uri, server.base_path, server.user and \
                 server.password in {}",
                self.config_path.display()
            )
        })
    }

    /// Builds a WebDAV client from the configuration
    pub fn client(&self, config: &Config) -> Result<WebDavClient> {
        let server = self.server(config)?;
        let timeout = Duration::from_secs(config.server.request_timeout_secs);
        WebDavClient::with_timeout(&server, timeout).context("Failed to create WebDAV client")
    }

    /// Builds the remote store adapter from the configuration
    pub fn remote_store(&self, config: &Config) -> Result<Arc<WebDavRemoteStore>> {
        Ok(Arc::new(WebDavRemoteStore::new(self.client(config)?)))
    }
}
