//! Completions command - Generate shell completion scripts
//!
//! `trackdav completions bash > ~/.local/share/bash-completion/completions/trackdav`

use std::io::{self, Write};

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::Shell;

use super::CliContext;

#[derive(Debug, clap::Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsCommand {
    pub async fn execute(&self, _ctx: &CliContext) -> Result<()> {
        write_completions(self.shell, &mut io::stdout());
        Ok(())
    }
}

/// Writes the completion script for `shell`, named after the binary
fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = crate::Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bash_script_covers_queue_commands() {
        let mut script = Vec::new();
        write_completions(Shell::Bash, &mut script);
        let script = String::from_utf8(script).unwrap();

        assert!(script.contains("trackdav"));
        for subcommand in ["ls", "push", "queue", "flush", "config"] {
            assert!(script.contains(subcommand), "missing {subcommand}");
        }
    }
}
