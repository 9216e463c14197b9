use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::collector::CollectorKind;
use crate::runner::Mode;
use crate::version;

#[derive(Debug, Parser)]
#[command(name = version::NAME, version = version::VERSION, about = "Jenkins and Discourse health reports")]
pub struct Cli {
    /// TOML settings file (./config.toml when unset).
    #[arg(long, env = "CONFIG_FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Restrict to these collectors (repeatable). All collectors by default.
    #[arg(long = "only", value_enum, global = true)]
    pub only: Vec<CollectorKind>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Collect, store, and render every configured window.
    Run,
    /// Collect and store a snapshot without rendering.
    Collect,
    /// Render reports from stored snapshots.
    Report,
    /// Print the newest stored snapshots as JSON.
    Dump {
        #[arg(long, value_enum)]
        collector: CollectorKind,
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },
}

impl Cli {
    pub fn collectors(&self) -> Vec<CollectorKind> {
        if self.only.is_empty() {
            CollectorKind::ALL.to_vec()
        } else {
            let mut kinds: Vec<CollectorKind> = Vec::with_capacity(self.only.len());
            for kind in &self.only {
                if !kinds.contains(kind) {
                    kinds.push(*kind);
                }
            }
            kinds
        }
    }
}

impl Command {
    /// Pipeline mode for the collect/report commands; `None` for `dump`.
    pub fn mode(&self) -> Option<Mode> {
        match self {
            Command::Run => Some(Mode::Run),
            Command::Collect => Some(Mode::Collect),
            Command::Report => Some(Mode::Report),
            Command::Dump { .. } => None,
        }
    }
}
