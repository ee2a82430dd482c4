//! CLI argument parsing for the racer

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::precondition::{OpenCheck, Strategy};

#[derive(Parser, Debug)]
#[command(name = "rc")]
#[command(author, version, about = "Swap a file's contents during a victim's check-to-use window", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Defaults to `race` with configured values
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Wait for the precondition, then swap the target once
    Race {
        #[command(flatten)]
        args: RaceArgs,
    },

    /// Evaluate the precondition once and report ready or waiting
    Probe {
        #[command(flatten)]
        args: RaceArgs,
    },
}

/// Per-invocation overrides of the configuration file
#[derive(Args, Debug, Clone, Default)]
pub struct RaceArgs {
    /// File the victim checks and later uses
    #[arg(short, long)]
    pub target: Option<PathBuf>,

    /// File whose contents are planted into the target
    #[arg(short, long)]
    pub sensitive: Option<PathBuf>,

    /// Staging file on the same filesystem as the target
    #[arg(long)]
    pub temp: Option<PathBuf>,

    /// Delay between probes in milliseconds (default: 100)
    #[arg(short, long)]
    pub interval_ms: Option<u64>,

    /// Gate to wait on: exists or exists-unlocked
    #[arg(short, long)]
    pub precondition: Option<Strategy>,

    /// Which write-open failures mean "open": broad or strict
    #[arg(short, long)]
    pub open_check: Option<OpenCheck>,
}

impl RaceArgs {
    /// Overlay any flags that were given onto `config`
    pub fn apply(&self, config: &mut Config) {
        if let Some(target) = &self.target {
            config.paths.target = target.clone();
        }
        if let Some(sensitive) = &self.sensitive {
            config.paths.sensitive = sensitive.clone();
        }
        if let Some(temp) = &self.temp {
            config.paths.temp = temp.clone();
        }
        if let Some(interval_ms) = self.interval_ms {
            config.race.poll_interval_ms = interval_ms;
        }
        if let Some(precondition) = self.precondition {
            config.race.precondition = precondition;
        }
        if let Some(open_check) = self.open_check {
            config.race.open_check = open_check;
        }
    }
}
