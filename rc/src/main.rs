use clap::Parser;
use colored::*;
use eyre::{Context, Result};

use racer::cli::{Cli, Command, RaceArgs};
use racer::config::Config;
use racer::{OsFileSystem, Racer, SystemClock};

fn setup_logging(verbose: bool) -> Result<()> {
    // Logs go to stderr so stdout only carries the result line
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    match cli.command {
        Some(Command::Race { args }) => cmd_race(config, &args),
        Some(Command::Probe { args }) => cmd_probe(config, &args),
        None => cmd_race(config, &RaceArgs::default()),
    }
}

fn build_racer(mut config: Config, args: &RaceArgs) -> Result<Racer<OsFileSystem, SystemClock>> {
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let racer = Racer::new(OsFileSystem, SystemClock::new(), config.race_paths()?)
        .with_poll_interval(config.race.poll_interval())
        .with_precondition(config.race.precondition());
    Ok(racer)
}

fn cmd_race(config: Config, args: &RaceArgs) -> Result<()> {
    let racer = build_racer(config, args)?;

    let outcome = match racer.run() {
        Ok(outcome) => outcome,
        Err(e) => {
            let stage = e.stage();
            return Err(e).context(format!("Race failed at {} step", stage));
        }
    };

    let paths = racer.paths();
    println!(
        "{} Replaced {} with {} after {} probe(s) ({} ms)",
        "✓".green(),
        paths.target().display().to_string().cyan(),
        paths.sensitive().display(),
        outcome.attempts,
        outcome.detected_after.as_millis()
    );
    Ok(())
}

fn cmd_probe(config: Config, args: &RaceArgs) -> Result<()> {
    let racer = build_racer(config, args)?;
    let ready = racer.probe().context("Probe failed")?;

    let target = racer.paths().target().display().to_string();
    if ready {
        println!("{} {} ({})", "ready".green(), target, racer.precondition());
    } else {
        println!("{} {} ({})", "waiting".yellow(), target, racer.precondition());
    }
    Ok(())
}
