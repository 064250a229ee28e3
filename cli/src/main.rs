//! tappack CLI entrypoint.
//!
//! Parses arguments, loads the optional tool configuration and delegates the
//! build to [`tappack::Packager`]. Progress is written to stderr; any fatal
//! error is reported there and the process exits with status 1.

mod cli;
mod output;

use std::io::Write;

use clap::Parser;
use tappack::channel::ChannelId;
use tappack::config::{ConfigError, PackagerConfig};
use tappack::fetch::HttpFetcher;
use tappack::{BuildOptions, PackError, Packager};
use thiserror::Error;

use crate::cli::Cli;
use crate::output::{StderrObserver, write_stderr_line};

/// Fatal errors of a CLI run.
#[derive(Debug, Error)]
enum RunError {
    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The build failed.
    #[error(transparent)]
    Pack(#[from] PackError),
}

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<(), RunError> {
    let config = match &cli.config {
        Some(path) => PackagerConfig::load(path)?,
        None => PackagerConfig::default(),
    };
    let options = BuildOptions::new(cli.module_path.clone())
        .with_channel(cli.channel_id.as_deref().map(ChannelId::from))
        .with_config(&config)?;
    let fetcher = HttpFetcher::new(config.http_timeout());

    let mut observer = StderrObserver::new(stderr, cli.quiet);
    let packager = Packager::load(options, &mut observer)?;
    packager.write(cli.output.as_deref(), &fetcher, &mut observer)?;
    Ok(())
}

fn exit_code_for_run_result(result: Result<(), RunError>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format_args!("error: {err}"));
            1
        }
    }
}
