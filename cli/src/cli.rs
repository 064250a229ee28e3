//! CLI argument definitions for tappack.
//!
//! Kept apart from the entrypoint so parsing can be tested without running
//! a build.

use camino::Utf8PathBuf;
use clap::Parser;

/// Build a Tasmota Berry application archive.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "tappack")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build a Tasmota Berry application archive (.tapp).\n\n",
    "tappack reads the module's manifest.yaml, resolves its dependencies ",
    "(local directories, ZIP URLs and hosted release assets), applies version ",
    "patches for the selected release channel and writes a single archive ",
    "with a generated autoexec.be bootstrap.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Package a module next to its sources:\n",
    "    $ tappack --module-path ./blinds\n\n",
    "  Package the development channel to a chosen file:\n",
    "    $ tappack --module-path ./blinds --channel-id development --output blinds-dev.tapp\n",
))]
pub struct Cli {
    /// Module directory containing Berry files, assets and manifest.yaml.
    #[arg(long, value_name = "DIR")]
    pub module_path: Utf8PathBuf,

    /// Output archive path [default: <module dir>/<module name>.tapp].
    #[arg(long, value_name = "FILE")]
    pub output: Option<Utf8PathBuf>,

    /// Release channel used to resolve manifest overrides.
    #[arg(long, value_name = "ID")]
    pub channel_id: Option<String>,

    /// Tool configuration file (TOML).
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Only report warnings, errors and the written archive.
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
