//! Tests for tappack CLI parsing.

use super::*;
use rstest::rstest;

#[test]
fn cli_parses_required_module_path() {
    let cli = Cli::parse_from(["tappack", "--module-path", "blinds"]);
    assert_eq!(cli.module_path, Utf8PathBuf::from("blinds"));
    assert!(cli.output.is_none());
    assert!(cli.channel_id.is_none());
    assert!(cli.config.is_none());
    assert!(!cli.quiet);
}

#[test]
fn cli_parses_all_options() {
    let cli = Cli::parse_from([
        "tappack",
        "--module-path",
        "/src/blinds",
        "--output",
        "out/blinds.tapp",
        "--channel-id",
        "development",
        "--config",
        "tappack.toml",
        "-q",
    ]);
    assert_eq!(cli.output, Some(Utf8PathBuf::from("out/blinds.tapp")));
    assert_eq!(cli.channel_id.as_deref(), Some("development"));
    assert_eq!(cli.config, Some(Utf8PathBuf::from("tappack.toml")));
    assert!(cli.quiet);
}

#[rstest]
#[case::missing_module_path(&["tappack"][..])]
#[case::unknown_flag(&["tappack", "--module-path", "m", "--compress"][..])]
fn cli_rejects_invalid_arguments(#[case] args: &[&str]) {
    assert!(Cli::try_parse_from(args).is_err());
}
