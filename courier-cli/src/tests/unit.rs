//! Argument parsing for the `solve` subcommand.

use super::*;
use camino::Utf8PathBuf;
use rstest::rstest;

fn parse(argv: &[&str]) -> Result<SolveArgs, clap::Error> {
    let cli = Cli::try_parse_from(argv)?;
    match cli.command {
        Command::Solve(args) => Ok(args),
    }
}

#[rstest]
fn solve_accepts_every_override() {
    let args = parse(&[
        "courier",
        "solve",
        "day.json",
        "--max-reload",
        "2",
        "--time-limit",
        "5",
        "--drop-penalty",
        "max_distance",
    ])
    .expect("arguments should parse");
    assert_eq!(args.request_path, Some(Utf8PathBuf::from("day.json")));
    assert_eq!(args.max_reload, Some(2));
    assert_eq!(args.time_limit, Some(5));
    assert_eq!(args.drop_penalty.as_deref(), Some("max_distance"));
}

#[rstest]
fn solve_leaves_unset_options_empty() {
    let args = parse(&["courier", "solve"]).expect("arguments should parse");
    assert!(args.request_path.is_none());
    assert!(args.max_reload.is_none());
    assert!(args.time_limit.is_none());
    assert!(args.drop_penalty.is_none());
}

#[rstest]
#[case::negative_reload(&["courier", "solve", "--max-reload", "-1"])]
#[case::fractional_limit(&["courier", "solve", "--time-limit", "1.5"])]
#[case::unknown_command(&["courier", "optimise"])]
fn malformed_arguments_are_rejected(#[case] argv: &[&str]) {
    assert!(parse(argv).is_err());
}
