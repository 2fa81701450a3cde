//! Command-line parsing

use clap::Parser;
use lereco::cli::{list_filters, Cli, Commands};
use rstest::rstest;
use std::path::PathBuf;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("lereco").chain(args.iter().copied()))
        .expect("arguments should parse")
}

#[test]
fn test_login_flags() {
    let cli = parse(&["login", "--username", "u", "--password", "p"]);
    assert_eq!(
        cli.command,
        Commands::Login {
            username: "u".to_string(),
            password: "p".to_string(),
        }
    );
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = parse(&["whoami", "-v", "--config", "/tmp/lereco.toml"]);
    assert!(cli.verbose);
    assert_eq!(cli.config_path, Some(PathBuf::from("/tmp/lereco.toml")));
    assert_eq!(cli.command, Commands::Whoami);
}

#[test]
fn test_list_defaults() {
    let cli = parse(&["list"]);
    assert_eq!(
        cli.command,
        Commands::List {
            search: None,
            tags: Vec::new(),
            archived: false,
            pages: 1,
            all: false,
            json: false,
        }
    );
}

#[test]
fn test_list_repeated_tags_keep_order() {
    let cli = parse(&["list", "--tag", "AWS", "-t", "Critical", "--archived", "--all"]);
    match cli.command {
        Commands::List { tags, archived, all, .. } => {
            assert_eq!(tags, vec!["AWS", "Critical"]);
            assert!(archived);
            assert!(all);
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn test_pages_conflicts_with_all() {
    let result = Cli::try_parse_from(["lereco", "list", "--pages", "3", "--all"]);
    assert!(result.is_err());
}

#[rstest]
#[case(&["archive", "rec-001"], Commands::Archive { id: "rec-001".to_string() })]
#[case(&["unarchive", "rec-001"], Commands::Unarchive { id: "rec-001".to_string() })]
#[case(&["config", "--defaults"], Commands::Config { defaults: true })]
#[case(&["logout"], Commands::Logout)]
fn test_simple_commands(#[case] args: &[&str], #[case] expected: Commands) {
    assert_eq!(parse(args).command, expected);
}

#[test]
fn test_login_requires_both_fields() {
    assert!(Cli::try_parse_from(["lereco", "login", "--username", "u"]).is_err());
}

#[test]
fn test_list_filters_build_query_key() {
    let tags = vec!["AWS".to_string(), "Critical".to_string(), "AWS".to_string()];
    let filters = list_filters(Some("mfa".to_string()), &tags, true);
    let key = filters.query_key();
    assert_eq!(key.search(), "mfa");
    assert_eq!(key.tags(), ["AWS", "Critical"]);
    assert!(key.archive_view());
    assert_eq!(filters.search_input(), "mfa");
}

#[cfg(feature = "stub-server")]
#[test]
fn test_serve_stub_defaults() {
    let cli = parse(&["serve-stub"]);
    assert_eq!(
        cli.command,
        Commands::ServeStub {
            host: "127.0.0.1".to_string(),
            port: 47270,
        }
    );
}
