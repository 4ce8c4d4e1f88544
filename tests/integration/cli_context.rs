//! Integration tests for the CLI run context and route table

use clap::Parser;
use papestash::cli::{Cli, Commands, RunContext};
use papestash::config::PapestashConfig;
use papestash::error::{ApiError, FetchError};
use std::time::Duration;

use super::support::{record, wide, ScriptedFetcher};

fn context(steps: Vec<super::support::FetchResult>) -> RunContext {
    RunContext::with_fetcher(PapestashConfig::default(), ScriptedFetcher::new(steps)).unwrap()
}

fn list(format: &str) -> Commands {
    Commands::List {
        aspect_ratio: None,
        min_size: None,
        max_size: None,
        format: format.to_string(),
    }
}

#[test]
fn test_list_text_and_json() {
    let ctx = context(vec![Ok(vec![wide(1), record(2, 1080, 1920, 2048)])]);

    let text = ctx.execute(&list("text")).unwrap();
    assert!(text.contains("wallpaper-1.jpg"));
    assert!(text.contains("9:16"));
    assert!(text.ends_with("Total: 2 wallpaper(s)"));

    let json = ctx.execute(&list("json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["total"], 2);
    assert_eq!(value["wallpapers"][1]["aspectRatio"], "9:16");
}

#[test]
fn test_list_rejects_bad_filters() {
    let ctx = context(vec![Ok(Vec::new())]);
    let bad_ratio = Commands::List {
        aspect_ratio: Some("5:4".to_string()),
        min_size: None,
        max_size: None,
        format: "text".to_string(),
    };
    assert!(matches!(ctx.execute(&bad_ratio), Err(ApiError::InvalidQuery(_))));

    let half_range = Commands::List {
        aspect_ratio: None,
        min_size: Some(10),
        max_size: None,
        format: "text".to_string(),
    };
    assert!(matches!(ctx.execute(&half_range), Err(ApiError::InvalidQuery(_))));
    assert!(matches!(ctx.execute(&list("xml")), Err(ApiError::InvalidQuery(_))));
}

#[test]
fn test_show_found_and_missing() {
    let ctx = context(vec![Ok(vec![wide(1)])]);
    let shown = ctx
        .execute(&Commands::Show {
            id: 1,
            format: "text".to_string(),
        })
        .unwrap();
    assert!(shown.starts_with("Wallpaper: wallpaper-1.jpg"));

    let missing = ctx.execute(&Commands::Show {
        id: 42,
        format: "text".to_string(),
    });
    assert!(matches!(missing, Err(ApiError::NotFound(42))));
}

#[test]
fn test_fetch_failure_surfaces_as_fetch_error() {
    let ctx = context(vec![Err(FetchError::Status {
        status: 502,
        message: "Bad Gateway".to_string(),
    })]);
    match ctx.execute(&list("text")) {
        Err(ApiError::Fetch(FetchError::Status { status, .. })) => assert_eq!(status, 502),
        other => panic!("expected fetch failure, got {:?}", other),
    }
}

#[test]
fn test_config_command_prints_toml() {
    let ctx = context(Vec::new());
    let out = ctx.execute(&Commands::Config).unwrap();
    assert!(out.contains("[api]"));
    assert!(out.contains("base_url = \"http://localhost:8080\""));
    assert!(out.contains("[query.retry]"));
}

#[test]
fn test_watch_prints_each_state_change() {
    let ctx = context(vec![Ok(vec![wide(1)]), Ok(vec![wide(1), wide(2)])]);
    let mut out = Vec::new();
    let summary = ctx.watch(Duration::ZERO, Some(2), &mut out).unwrap();
    assert_eq!(summary, "Watched 2 refresh(es)");

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4, "unexpected output: {}", text);
    assert_eq!(lines[0], "loading");
    assert!(lines[1].starts_with("success: 1 wallpaper(s)"));
    assert_eq!(lines[2], "loading (1 cached)");
    assert!(lines[3].starts_with("success: 2 wallpaper(s)"));
}

#[test]
fn test_cli_parses_global_flags() {
    let cli = Cli::try_parse_from([
        "papestash",
        "--source",
        "wallpapers.json",
        "--log-level",
        "warn",
        "list",
        "--aspect-ratio",
        "21:9",
        "--format",
        "json",
    ])
    .unwrap();
    assert_eq!(cli.source.as_deref(), Some(std::path::Path::new("wallpapers.json")));
    assert_eq!(cli.log_level.as_deref(), Some("warn"));
    match cli.command {
        Commands::List {
            aspect_ratio,
            format,
            ..
        } => {
            assert_eq!(aspect_ratio.as_deref(), Some("21:9"));
            assert_eq!(format, "json");
        }
        _ => panic!("expected list command"),
    }
}
