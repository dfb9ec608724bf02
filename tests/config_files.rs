//! Integration tests for configuration files on disk

mod common;

use common::builders::ConfigBuilder;
use debugchart_rs::config::{AppConfig, StartRequest};
use debugchart_rs::types::ChartKind;
use tempfile::TempDir;

#[test]
fn test_save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = ConfigBuilder::new()
        .address("10.0.0.2:4711")
        .request_timeout_ms(750)
        .max_pages(50)
        .chart(&["a", "b"], ChartKind::Spline)
        .chart(&["buf"], ChartKind::Pie)
        .build();
    config.ui.dark_mode = false;
    config.session.request = StartRequest::Launch;

    config.save_to(&path).unwrap();
    assert!(path.exists());

    let loaded = AppConfig::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let loaded = AppConfig::load_from(dir.path().join("absent.toml")).unwrap();
    assert_eq!(loaded, AppConfig::default());
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[session]
address = "localhost:9229"

[[charts]]
names = ["x"]
kind = "column"
"#,
    )
    .unwrap();

    let loaded = AppConfig::load_from(&path).unwrap();
    assert_eq!(loaded.session.address, "localhost:9229");
    assert_eq!(loaded.session.request, StartRequest::Attach);
    assert_eq!(loaded.fetch.page_size, 10);
    assert_eq!(loaded.fetch.max_pages, None);
    assert_eq!(loaded.charts.len(), 1);
    assert_eq!(loaded.charts[0].kind, ChartKind::Column);
}

#[test]
fn test_corrupt_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[session\naddress = ").unwrap();

    assert!(AppConfig::load_from(&path).is_err());
    assert_eq!(AppConfig::load_or_default(Some(&path)), AppConfig::default());
}

#[test]
fn test_unknown_chart_kind_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[[charts]]\nnames = [\"x\"]\nkind = \"radar\"\n").unwrap();

    assert!(AppConfig::load_from(&path).is_err());
}
