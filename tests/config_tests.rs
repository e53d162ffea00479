//! Integration tests for configuration loading

use std::io::Write;

use simcast::{BackendKind, DisplayLayout, DistributorConfig};

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        r#"
        render_fps = 15

        [display]
        layout = "vertical"

        [streaming]
        enabled = true

        [[streaming.streams]]
        camera = "workspace_overview"
        port = 5002
        "#
    )
    .expect("write config");

    let config = DistributorConfig::from_toml_file(file.path()).expect("load config");
    assert_eq!(config.render_fps, 15);
    assert_eq!(config.display.layout, DisplayLayout::Vertical);
    assert!(config.streaming.enabled);
    assert_eq!(config.streaming.streams[0].camera, "workspace_overview");
    assert_eq!(config.streaming.streams[0].port, 5002);

    // Defaulted transport knobs
    assert_eq!(config.streaming.streams[0].host, "127.0.0.1");
    assert_eq!(config.streaming.streams[0].speed_preset, "ultrafast");
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(DistributorConfig::from_toml_file("/nonexistent/simcast.toml").is_err());
}

#[test]
fn test_default_backend_name_resolves() {
    let config = DistributorConfig::from_toml_str(
        r#"
        [streaming]
        enabled = true

        [[streaming.streams]]
        camera = "cam0"
        "#,
    )
    .expect("parse");

    let backend = &config.streaming.streams[0].backend;
    assert!(BackendKind::from_name(backend).is_some());
}

#[test]
fn test_stream_entry_requires_camera() {
    let result = DistributorConfig::from_toml_str(
        r#"
        [[streaming.streams]]
        port = 5000
        "#,
    );
    assert!(result.is_err());
}
