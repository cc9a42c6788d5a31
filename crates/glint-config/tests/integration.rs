//! Integration tests for glint-config.
//!
//! Tests the full configuration loading pipeline: discovery -> parse -> merge -> validate.

#![allow(clippy::tests_outside_test_module)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use glint_config::{
    Config, ConfigError, ConfigWarning, Encoder, ParsedConfig, merge_configs, parse_config_file,
    parse_request_json,
};

/// Test helper owning a temporary directory.
struct TestEnv {
    /// Temporary root.
    root: tempfile::TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    /// Creates a file with content and returns its path.
    fn create_file(&self, rel_path: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }
}

#[test]
fn test_load_from_no_files_returns_default() {
    let config = Config::load_from_files(&[]).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.fetch.stemmer, "english");
}

#[test]
fn test_load_from_files_precedence() {
    let env = TestEnv::new();
    let near = env.create_file(
        "a/.glint.toml",
        r#"
[highlight]
encoder = "html"

[highlight.fields.body]
"#,
    );
    let far = env.create_file(
        ".glint.toml",
        r#"
[highlight]
encoder = "none"
fragment_size = 60

[children]
size = 4
"#,
    );

    let config = Config::load_from_files(&[near, far]).unwrap();
    let body = &config.highlight.fields["body"];
    assert_eq!(body.encoder, Encoder::Html);
    assert_eq!(body.fragment_size, 60);
    assert_eq!(config.children.unwrap().size, 4);
}

#[test]
fn test_load_from_missing_file_fails() {
    let env = TestEnv::new();
    let result = Config::load_from_files(&[env.path().join("nope.toml")]);
    assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
}

#[test]
fn test_load_invalid_file_reports_path() {
    let env = TestEnv::new();
    let path = env.create_file(".glint.toml", "[highlight\n");
    let err = Config::load_from_files(&[path.clone()]).unwrap_err();
    assert!(err.to_string().contains(&path.display().to_string()));
}

#[test]
fn test_request_layer_overrides_file() {
    let env = TestEnv::new();
    let path = env.create_file(
        ".glint.toml",
        "[highlight]\nnumber_of_fragments = 2\n\n[highlight.fields.body]\n",
    );
    let request = parse_request_json(
        r#"{"highlight": {"fields": {"body": {"number_of_fragments": 0}, "title": {}}}}"#,
    )
    .unwrap();

    let config = merge_configs(&[
        ParsedConfig {
            source: "request".into(),
            config: request,
        },
        ParsedConfig {
            source: path.display().to_string(),
            config: parse_config_file(&path).unwrap(),
        },
    ]);

    assert_eq!(config.highlight.fields["body"].number_of_fragments, 0);
    assert_eq!(config.highlight.fields["title"].number_of_fragments, 2);
    assert!(config.validate().is_empty());
}

#[test]
fn test_effective_settings_round_trip_through_toml() {
    let env = TestEnv::new();
    let path = env.create_file(
        ".glint.toml",
        "[highlight]\ntags_schema = \"styled\"\n\n[highlight.fields.body]\nfragment_size = 5\n",
    );
    let config = Config::load_from_files(&[path]).unwrap();

    let warnings = config.validate();
    assert_eq!(warnings.len(), 1);
    assert!(matches!(warnings[0], ConfigWarning::FragmentSizeTooSmall { .. }));

    let rendered = config.settings_to_toml().unwrap();
    assert!(rendered.contains("hlt10"));
    let reparsed = glint_config::parse_config_str(&rendered, Path::new("rendered")).unwrap();
    let fields = reparsed.highlight.unwrap().fields.unwrap();
    assert_eq!(fields["body"].fragment_size, Some(5));
}
