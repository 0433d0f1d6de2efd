// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::time::Duration;

use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

use quill::config::Settings;
use quill::error::QuillError;

#[test]
fn test_settings_default_values() {
    let settings = Settings::default();

    assert_eq!(
        settings.providers.anthropic.default_model,
        "claude-sonnet-4-20250514"
    );
    assert!((settings.defaults.temperature - 0.7).abs() < f32::EPSILON);
    assert_eq!(settings.defaults.max_tokens, 1024);
    assert!(settings.defaults.stream);
    assert!(settings.defaults.system_prompt.is_none());
    assert_eq!(settings.streaming.channel_capacity, 100);
}

#[test]
fn test_partial_file_fills_in_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{"defaults": {"stream": false}, "providers": {"anthropic": {"default_model": "claude-test"}}}"#,
    )
    .unwrap();

    let settings = assert_ok!(Settings::load_from(&path));
    assert!(!settings.defaults.stream);
    assert_eq!(settings.defaults.max_tokens, 1024);
    assert_eq!(settings.providers.anthropic.default_model, "claude-test");
    assert_eq!(settings.providers.anthropic.api_key_env, "ANTHROPIC_API_KEY");
    assert_eq!(settings.resilience.max_retries, 3);
}

#[test]
fn test_invalid_file_is_rejected_on_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");

    std::fs::write(&path, r#"{"streaming": {"channel_capacity": 0}}"#).unwrap();
    let err = assert_err!(Settings::load_from(&path));
    assert!(matches!(err, QuillError::Config(_)));

    std::fs::write(&path, "{ not json").unwrap();
    let err = assert_err!(Settings::load_from(&path));
    assert!(matches!(err, QuillError::Json(_)));
}

#[test]
fn test_save_round_trip_keeps_foreign_keys() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested/settings.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        r#"{"defaults": {"max_tokens": 10, "shell_timeout": 30}, "plugins": ["a"]}"#,
    )
    .unwrap();

    let mut settings = Settings::load_from(&path).unwrap();
    settings.defaults.max_tokens = 2048;
    settings.save_to(&path).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["defaults"]["max_tokens"], 2048);
    assert_eq!(raw["defaults"]["shell_timeout"], 30);
    assert_eq!(raw["plugins"][0], "a");
    assert_eq!(Settings::load_from(&path).unwrap().defaults.max_tokens, 2048);
}

#[test]
fn test_api_key_env_takes_priority_over_file() {
    let mut settings = Settings::default();
    settings.providers.anthropic.api_key_env = "QUILL_CONFIG_TEST_KEY_7781".to_string();
    settings.providers.anthropic.api_key = Some("config-key".to_string());

    std::env::remove_var("QUILL_CONFIG_TEST_KEY_7781");
    assert_eq!(settings.get_anthropic_api_key().as_deref(), Some("config-key"));

    std::env::set_var("QUILL_CONFIG_TEST_KEY_7781", "env-key");
    assert_eq!(settings.get_anthropic_api_key().as_deref(), Some("env-key"));

    std::env::set_var("QUILL_CONFIG_TEST_KEY_7781", "");
    assert_eq!(settings.get_anthropic_api_key().as_deref(), Some("config-key"));
    std::env::remove_var("QUILL_CONFIG_TEST_KEY_7781");
}

#[test]
fn test_backoff_doubles_until_capped() {
    let resilience = Settings::default().resilience;

    assert_eq!(resilience.backoff(1, None), Duration::from_millis(1000));
    assert_eq!(resilience.backoff(2, None), Duration::from_millis(2000));
    assert_eq!(resilience.backoff(3, None), Duration::from_millis(4000));
    assert_eq!(resilience.backoff(10, None), Duration::from_millis(16000));
    assert_eq!(resilience.backoff(1, Some(30)), Duration::from_secs(30));
}

#[test]
fn test_set_value_persists_through_save() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("settings.json");

    let mut settings = assert_ok!(Settings::load_from(&path));
    assert_ok!(settings.set_value("max_tokens", "4096"));
    assert_ok!(settings.set_value("base_url", "http://localhost:9999/v1/messages"));
    settings.save_to(&path).unwrap();

    let loaded = assert_ok!(Settings::load_from(&path));
    assert_eq!(loaded.defaults.max_tokens, 4096);
    assert_eq!(
        loaded.get_value("base_url").unwrap(),
        "http://localhost:9999/v1/messages"
    );

    assert_err!(settings.set_value("channel_capacity", "0"));
    assert_eq!(settings.streaming.channel_capacity, 100);
}
