/*!
 * Tests for configuration loading and validation
 */

use std::fs;

use scribe2srt::app_config::{Config, LogLevel};

use crate::common::create_temp_dir;

#[test]
fn test_load_with_explicit_path_should_read_nested_sections() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");
    fs::write(
        &path,
        r#"{
            "subtitle": { "min_gap": 0.1, "cjk_chars_per_line": 18 },
            "tuning": { "benefit_threshold": 8.0 },
            "transcription": { "language": "ja", "max_concurrent": 5, "concurrent": false },
            "log_level": "debug"
        }"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.subtitle.min_gap, 0.1);
    assert_eq!(config.subtitle.cjk_chars_per_line, 18);
    assert_eq!(config.subtitle.latin_chars_per_line, 42);
    assert_eq!(config.tuning.benefit_threshold, 8.0);
    assert_eq!(config.transcription.language, "ja");
    assert_eq!(config.transcription.max_concurrent, 5);
    assert!(!config.transcription.concurrent);
    assert_eq!(config.transcription.max_retries, 3);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_should_not_write_the_config_file() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");
    fs::write(&path, "{}").unwrap();

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    assert_eq!(config.transcription.split_duration_secs(), 5400.0);
}

#[test]
fn test_load_with_malformed_file_should_fail() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");
    fs::write(&path, "{ not json").unwrap();

    assert!(Config::load(Some(&path)).is_err());
}

#[test]
fn test_validate_with_unknown_language_should_fail() {
    let mut config = Config::default();
    config.transcription.language = "xx-invalid".to_string();
    assert!(config.validate().is_err());

    config.transcription.language = "auto".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_with_negative_gap_should_fail() {
    let mut config = Config::default();
    config.subtitle.min_gap = -0.5;
    assert!(config.validate().is_err());
}
