mod common;
use crate::common::builders::RawConfigBuilder;

use std::collections::HashMap;
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use buildlog::cli::CliArgs;
use buildlog::config::{
    BuildLoggerConfig, FILTER_CMD_ENV, LOG_PATH_ENV, apply_overrides_from, load_and_validate,
};
use buildlog::errors::BuildLogError;
use buildlog::resolve_config;
use clap::Parser;
use tempfile::NamedTempFile;

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn loads_full_logger_section() -> TestResult {
    let file = write_config(
        r#"
        [logger]
        log_path = "/var/log/build/out.log.gz"
        filter_cmd = "grep -v 'noise here'"

        [logger.env]
        PATH = "/usr/bin:/bin"
        LANG = "C"
        "#,
    )?;

    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.log_path, Some(PathBuf::from("/var/log/build/out.log.gz")));
    let filter = cfg.filter.expect("filter should be parsed");
    assert_eq!(filter.program(), "grep");
    assert_eq!(filter.args(), ["-v", "noise here"]);

    let env = cfg.environment.expect("environment should be set");
    assert_eq!(env.get("LANG").map(String::as_str), Some("C"));
    assert_eq!(env.len(), 2);
    Ok(())
}

#[test]
fn empty_file_is_the_default_config() -> TestResult {
    let file = write_config("")?;
    assert_eq!(load_and_validate(file.path())?, BuildLoggerConfig::default());
    Ok(())
}

#[test]
fn malformed_toml_is_rejected() -> TestResult {
    let broken = write_config("[logger\nlog_path = \n")?;
    assert!(matches!(
        load_and_validate(broken.path()),
        Err(BuildLogError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let result = load_and_validate("/nonexistent/buildlog.toml");
    assert!(matches!(result, Err(BuildLogError::IoError(_))));
}

#[test]
fn empty_log_path_is_rejected() {
    let raw = RawConfigBuilder::new().log_path("").build();
    assert!(matches!(
        BuildLoggerConfig::try_from(raw),
        Err(BuildLogError::ConfigError(_))
    ));
}

#[test]
fn malformed_env_names_are_rejected() {
    for key in ["", "A=B"] {
        let raw = RawConfigBuilder::new().env(key, "value").build();
        assert!(
            matches!(BuildLoggerConfig::try_from(raw), Err(BuildLogError::ConfigError(_))),
            "env key {key:?} should be rejected"
        );
    }
}

#[test]
fn unbalanced_filter_quoting_is_rejected() {
    let raw = RawConfigBuilder::new()
        .log_path("/tmp/build.log")
        .filter_cmd("sed 's/a/b/")
        .build();
    assert!(matches!(
        BuildLoggerConfig::try_from(raw),
        Err(BuildLogError::ConfigError(_))
    ));
}

#[test]
fn blank_filter_means_no_filter() -> TestResult {
    let raw = RawConfigBuilder::new()
        .log_path("/tmp/build.log")
        .filter_cmd("   ")
        .build();
    let cfg = BuildLoggerConfig::try_from(raw)?;
    assert!(cfg.filter.is_none());
    Ok(())
}

#[test]
fn environment_overrides_file_values() -> TestResult {
    let base = BuildLoggerConfig::new()
        .with_log_path("/from/file.log")
        .with_filter_cmd("cat")?;

    let cfg = apply_overrides_from(
        base,
        lookup_from(&[(FILTER_CMD_ENV, "tr a-z A-Z"), (LOG_PATH_ENV, "/from/env.log")]),
    )?;

    assert_eq!(cfg.log_path, Some(PathBuf::from("/from/env.log")));
    assert_eq!(cfg.filter.map(|f| f.to_string()).as_deref(), Some("tr a-z A-Z"));
    Ok(())
}

#[test]
fn empty_filter_variable_disables_filter_and_empty_path_is_ignored() -> TestResult {
    let base = BuildLoggerConfig::new()
        .with_log_path("/from/file.log")
        .with_filter_cmd("cat")?;

    let cfg = apply_overrides_from(base, lookup_from(&[(FILTER_CMD_ENV, ""), (LOG_PATH_ENV, "")]))?;

    assert!(cfg.filter.is_none());
    assert_eq!(cfg.log_path, Some(PathBuf::from("/from/file.log")));
    Ok(())
}

#[test]
fn unset_variables_leave_config_untouched() -> TestResult {
    let base = BuildLoggerConfig::new()
        .with_log_path("/from/file.log")
        .with_filter_cmd("cat")?;

    let cfg = apply_overrides_from(base.clone(), |_| None)?;
    assert_eq!(cfg, base);
    Ok(())
}

#[test]
fn cli_flags_take_precedence_over_file() -> TestResult {
    let file = write_config(
        r#"
        [logger]
        log_path = "/from/file.log"
        filter_cmd = "cat"
        "#,
    )?;
    let config_path = file.path().to_string_lossy().into_owned();

    let args = CliArgs::parse_from([
        "buildlog",
        "--config",
        config_path.as_str(),
        "--log-file",
        "/from/cli.log.gz",
        "--filter",
        "",
        "--",
        "make",
        "-j4",
    ]);
    assert_eq!(args.command, ["make", "-j4"]);

    let cfg = resolve_config(&args)?;
    assert_eq!(cfg.log_path, Some(PathBuf::from("/from/cli.log.gz")));
    assert!(cfg.filter.is_none(), "empty --filter disables the file's filter");
    Ok(())
}

#[test]
fn cli_filter_with_bad_quoting_fails_resolution() {
    let args = CliArgs::parse_from(["buildlog", "--filter", "awk '{print $1}"]);
    assert!(resolve_config(&args).is_err());
}
