mod helpers;

use helpers::{write_config, TestResult};
use pomoson_shell_lib::config::{load_from_path, parse_from_path, validate_config, Config};
use pomoson_shell_lib::ShellError;

#[test]
fn loads_full_config() -> TestResult<()> {
    let file = write_config(
        r#"
[proxy]
listen = "127.0.0.1:18080"

[control]
enabled = true
listen = "127.0.0.1:18081"
token = "s3cret"

[renderer]
dev_mode = true

[logging]
level = "debug"
show_target = true

[timeout]
connect_ms = 1000
request_ms = 2000
shutdown_secs = 3
max_body_bytes = 4096

[telemetry]
metrics_port = 19090
otel_log_level = "error"
"#,
    )?;

    let cfg = load_from_path(file.path())?;
    assert_eq!(cfg.proxy.listen.to_string(), "127.0.0.1:18080");
    assert_eq!(cfg.control.listen.to_string(), "127.0.0.1:18081");
    assert_eq!(cfg.control.token, "s3cret");
    assert!(cfg.renderer.dev_mode);
    assert_eq!(cfg.logging.level, "debug");
    assert!(cfg.logging.show_target);
    assert_eq!(cfg.timeout.connect_ms, 1000);
    assert_eq!(cfg.timeout.request_ms, 2000);
    assert_eq!(cfg.timeout.shutdown_secs, 3);
    assert_eq!(cfg.timeout.max_body_bytes, 4096);
    assert_eq!(cfg.telemetry.metrics_port, Some(19090));
    assert_eq!(cfg.telemetry.otel_log_level, "error");
    Ok(())
}

#[test]
fn missing_sections_fall_back_to_defaults() -> TestResult<()> {
    let file = write_config(
        r#"
[control]
token = "abc"
"#,
    )?;

    let cfg = load_from_path(file.path())?;
    let defaults = Config::default();
    assert_eq!(cfg.proxy, defaults.proxy);
    assert_eq!(cfg.timeout, defaults.timeout);
    assert!(cfg.control.enabled);
    assert!(!cfg.renderer.dev_mode);
    assert_eq!(cfg.telemetry.metrics_port, None);
    Ok(())
}

#[test]
fn control_can_be_disabled_without_token() -> TestResult<()> {
    let file = write_config(
        r#"
[control]
enabled = false
"#,
    )?;

    let cfg = load_from_path(file.path())?;
    assert!(!cfg.control.enabled);
    Ok(())
}

#[test]
fn rejects_missing_token() -> TestResult<()> {
    let file = write_config("[control]\nenabled = true\ntoken = \"   \"\n")?;
    assert!(matches!(load_from_path(file.path()), Err(ShellError::Config(_))));
    Ok(())
}

#[test]
fn rejects_non_loopback_listeners() -> TestResult<()> {
    let proxy = write_config("[proxy]\nlisten = \"0.0.0.0:7878\"\n[control]\ntoken = \"t\"\n")?;
    assert!(matches!(load_from_path(proxy.path()), Err(ShellError::Config(_))));

    let control = write_config("[control]\nlisten = \"192.168.1.10:7879\"\ntoken = \"t\"\n")?;
    assert!(matches!(load_from_path(control.path()), Err(ShellError::Config(_))));
    Ok(())
}

#[test]
fn rejects_shared_listen_address() -> TestResult<()> {
    let file = write_config(
        r#"
[proxy]
listen = "127.0.0.1:7000"
[control]
listen = "127.0.0.1:7000"
token = "t"
"#,
    )?;
    assert!(matches!(load_from_path(file.path()), Err(ShellError::Config(_))));
    Ok(())
}

#[test]
fn rejects_zero_timeouts() -> TestResult<()> {
    for field in ["connect_ms", "request_ms", "max_body_bytes"] {
        let file = write_config(&format!("[control]\ntoken = \"t\"\n[timeout]\n{field} = 0\n"))?;
        assert!(
            matches!(load_from_path(file.path()), Err(ShellError::Config(_))),
            "{field} = 0 should be rejected"
        );
    }
    Ok(())
}

#[test]
fn parse_leaves_validation_to_caller() -> TestResult<()> {
    let file = write_config("[control]\nenabled = true\n")?;

    let mut cfg = parse_from_path(file.path())?;
    assert!(validate_config(&cfg).is_err());

    cfg.control.token = "from-env".to_string();
    validate_config(&cfg)?;
    Ok(())
}

#[test]
fn reports_unreadable_and_malformed_files() -> TestResult<()> {
    assert!(matches!(
        load_from_path("/nonexistent/pomoson.toml"),
        Err(ShellError::Config(_))
    ));

    let file = write_config("[proxy\nlisten = ")?;
    assert!(matches!(load_from_path(file.path()), Err(ShellError::Config(_))));

    let file = write_config("[proxy]\nlisten = \"not-an-address\"\n")?;
    assert!(matches!(load_from_path(file.path()), Err(ShellError::Config(_))));
    Ok(())
}
