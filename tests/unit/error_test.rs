//! Tests for error types

use prometheus_timer_queue::core::QueueError;
use std::io;

#[test]
fn test_soft_delay_disabled_error() {
    let err = QueueError::SoftDelayDisabled("retries".to_string());
    assert_eq!(format!("{}", err), "soft delay is disabled for queue `retries`");
}

#[test]
fn test_invalid_config_error() {
    let err = QueueError::InvalidConfig("name must not be empty".to_string());
    assert_eq!(format!("{}", err), "invalid configuration: name must not be empty");
}

#[test]
fn test_spawn_error_from_io() {
    let err: QueueError = io::Error::new(io::ErrorKind::WouldBlock, "no threads left").into();
    assert!(matches!(err, QueueError::Spawn(_)));
    assert_eq!(format!("{}", err), "failed to spawn consumer thread: no threads left");
}

#[test]
fn test_error_converts_to_anyhow() {
    let result: prometheus_timer_queue::AppResult<()> =
        Err(QueueError::SoftDelayDisabled("q".to_string()).into());
    let err = result.unwrap_err();
    assert!(err.downcast_ref::<QueueError>().is_some());
}
