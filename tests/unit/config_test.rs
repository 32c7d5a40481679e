//! Tests for configuration validation

use prometheus_timer_queue::config::{QueueConfig, MAX_BASE_DELAY_MS};
use std::time::Duration;

fn valid() -> QueueConfig {
    QueueConfig {
        name: "test-queue".to_string(),
        base_delay_ms: 0,
        soft_delay: true,
        consumer_threads: 2,
    }
}

#[test]
fn test_queue_config_validation() {
    assert!(valid().validate().is_ok());
}

#[test]
fn test_queue_config_empty_name() {
    let invalid = QueueConfig {
        name: "   ".to_string(),
        ..valid()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_queue_config_zero_consumers() {
    let invalid = QueueConfig {
        consumer_threads: 0,
        ..valid()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_queue_config_base_delay_limit() {
    let at_limit = QueueConfig {
        base_delay_ms: MAX_BASE_DELAY_MS,
        ..valid()
    };
    assert!(at_limit.validate().is_ok());

    let over = QueueConfig {
        base_delay_ms: MAX_BASE_DELAY_MS + 1,
        ..valid()
    };
    let err = over.validate().unwrap_err();
    assert!(err.contains("base_delay_ms"));
}

#[test]
fn test_queue_config_from_json() {
    let json = r#"{"name":"json-queue","base_delay_ms":15,"soft_delay":false,"consumer_threads":4}"#;
    let cfg = QueueConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.name, "json-queue");
    assert_eq!(cfg.base_delay(), Duration::from_millis(15));
    assert!(!cfg.soft_delay);
    assert_eq!(cfg.consumer_threads, 4);
}

#[test]
fn test_queue_config_from_json_fills_defaults() {
    let cfg = QueueConfig::from_json_str(r#"{"name":"partial"}"#).unwrap();
    assert_eq!(cfg.name, "partial");
    assert_eq!(cfg.base_delay_ms, 0);
    assert!(cfg.soft_delay);
    assert!(cfg.consumer_threads >= 1);
}

#[test]
fn test_queue_config_from_json_rejects_invalid() {
    assert!(QueueConfig::from_json_str("not json").is_err());
    assert!(QueueConfig::from_json_str(r#"{"consumer_threads":0}"#).is_err());
}

#[test]
fn test_queue_config_serde_roundtrip() {
    let cfg = valid().with_base_delay(Duration::from_millis(7));
    let json = serde_json::to_string(&cfg).unwrap();
    assert_eq!(QueueConfig::from_json_str(&json).unwrap(), cfg);
}

#[test]
fn test_queue_config_builders() {
    let cfg = QueueConfig::new()
        .with_name("built")
        .with_soft_delay(false)
        .with_consumer_threads(6)
        .with_base_delay(Duration::from_secs(1));
    assert_eq!(cfg.name, "built");
    assert!(!cfg.soft_delay);
    assert_eq!(cfg.consumer_threads, 6);
    assert_eq!(cfg.base_delay_ms, 1000);
}
