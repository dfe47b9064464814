//! 日志初始化测试
//!
//! 全局订阅者每个进程只能安装一次，因此这些测试放在独立的测试二进制中。

use mapapi_sdk::{DEFAULT_LOG_DIRECTIVE, init_logging, init_logging_with};

#[test]
fn test_init_logging_is_idempotent() {
    assert!(init_logging());
    assert!(!init_logging());
    assert!(matches!(init_logging_with("mapapi_bridge=trace"), Ok(false)));

    // log crate 的记录经 tracing-log 转发，不应 panic
    log::info!("log record bridged into tracing");
    tracing::info!(directive = DEFAULT_LOG_DIRECTIVE, "tracing record");
}

#[test]
fn test_invalid_directive_is_rejected() {
    assert!(init_logging_with("mapapi=verbose").is_err());
}
