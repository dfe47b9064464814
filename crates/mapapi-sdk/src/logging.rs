//! 日志初始化
//!
//! 安装 `tracing-subscriber` 的 fmt 输出，过滤规则来自 `RUST_LOG`，
//! 并追加一条默认指令。`log` crate 的记录通过 `tracing-log` 转发。

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{Directive, ParseError};

/// 默认日志指令：所有 mapapi crate 输出 info 及以上
pub const DEFAULT_LOG_DIRECTIVE: &str = "mapapi=info";

/// 使用默认指令初始化日志
///
/// 返回本次调用是否安装了全局订阅者；重复调用是安全的，之后的调用返回 false。
pub fn init_logging() -> bool {
    init_logging_with(DEFAULT_LOG_DIRECTIVE).unwrap_or(false)
}

/// 使用指定指令初始化日志
///
/// 指令格式与 `RUST_LOG` 相同，例如 `"mapapi_bridge=trace"`。
pub fn init_logging_with(directive: &str) -> Result<bool, ParseError> {
    let directive: Directive = directive.parse()?;
    let filter = EnvFilter::from_default_env().add_directive(directive);
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return Ok(false);
    }

    // 全局订阅者只能安装一次，因此这里最多执行一次
    let _ = tracing_log::LogTracer::builder()
        .with_max_level(log::LevelFilter::Trace)
        .init();

    tracing::debug!("Logging initialized");
    Ok(true)
}
