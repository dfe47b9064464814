//! # mapapi Bridge Layer
//!
//! 跨线程桥接层，负责：
//! - 全局 FIFO 命令队列（UI 线程 → 工作线程）
//! - 工作线程生命周期（独占原生引擎）
//! - 原生句柄的能力令牌保护
//! - 反向通知（引擎事件 → UI 任务队列）
//!
//! 大多数用户应该使用 `mapapi-client` 提供的代理对象，而不是直接提交命令。

pub mod command;
pub mod config;
mod error;
pub mod metrics;
pub mod registry;
mod runtime;
pub mod slot;
mod token;
pub mod ui;
pub mod worker;

pub use command::{BlueSphereChange, NativeCommand};
pub use config::{BridgeConfig, ConfigError};
pub use error::BridgeError;
pub use metrics::{BridgeMetrics, MetricsSnapshot};
pub use registry::ProxyRegistry;
pub use runtime::{BridgeHandle, MapRuntime};
pub use slot::{AtomicProxyState, NativeSlot, ProxyId, ProxyKind, ProxyState};
pub use token::HandleAccess;
pub use ui::{ProjectionSink, UiDispatcher, UiQueue, UiTask};
pub use worker::{NativeWorker, worker_loop};
