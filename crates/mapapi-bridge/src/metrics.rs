//! 桥接层性能指标模块
//!
//! 零开销的原子计数器，用于监控命令转发链路和反向通知链路的健康状态。
//! 所有计数器都可以在任何线程安全地读取，不会引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 桥接层实时指标
///
/// # 使用示例
///
/// ```rust
/// use mapapi_bridge::BridgeMetrics;
/// use std::sync::Arc;
/// use std::sync::atomic::Ordering;
///
/// let metrics = Arc::new(BridgeMetrics::default());
///
/// // 在工作线程中更新指标
/// metrics.commands_applied.fetch_add(1, Ordering::Relaxed);
///
/// // 在 UI 线程中读取快照
/// let snapshot = metrics.snapshot();
/// println!("Applied commands: {}", snapshot.commands_applied);
/// ```
#[derive(Debug, Default)]
pub struct BridgeMetrics {
    /// UI 线程提交的命令总数
    pub commands_submitted: AtomicU64,

    /// 工作线程成功执行的命令数
    pub commands_applied: AtomicU64,

    /// 原生引擎报错的命令数
    pub commands_failed: AtomicU64,

    /// 因句柄不可用（未创建/已销毁）而丢弃的命令数
    ///
    /// 原生创建失败后，该代理的后续修改都会计入这里。
    pub commands_dropped: AtomicU64,

    /// 从引擎收到的事件数
    pub events_received: AtomicU64,

    /// 找不到接收者的事件数（代理已销毁或已释放）
    pub events_unrouted: AtomicU64,

    /// 投递到 UI 队列的任务数
    pub ui_tasks_posted: AtomicU64,

    /// UI 线程已执行的任务数
    pub ui_tasks_run: AtomicU64,
}

impl BridgeMetrics {
    /// 创建新的指标实例（所有计数器初始化为 0）
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指标快照
    ///
    /// 不同计数器之间可能有微小的时间差。
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            commands_submitted: self.commands_submitted.load(Ordering::Relaxed),
            commands_applied: self.commands_applied.load(Ordering::Relaxed),
            commands_failed: self.commands_failed.load(Ordering::Relaxed),
            commands_dropped: self.commands_dropped.load(Ordering::Relaxed),
            events_received: self.events_received.load(Ordering::Relaxed),
            events_unrouted: self.events_unrouted.load(Ordering::Relaxed),
            ui_tasks_posted: self.ui_tasks_posted.load(Ordering::Relaxed),
            ui_tasks_run: self.ui_tasks_run.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.commands_submitted.store(0, Ordering::Relaxed);
        self.commands_applied.store(0, Ordering::Relaxed);
        self.commands_failed.store(0, Ordering::Relaxed);
        self.commands_dropped.store(0, Ordering::Relaxed);
        self.events_received.store(0, Ordering::Relaxed);
        self.events_unrouted.store(0, Ordering::Relaxed);
        self.ui_tasks_posted.store(0, Ordering::Relaxed);
        self.ui_tasks_run.store(0, Ordering::Relaxed);
    }
}

/// 指标快照（不可变，用于读取）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub commands_submitted: u64,
    pub commands_applied: u64,
    pub commands_failed: u64,
    pub commands_dropped: u64,
    pub events_received: u64,
    pub events_unrouted: u64,
    pub ui_tasks_posted: u64,
    pub ui_tasks_run: u64,
}

impl MetricsSnapshot {
    /// 已被工作线程处理（无论成败）的命令数
    pub fn commands_processed(&self) -> u64 {
        self.commands_applied + self.commands_failed + self.commands_dropped
    }

    /// 尚未被工作线程处理的命令数
    pub fn commands_in_flight(&self) -> u64 {
        self.commands_submitted.saturating_sub(self.commands_processed())
    }

    /// 命令失败率（百分比，包括丢弃）
    ///
    /// 如果还没有处理过命令，返回 0.0。
    pub fn failure_rate(&self) -> f64 {
        let processed = self.commands_processed();
        if processed == 0 {
            return 0.0;
        }
        ((self.commands_failed + self.commands_dropped) as f64 / processed as f64) * 100.0
    }
}
