//! UI 线程任务队列（反向通知）
//!
//! 工作线程从不直接修改 UI 侧缓存。引擎推送的状态被包装成任务，
//! 投递到 UI 队列，由 UI 线程调用 [`UiQueue::run_pending`] 时执行。

use crate::metrics::BridgeMetrics;
use crate::slot::ProxyId;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use mapapi_geometry::ProjectedState;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

/// UI 线程任务
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// 反向通知接收端（由代理对象实现，供桥接层调用）
///
/// `apply_projected_state` 只会在 UI 线程上、通过 UI 队列被调用。
pub trait ProjectionSink: Send + Sync {
    fn proxy_id(&self) -> ProxyId;

    fn apply_projected_state(&self, state: ProjectedState);
}

/// UI 任务投递端（工作线程持有）
#[derive(Clone)]
pub struct UiDispatcher {
    tx: Sender<UiTask>,
    metrics: Arc<BridgeMetrics>,
}

impl UiDispatcher {
    /// 投递任务；UI 队列已关闭时返回 false
    pub fn post(&self, task: UiTask) -> bool {
        let posted = self.tx.send(task).is_ok();
        if posted {
            self.metrics.ui_tasks_posted.fetch_add(1, Ordering::Relaxed);
        }
        posted
    }
}

/// UI 任务队列（UI 线程持有）
pub struct UiQueue {
    rx: Receiver<UiTask>,
    metrics: Arc<BridgeMetrics>,
}

impl UiQueue {
    /// 创建一对投递端/队列
    pub fn channel(metrics: Arc<BridgeMetrics>) -> (UiDispatcher, UiQueue) {
        let (tx, rx) = unbounded();
        (
            UiDispatcher {
                tx,
                metrics: metrics.clone(),
            },
            UiQueue { rx, metrics },
        )
    }

    /// 执行所有已到达的任务（非阻塞），返回执行数量
    pub fn run_pending(&self) -> usize {
        let mut count = 0;
        while let Ok(task) = self.rx.try_recv() {
            self.run(task);
            count += 1;
        }
        count
    }

    /// 最多等待 `timeout` 直到第一个任务到达，然后执行所有已到达的任务
    pub fn run_pending_timeout(&self, timeout: Duration) -> usize {
        match self.rx.recv_timeout(timeout) {
            Ok(task) => {
                self.run(task);
                1 + self.run_pending()
            },
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    fn run(&self, task: UiTask) {
        task();
        self.metrics.ui_tasks_run.fetch_add(1, Ordering::Relaxed);
    }
}
