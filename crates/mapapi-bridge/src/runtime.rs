//! 运行时：工作线程生命周期与 UI 侧入口
//!
//! [`MapRuntime`] 由 UI 线程持有。它启动工作线程、持有 UI 任务队列，
//! 并对外提供可克隆的 [`BridgeHandle`]，代理对象通过它提交命令。

use crate::command::NativeCommand;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::metrics::{BridgeMetrics, MetricsSnapshot};
use crate::ui::UiQueue;
use crate::worker::{NativeWorker, worker_loop};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded, unbounded};
use mapapi_native::NativeEngine;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{error, info, trace};

/// 工作线程句柄
///
/// 线程正常退出时发送停止信号；线程 panic 时发送端被丢弃，接收端看到断开。
struct WorkerThread {
    thread: JoinHandle<()>,
    stopped: Receiver<()>,
}

impl WorkerThread {
    fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// 等待工作线程退出，超时则放弃 join（线程被分离）
    fn shutdown(self, timeout: Duration) -> Result<(), BridgeError> {
        match self.stopped.recv_timeout(timeout) {
            Ok(()) => self
                .thread
                .join()
                .map_err(|_| BridgeError::WorkerThread("worker panicked".to_string())),
            Err(RecvTimeoutError::Disconnected) => {
                let _ = self.thread.join();
                Err(BridgeError::WorkerThread("worker panicked".to_string()))
            },
            Err(RecvTimeoutError::Timeout) => Err(BridgeError::Timeout),
        }
    }
}

/// 命令提交端（UI 线程侧）
///
/// 可以自由克隆，每个代理对象持有一份。所有克隆共享同一个全局 FIFO 队列。
#[derive(Clone, Debug)]
pub struct BridgeHandle {
    tx: Sender<NativeCommand>,
    metrics: Arc<BridgeMetrics>,
}

impl BridgeHandle {
    /// 提交命令（永不阻塞）
    ///
    /// 创建命令会先把槽位切换到 `Pending`；如果队列已关闭则回退。
    pub fn submit(&self, cmd: NativeCommand) -> Result<(), BridgeError> {
        let creating = if cmd.is_creation() {
            let slot = cmd.slot().cloned();
            if let Some(slot) = &slot {
                slot.mark_pending()?;
            }
            slot
        } else {
            None
        };

        trace!("Submitting {:?}", cmd);
        match self.tx.send(cmd) {
            Ok(()) => {
                self.metrics.commands_submitted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            },
            Err(_) => {
                if let Some(slot) = creating {
                    slot.revert_pending();
                }
                Err(BridgeError::ChannelClosed)
            },
        }
    }

    /// 等待之前提交的所有命令在工作线程上执行完毕
    ///
    /// 分离模式下没有线程执行命令，此调用会超时。
    pub fn flush(&self, timeout: Duration) -> Result<(), BridgeError> {
        let (done, rx) = bounded(1);
        self.submit(NativeCommand::Flush { done })?;
        rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => BridgeError::Timeout,
            RecvTimeoutError::Disconnected => BridgeError::ChannelClosed,
        })
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// 地图运行时
pub struct MapRuntime {
    handle: BridgeHandle,
    ui_queue: UiQueue,
    metrics: Arc<BridgeMetrics>,
    config: BridgeConfig,
    is_running: Arc<AtomicBool>,
    worker_thread: Option<WorkerThread>,
}

impl MapRuntime {
    /// 启动工作线程，引擎被移动到该线程并由其独占
    pub fn spawn<E>(engine: E, config: BridgeConfig) -> Result<Self, BridgeError>
    where
        E: NativeEngine + Send + 'static,
    {
        let (mut runtime, worker) = Self::detached(engine, config);

        let is_running = runtime.is_running.clone();
        let config = runtime.config.clone();
        let (stopped_tx, stopped) = bounded(1);
        let thread = std::thread::Builder::new()
            .name(runtime.config.worker_thread_name.clone())
            .spawn(move || {
                worker_loop(worker, config, is_running);
                let _ = stopped_tx.send(());
            })
            .map_err(|e| BridgeError::WorkerThread(e.to_string()))?;

        runtime.worker_thread = Some(WorkerThread { thread, stopped });
        info!("Map runtime started ({})", runtime.config.worker_thread_name);
        Ok(runtime)
    }

    /// 创建不带线程的运行时，工作者交给调用方手动驱动
    pub fn detached<E: NativeEngine>(engine: E, config: BridgeConfig) -> (Self, NativeWorker<E>) {
        let metrics = Arc::new(BridgeMetrics::new());
        let (tx, rx) = unbounded();
        let (dispatcher, ui_queue) = UiQueue::channel(metrics.clone());
        let worker = NativeWorker::new(engine, rx, dispatcher, metrics.clone());

        let runtime = Self {
            handle: BridgeHandle {
                tx,
                metrics: metrics.clone(),
            },
            ui_queue,
            metrics,
            config,
            is_running: Arc::new(AtomicBool::new(true)),
            worker_thread: None,
        };
        (runtime, worker)
    }

    /// 命令提交端（传给代理对象的构造函数）
    pub fn handle(&self) -> &BridgeHandle {
        &self.handle
    }

    /// 执行所有已到达的 UI 任务（必须在 UI 线程上调用）
    pub fn run_ui_tasks(&self) -> usize {
        self.ui_queue.run_pending()
    }

    /// 最多等待 `timeout` 直到有 UI 任务到达，然后执行所有已到达的任务
    pub fn run_ui_tasks_timeout(&self, timeout: Duration) -> usize {
        self.ui_queue.run_pending_timeout(timeout)
    }

    pub fn flush(&self, timeout: Duration) -> Result<(), BridgeError> {
        self.handle.flush(timeout)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// 工作线程是否仍在运行（分离模式下始终为 true）
    pub fn is_healthy(&self) -> bool {
        if !self.is_running.load(Ordering::Acquire) {
            return false;
        }
        self.worker_thread
            .as_ref()
            .is_none_or(|thread| !thread.is_finished())
    }
}

impl Drop for MapRuntime {
    fn drop(&mut self) {
        // Release: 之前的所有写入对工作线程可见
        self.is_running.store(false, Ordering::Release);

        let timeout = self.config.shutdown_timeout();
        match self.worker_thread.take().map(|worker| worker.shutdown(timeout)) {
            Some(Err(BridgeError::Timeout)) => {
                error!("Native worker did not stop within {:?}, detaching", timeout);
            },
            Some(Err(e)) => error!("Native worker shutdown failed: {}", e),
            Some(Ok(())) | None => {},
        }
    }
}
