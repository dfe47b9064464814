//! 工作线程：独占原生引擎，按 FIFO 顺序执行转发命令
//!
//! [`NativeWorker`] 持有引擎、命令接收端、反向通知注册表和唯一的
//! [`HandleAccess`] 令牌。它既可以由 [`worker_loop`] 在专用线程上驱动，
//! 也可以在分离模式下由调用方手动单步执行（测试和嵌入场景）。

use crate::command::{BlueSphereChange, NativeCommand};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::metrics::BridgeMetrics;
use crate::registry::ProxyRegistry;
use crate::slot::{NativeSlot, ProxyKind, ProxyState};
use crate::token::HandleAccess;
use crate::ui::UiDispatcher;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use mapapi_native::{EngineEvent, NativeEngine, NativeHandle};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, trace, warn};

/// 原生工作者
pub struct NativeWorker<E: NativeEngine> {
    engine: E,
    commands: Receiver<NativeCommand>,
    registry: ProxyRegistry,
    ui: UiDispatcher,
    access: HandleAccess,
    metrics: Arc<BridgeMetrics>,
}

impl<E: NativeEngine> NativeWorker<E> {
    pub(crate) fn new(
        engine: E,
        commands: Receiver<NativeCommand>,
        ui: UiDispatcher,
        metrics: Arc<BridgeMetrics>,
    ) -> Self {
        Self {
            engine,
            commands,
            registry: ProxyRegistry::new(),
            ui,
            access: HandleAccess::new(),
            metrics,
        }
    }

    /// 已登记反向通知的代理数量
    pub fn registered_proxies(&self) -> usize {
        self.registry.len()
    }

    /// 执行所有已入队的命令（非阻塞），返回执行数量
    pub fn run_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(cmd) = self.commands.try_recv() {
            self.apply_logged(cmd);
            count += 1;
        }
        count
    }

    /// 取出所有待处理的引擎事件并分发，返回事件数量
    pub fn poll_events(&mut self) -> usize {
        let mut count = 0;
        loop {
            match self.engine.try_poll_event() {
                Ok(Some(event)) => {
                    self.dispatch_event(event);
                    count += 1;
                },
                Ok(None) => break,
                Err(e) => {
                    error!("Native engine poll error: {}", e);
                    break;
                },
            }
        }
        count
    }

    /// 执行一轮：先执行命令，再分发事件
    pub fn step(&mut self) -> usize {
        self.run_pending() + self.poll_events()
    }

    /// 执行命令并记录结果
    ///
    /// 工作线程上的失败不会传回 UI 线程：句柄不可用的命令被丢弃并记录警告，
    /// 引擎错误记录为错误。
    pub fn apply_logged(&mut self, cmd: NativeCommand) {
        if let NativeCommand::Flush { done } = cmd {
            // 先计数再回复：等待方醒来后读到的指标包含之前的所有命令
            self.metrics.commands_applied.fetch_add(1, Ordering::Relaxed);
            let _ = done.send(());
            return;
        }

        let name = cmd.name();
        let proxy = cmd.slot().map(|slot| slot.id());
        trace!("Applying {:?}", cmd);

        match self.apply(cmd) {
            Ok(()) => {
                self.metrics.commands_applied.fetch_add(1, Ordering::Relaxed);
            },
            Err(e @ (BridgeError::NotReady | BridgeError::Destroyed)) => {
                self.metrics.commands_dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Dropped {} for {:?}: {}", name, proxy, e);
            },
            Err(e) => {
                self.metrics.commands_failed.fetch_add(1, Ordering::Relaxed);
                error!("{} for {:?} failed: {}", name, proxy, e);
            },
        }
    }

    /// 执行单个命令
    pub fn apply(&mut self, cmd: NativeCommand) -> Result<(), BridgeError> {
        match cmd {
            NativeCommand::CreatePositioner { slot, location } => {
                let created = self.engine.create_positioner(&location);
                self.finish_creation(&slot, created)
            },
            NativeCommand::RegisterPositioner { slot, sink } => {
                let handle = self.handle_of(&slot)?;
                self.registry.register(handle, sink);
                debug!("Registered {} as {}", slot.id(), handle);
                Ok(())
            },
            NativeCommand::UpdatePositionerLocation { slot, location } => {
                let handle = self.handle_of(&slot)?;
                self.engine.update_positioner_location(handle, &location)?;
                Ok(())
            },
            NativeCommand::DestroyPositioner { slot } => match slot.release(&self.access) {
                Some(handle) => {
                    self.registry.unregister(handle);
                    self.engine.destroy_positioner(handle)?;
                    debug!("Destroyed {} ({})", slot.id(), handle);
                    Ok(())
                },
                None => {
                    debug!("Destroyed {} before native creation", slot.id());
                    Ok(())
                },
            },
            NativeCommand::CreateBlueSphere { slot } => {
                let created = self.engine.create_blue_sphere();
                self.finish_creation(&slot, created)
            },
            NativeCommand::UpdateBlueSphere { slot, change } => {
                let handle = self.handle_of(&slot)?;
                self.apply_blue_sphere_change(handle, change)
            },
            NativeCommand::Flush { done } => {
                let _ = done.send(());
                Ok(())
            },
        }
    }

    fn handle_of(&self, slot: &NativeSlot) -> Result<NativeHandle, BridgeError> {
        slot.native_handle(Some(&self.access))
    }

    fn finish_creation(
        &mut self,
        slot: &NativeSlot,
        created: Result<NativeHandle, mapapi_native::NativeError>,
    ) -> Result<(), BridgeError> {
        match created {
            Ok(handle) => {
                if let Err(e) = slot.complete_creation(handle, &self.access) {
                    // 槽位已不在 Pending，原生对象无人认领
                    if slot.kind() == ProxyKind::Positioner
                        && let Err(destroy_err) = self.engine.destroy_positioner(handle)
                    {
                        warn!("Failed to destroy orphaned {}: {}", handle, destroy_err);
                    }
                    return match slot.state() {
                        ProxyState::Destroyed => Err(BridgeError::Destroyed),
                        _ => Err(e),
                    };
                }
                debug!("Created {:?} {} as {}", slot.kind(), slot.id(), handle);
                Ok(())
            },
            Err(e) => {
                slot.fail_creation(&self.access);
                Err(e.into())
            },
        }
    }

    fn apply_blue_sphere_change(
        &mut self,
        handle: NativeHandle,
        change: BlueSphereChange,
    ) -> Result<(), BridgeError> {
        match change {
            BlueSphereChange::Enabled(enabled) => {
                self.engine.set_blue_sphere_enabled(handle, enabled)?
            },
            BlueSphereChange::Position(position) => {
                self.engine.set_blue_sphere_position(handle, position)?
            },
            BlueSphereChange::Direction(direction) => {
                self.engine.set_blue_sphere_direction(handle, direction)?
            },
            BlueSphereChange::Elevation(elevation) => {
                self.engine.set_blue_sphere_elevation(handle, elevation)?
            },
            BlueSphereChange::IndoorMap {
                indoor_map_id,
                indoor_floor_id,
            } => self
                .engine
                .set_blue_sphere_indoor_map(handle, &indoor_map_id, indoor_floor_id)?,
        }
        Ok(())
    }

    fn dispatch_event(&mut self, event: EngineEvent) {
        self.metrics.events_received.fetch_add(1, Ordering::Relaxed);

        let handle = event.handle();
        let Some(sink) = self.registry.lookup(handle) else {
            self.metrics.events_unrouted.fetch_add(1, Ordering::Relaxed);
            trace!("No proxy registered for {}, event ignored", handle);
            return;
        };
        trace!("Routing event for {} to {}", handle, sink.proxy_id());

        match event {
            EngineEvent::PositionerProjected { state, .. } => {
                if !self.ui.post(Box::new(move || sink.apply_projected_state(state))) {
                    warn!("UI queue closed, projection for {} discarded", handle);
                }
            },
        }
    }
}

/// 工作线程主循环
///
/// 等待命令最多 `poll_interval`，执行所有已入队的命令，然后分发引擎事件。
/// 运行标志被清除或命令通道断开时退出；退出前执行剩余命令。
///
/// # 参数
/// - `worker`: 工作者（独占引擎）
/// - `config`: 桥接配置
/// - `is_running`: 运行标志（用于生命周期联动）
pub fn worker_loop<E: NativeEngine>(
    mut worker: NativeWorker<E>,
    config: BridgeConfig,
    is_running: Arc<AtomicBool>,
) {
    let poll_interval = config.poll_interval();
    info!("Native worker started (poll interval {:?})", poll_interval);

    loop {
        // Acquire: 看到 false 时，必须能看到其他线程之前的所有写入
        if !is_running.load(Ordering::Acquire) {
            trace!("Native worker: is_running flag is false, exiting");
            break;
        }

        match worker.commands.recv_timeout(poll_interval) {
            Ok(cmd) => {
                worker.apply_logged(cmd);
                worker.run_pending();
            },
            Err(RecvTimeoutError::Timeout) => {},
            Err(RecvTimeoutError::Disconnected) => {
                info!("Native worker: command channel disconnected, exiting");
                break;
            },
        }

        worker.poll_events();
    }

    let remaining = worker.run_pending();
    if remaining > 0 {
        debug!("Native worker applied {} queued commands before exit", remaining);
    }
    info!("Native worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{ProjectionSink, UiQueue};
    use crossbeam_channel::{Sender, unbounded};
    use mapapi_geometry::{LatLng, PositionerLocation, ProjectedState, ScreenPoint};
    use mapapi_native::{MockEngine, MockProbe, NativeCall};
    use std::sync::{Mutex, Weak};

    struct Fixture {
        tx: Sender<NativeCommand>,
        worker: NativeWorker<MockEngine>,
        probe: MockProbe,
        ui: UiQueue,
        metrics: Arc<BridgeMetrics>,
    }

    fn fixture() -> Fixture {
        let (engine, probe) = MockEngine::new();
        let metrics = Arc::new(BridgeMetrics::new());
        let (dispatcher, ui) = UiQueue::channel(metrics.clone());
        let (tx, rx) = unbounded();
        Fixture {
            tx,
            worker: NativeWorker::new(engine, rx, dispatcher, metrics.clone()),
            probe,
            ui,
            metrics,
        }
    }

    fn location_at(lat: f64, lng: f64) -> PositionerLocation {
        PositionerLocation {
            position: LatLng::new(lat, lng),
            ..Default::default()
        }
    }

    fn pending_slot(kind: ProxyKind) -> Arc<NativeSlot> {
        let slot = Arc::new(NativeSlot::new(kind));
        slot.mark_pending().unwrap();
        slot
    }

    struct RecordingSink {
        slot: Arc<NativeSlot>,
        states: Mutex<Vec<ProjectedState>>,
    }

    impl ProjectionSink for RecordingSink {
        fn proxy_id(&self) -> crate::slot::ProxyId {
            self.slot.id()
        }

        fn apply_projected_state(&self, state: ProjectedState) {
            self.states.lock().unwrap().push(state);
        }
    }

    #[test]
    fn test_create_makes_slot_ready() {
        let mut f = fixture();
        let slot = pending_slot(ProxyKind::Positioner);
        f.tx.send(NativeCommand::CreatePositioner {
            slot: slot.clone(),
            location: location_at(1.0, 2.0),
        })
        .unwrap();

        assert_eq!(slot.state(), ProxyState::Pending);
        assert_eq!(f.worker.run_pending(), 1);
        assert_eq!(slot.state(), ProxyState::Ready);
        assert_eq!(f.probe.live_positioners(), vec![NativeHandle::new(1)]);
    }

    #[test]
    fn test_commands_apply_in_fifo_order() {
        let mut f = fixture();
        let slot = pending_slot(ProxyKind::Positioner);
        let l0 = location_at(0.0, 0.0);
        let l1 = location_at(10.0, 10.0);
        let l2 = location_at(20.0, 20.0);

        f.tx.send(NativeCommand::CreatePositioner {
            slot: slot.clone(),
            location: l0.clone(),
        })
        .unwrap();
        for location in [l1.clone(), l2.clone()] {
            f.tx.send(NativeCommand::UpdatePositionerLocation {
                slot: slot.clone(),
                location,
            })
            .unwrap();
        }
        f.worker.run_pending();

        let handle = NativeHandle::new(1);
        assert_eq!(
            f.probe.calls(),
            vec![
                NativeCall::CreatePositioner {
                    handle,
                    location: l0
                },
                NativeCall::UpdatePositionerLocation {
                    handle,
                    location: l1
                },
                NativeCall::UpdatePositionerLocation {
                    handle,
                    location: l2.clone()
                },
            ]
        );
        assert_eq!(f.probe.positioner_location(handle), Some(l2));
        assert_eq!(f.metrics.snapshot().commands_applied, 3);
    }

    #[test]
    fn test_failed_creation_drops_later_commands() {
        let mut f = fixture();
        f.probe.fail_next_create();
        let slot = pending_slot(ProxyKind::Positioner);

        f.tx.send(NativeCommand::CreatePositioner {
            slot: slot.clone(),
            location: PositionerLocation::default(),
        })
        .unwrap();
        f.tx.send(NativeCommand::UpdatePositionerLocation {
            slot: slot.clone(),
            location: location_at(5.0, 5.0),
        })
        .unwrap();
        f.worker.run_pending();

        assert_eq!(slot.state(), ProxyState::Uninitialized);
        assert_eq!(f.probe.call_count(), 0);
        let snapshot = f.metrics.snapshot();
        assert_eq!(snapshot.commands_failed, 1);
        assert_eq!(snapshot.commands_dropped, 1);
    }

    #[test]
    fn test_destroy_releases_handle_and_unregisters() {
        let mut f = fixture();
        let slot = pending_slot(ProxyKind::Positioner);
        let sink = Arc::new(RecordingSink {
            slot: slot.clone(),
            states: Mutex::new(Vec::new()),
        });
        let weak: Weak<dyn ProjectionSink> = Arc::downgrade(&sink) as Weak<dyn ProjectionSink>;

        f.tx.send(NativeCommand::CreatePositioner {
            slot: slot.clone(),
            location: PositionerLocation::default(),
        })
        .unwrap();
        f.tx.send(NativeCommand::RegisterPositioner {
            slot: slot.clone(),
            sink: weak,
        })
        .unwrap();
        f.worker.run_pending();
        assert_eq!(f.worker.registered_proxies(), 1);

        f.tx.send(NativeCommand::DestroyPositioner { slot: slot.clone() })
            .unwrap();
        f.worker.run_pending();

        assert_eq!(slot.state(), ProxyState::Destroyed);
        assert_eq!(f.worker.registered_proxies(), 0);
        assert!(f.probe.live_positioners().is_empty());

        // 销毁后的事件无人接收
        f.probe
            .push_projection(NativeHandle::new(1), ProjectedState::default());
        assert_eq!(f.worker.poll_events(), 1);
        assert_eq!(f.metrics.snapshot().events_unrouted, 1);
        assert!(f.ui.is_empty());
    }

    #[test]
    fn test_destroy_before_creation_is_harmless() {
        let mut f = fixture();
        let slot = Arc::new(NativeSlot::new(ProxyKind::Positioner));
        f.tx.send(NativeCommand::DestroyPositioner { slot: slot.clone() })
            .unwrap();
        f.worker.run_pending();

        assert_eq!(slot.state(), ProxyState::Destroyed);
        assert_eq!(f.probe.call_count(), 0);
        assert_eq!(f.metrics.snapshot().commands_applied, 1);
    }

    #[test]
    fn test_orphaned_creation_is_destroyed() {
        let mut f = fixture();
        let slot = pending_slot(ProxyKind::Positioner);

        // 销毁先于创建完成：引擎创建出的对象无人认领
        f.tx.send(NativeCommand::DestroyPositioner { slot: slot.clone() })
            .unwrap();
        f.tx.send(NativeCommand::CreatePositioner {
            slot: slot.clone(),
            location: PositionerLocation::default(),
        })
        .unwrap();
        f.worker.run_pending();

        let handle = NativeHandle::new(1);
        assert_eq!(slot.state(), ProxyState::Destroyed);
        assert!(f.probe.live_positioners().is_empty());
        assert_eq!(
            f.probe.calls(),
            vec![
                NativeCall::CreatePositioner {
                    handle,
                    location: PositionerLocation::default()
                },
                NativeCall::DestroyPositioner { handle },
            ]
        );

        let snapshot = f.metrics.snapshot();
        assert_eq!(snapshot.commands_applied, 1);
        assert_eq!(snapshot.commands_dropped, 1);
        assert_eq!(snapshot.commands_failed, 0);
    }

    #[test]
    fn test_projection_routed_to_ui_queue() {
        let mut f = fixture();
        let slot = pending_slot(ProxyKind::Positioner);
        let sink = Arc::new(RecordingSink {
            slot: slot.clone(),
            states: Mutex::new(Vec::new()),
        });

        f.tx.send(NativeCommand::CreatePositioner {
            slot: slot.clone(),
            location: PositionerLocation::default(),
        })
        .unwrap();
        f.tx.send(NativeCommand::RegisterPositioner {
            slot,
            sink: Arc::downgrade(&sink) as Weak<dyn ProjectionSink>,
        })
        .unwrap();
        f.worker.run_pending();

        let state = ProjectedState::visible(ScreenPoint::new(40, 60));
        f.probe.push_projection(NativeHandle::new(1), state);
        assert_eq!(f.worker.poll_events(), 1);

        // 工作线程不直接修改接收端，只投递 UI 任务
        assert!(sink.states.lock().unwrap().is_empty());
        assert_eq!(f.ui.run_pending(), 1);
        assert_eq!(*sink.states.lock().unwrap(), vec![state]);
    }

    #[test]
    fn test_blue_sphere_changes_forwarded() {
        let mut f = fixture();
        let slot = pending_slot(ProxyKind::BlueSphere);
        f.tx.send(NativeCommand::CreateBlueSphere { slot: slot.clone() })
            .unwrap();
        for change in [
            BlueSphereChange::Enabled(true),
            BlueSphereChange::Direction(45.0),
            BlueSphereChange::IndoorMap {
                indoor_map_id: "westport".to_string(),
                indoor_floor_id: 2,
            },
        ] {
            f.tx.send(NativeCommand::UpdateBlueSphere {
                slot: slot.clone(),
                change,
            })
            .unwrap();
        }
        assert_eq!(f.worker.step(), 4);

        let handle = NativeHandle::new(1);
        assert_eq!(
            f.probe.calls(),
            vec![
                NativeCall::CreateBlueSphere { handle },
                NativeCall::SetBlueSphereEnabled {
                    handle,
                    enabled: true
                },
                NativeCall::SetBlueSphereDirection {
                    handle,
                    direction_degrees: 45.0
                },
                NativeCall::SetBlueSphereIndoorMap {
                    handle,
                    indoor_map_id: "westport".to_string(),
                    indoor_floor_id: 2
                },
            ]
        );
    }

    #[test]
    fn test_flush_replies() {
        let mut f = fixture();
        let (done, rx) = crossbeam_channel::bounded(1);
        f.tx.send(NativeCommand::Flush { done }).unwrap();
        f.worker.run_pending();
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_worker_loop_drains_and_exits_on_disconnect() {
        let f = fixture();
        let slot = pending_slot(ProxyKind::Positioner);
        f.tx.send(NativeCommand::CreatePositioner {
            slot: slot.clone(),
            location: PositionerLocation::default(),
        })
        .unwrap();
        drop(f.tx);

        let is_running = Arc::new(AtomicBool::new(true));
        worker_loop(f.worker, BridgeConfig::default(), is_running);

        assert_eq!(slot.state(), ProxyState::Ready);
        assert_eq!(f.probe.live_positioners().len(), 1);
    }
}
