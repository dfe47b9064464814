//! Positioner：地图上的定位标记
//!
//! UI 线程持有 [`Positioner`]，读取总是来自本地缓存，修改先更新缓存再转发到
//! 工作线程。引擎计算出的屏幕投影通过 UI 任务队列回到这里。
//!
//! # 使用示例
//!
//! ```rust
//! use mapapi_bridge::{BridgeConfig, MapRuntime};
//! use mapapi_client::{Positioner, PositionerOptions};
//! use mapapi_geometry::LatLng;
//! use mapapi_native::MockEngine;
//!
//! let (engine, _probe) = MockEngine::new();
//! let (runtime, mut worker) = MapRuntime::detached(engine, BridgeConfig::default());
//!
//! let options = PositionerOptions::new()
//!     .position(LatLng::new(56.46, -2.97))
//!     .indoor("westport_house", 2);
//! let mut positioner = Positioner::new(runtime.handle(), options).unwrap();
//!
//! positioner.set_elevation(12.0).unwrap();
//! assert_eq!(positioner.elevation(), 12.0);
//!
//! worker.run_pending();
//! assert!(positioner.state().is_ready());
//! ```

use crate::options::{PositionerChangedListener, PositionerOptions};
use arc_swap::ArcSwap;
use mapapi_bridge::{
    BridgeError, BridgeHandle, HandleAccess, NativeCommand, NativeSlot, ProjectionSink, ProxyId,
    ProxyKind, ProxyState,
};
use mapapi_geometry::{ElevationMode, LatLng, PositionerLocation, ProjectedState, ScreenPoint};
use mapapi_native::NativeHandle;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

/// UI 线程与工作线程共享的部分
struct PositionerShared {
    slot: Arc<NativeSlot>,
    projected: ArcSwap<ProjectedState>,
    listener: Option<Arc<dyn PositionerChangedListener>>,
    destroyed: AtomicBool,
}

impl ProjectionSink for PositionerShared {
    fn proxy_id(&self) -> ProxyId {
        self.slot.id()
    }

    fn apply_projected_state(&self, state: ProjectedState) {
        if self.destroyed.load(Ordering::Acquire) {
            return;
        }
        if **self.projected.load() == state {
            return;
        }

        self.projected.store(Arc::new(state));
        if let Some(listener) = &self.listener {
            listener.on_positioner_changed(self.slot.id(), &state);
        }
    }
}

/// 定位标记
pub struct Positioner {
    bridge: BridgeHandle,
    shared: Arc<PositionerShared>,
    location: PositionerLocation,
}

impl Positioner {
    /// 创建定位标记
    ///
    /// 立即返回；原生对象在工作线程上异步创建。创建完成之前的修改会排在
    /// 创建命令之后，不会丢失。
    pub fn new(bridge: &BridgeHandle, options: PositionerOptions) -> Result<Self, BridgeError> {
        let (location, listener) = options.into_parts();
        let shared = Arc::new(PositionerShared {
            slot: Arc::new(NativeSlot::new(ProxyKind::Positioner)),
            projected: ArcSwap::from_pointee(ProjectedState::default()),
            listener,
            destroyed: AtomicBool::new(false),
        });

        bridge.submit(NativeCommand::CreatePositioner {
            slot: shared.slot.clone(),
            location: location.clone(),
        })?;

        let sink: Weak<dyn ProjectionSink> = Arc::downgrade(&shared) as Weak<dyn ProjectionSink>;
        bridge.submit(NativeCommand::RegisterPositioner {
            slot: shared.slot.clone(),
            sink,
        })?;

        debug!("Positioner {} created at {:?}", shared.slot.id(), location.position);
        Ok(Self {
            bridge: bridge.clone(),
            shared,
            location,
        })
    }

    pub fn id(&self) -> ProxyId {
        self.shared.slot.id()
    }

    /// 原生侧生命周期状态
    pub fn state(&self) -> ProxyState {
        self.shared.slot.state()
    }

    /// 是否已调用过 [`destroy`](Self::destroy)
    pub fn is_destroyed(&self) -> bool {
        self.shared.destroyed.load(Ordering::Acquire)
    }

    pub fn position(&self) -> LatLng {
        self.location.position
    }

    pub fn elevation(&self) -> f64 {
        self.location.elevation
    }

    pub fn elevation_mode(&self) -> ElevationMode {
        self.location.elevation_mode
    }

    pub fn indoor_map_id(&self) -> &str {
        &self.location.indoor_map_id
    }

    pub fn indoor_floor_id(&self) -> i32 {
        self.location.indoor_floor_id
    }

    /// 当前缓存的完整位置快照
    pub fn location(&self) -> &PositionerLocation {
        &self.location
    }

    pub fn set_position(&mut self, position: LatLng) -> Result<(), BridgeError> {
        self.ensure_alive()?;
        self.location.position = position;
        self.forward_location()
    }

    pub fn set_elevation(&mut self, elevation: f64) -> Result<(), BridgeError> {
        self.ensure_alive()?;
        self.location.elevation = elevation;
        self.forward_location()
    }

    pub fn set_elevation_mode(&mut self, elevation_mode: ElevationMode) -> Result<(), BridgeError> {
        self.ensure_alive()?;
        self.location.elevation_mode = elevation_mode;
        self.forward_location()
    }

    /// 设置室内地图 ID（空字符串表示室外）
    pub fn set_indoor_map_id(&mut self, indoor_map_id: impl Into<String>) -> Result<(), BridgeError> {
        self.ensure_alive()?;
        self.location.indoor_map_id = indoor_map_id.into();
        self.forward_location()
    }

    pub fn set_indoor_floor_id(&mut self, indoor_floor_id: i32) -> Result<(), BridgeError> {
        self.ensure_alive()?;
        self.location.indoor_floor_id = indoor_floor_id;
        self.forward_location()
    }

    /// 屏幕坐标（仅当引擎报告有效投影时）
    pub fn try_get_screen_point(&self) -> Option<ScreenPoint> {
        self.shared.projected.load().screen_point()
    }

    pub fn is_behind_globe_horizon(&self) -> bool {
        self.shared.projected.load().is_behind_globe_horizon
    }

    /// 最近一次引擎推送的投影状态
    pub fn projected_state(&self) -> ProjectedState {
        **self.shared.projected.load()
    }

    /// 获取原生句柄（仅桥接层可以出示令牌）
    pub fn native_handle(&self, access: Option<&HandleAccess>) -> Result<NativeHandle, BridgeError> {
        self.shared.slot.native_handle(access)
    }

    /// 销毁定位标记
    ///
    /// 释放原生对象并停止接收投影通知。之后的所有修改都返回
    /// `BridgeError::Destroyed`，缓存保持不变。
    pub fn destroy(&mut self) -> Result<(), BridgeError> {
        if self.shared.destroyed.swap(true, Ordering::AcqRel) {
            return Err(BridgeError::Destroyed);
        }
        debug!("Destroying positioner {}", self.id());
        self.bridge.submit(NativeCommand::DestroyPositioner {
            slot: self.shared.slot.clone(),
        })
    }

    fn ensure_alive(&self) -> Result<(), BridgeError> {
        if self.is_destroyed() {
            Err(BridgeError::Destroyed)
        } else {
            Ok(())
        }
    }

    fn forward_location(&self) -> Result<(), BridgeError> {
        self.bridge.submit(NativeCommand::UpdatePositionerLocation {
            slot: self.shared.slot.clone(),
            location: self.location.clone(),
        })
    }
}

impl Drop for Positioner {
    fn drop(&mut self) {
        if self.is_destroyed() {
            return;
        }
        if let Err(e) = self.destroy() {
            warn!("Failed to destroy positioner {} on drop: {}", self.id(), e);
        }
    }
}

impl fmt::Debug for Positioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Positioner")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("location", &self.location)
            .field("projected", &self.projected_state())
            .finish()
    }
}
