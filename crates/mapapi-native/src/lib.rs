//! # mapapi Native Engine Layer
//!
//! 原生地图引擎抽象层，提供统一的引擎接口。
//!
//! 原生引擎只允许在专用的工作线程上调用，因此 [`NativeEngine`] 只要求 `Send`，
//! 不要求 `Sync`：引擎实例会被移动到工作线程并由其独占。

use mapapi_geometry::{LatLng, PositionerLocation, ProjectedState};
use std::fmt;
use thiserror::Error;

pub use mapapi_geometry as geometry;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::{MockEngine, MockProbe, NativeCall, Viewport};

/// 原生对象句柄
///
/// 不透明的整数标识，绑定到引擎内部对象。只有在工作线程上的异步创建完成后才存在。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(i32);

impl NativeHandle {
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 原生引擎统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NativeError {
    /// 没有待处理的引擎事件（正常情况）
    #[error("Poll timeout")]
    Timeout,
    #[error("Unknown native handle: {0}")]
    UnknownHandle(NativeHandle),
    #[error("Engine error: {0}")]
    Engine(String),
}

/// 引擎推送的事件
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// 定位器的屏幕投影已重新计算
    PositionerProjected {
        handle: NativeHandle,
        state: ProjectedState,
    },
}

impl EngineEvent {
    pub fn handle(&self) -> NativeHandle {
        match self {
            EngineEvent::PositionerProjected { handle, .. } => *handle,
        }
    }
}

/// 原生引擎接口
///
/// 所有方法都在工作线程上调用。句柄由 `create_*` 返回，调用方负责在
/// 句柄可用之前不调用依赖句柄的方法。
pub trait NativeEngine {
    fn create_positioner(
        &mut self,
        location: &PositionerLocation,
    ) -> Result<NativeHandle, NativeError>;

    fn update_positioner_location(
        &mut self,
        handle: NativeHandle,
        location: &PositionerLocation,
    ) -> Result<(), NativeError>;

    fn destroy_positioner(&mut self, handle: NativeHandle) -> Result<(), NativeError>;

    fn create_blue_sphere(&mut self) -> Result<NativeHandle, NativeError>;

    fn set_blue_sphere_enabled(
        &mut self,
        handle: NativeHandle,
        enabled: bool,
    ) -> Result<(), NativeError>;

    fn set_blue_sphere_position(
        &mut self,
        handle: NativeHandle,
        position: LatLng,
    ) -> Result<(), NativeError>;

    fn set_blue_sphere_direction(
        &mut self,
        handle: NativeHandle,
        direction_degrees: f64,
    ) -> Result<(), NativeError>;

    fn set_blue_sphere_elevation(
        &mut self,
        handle: NativeHandle,
        elevation: f64,
    ) -> Result<(), NativeError>;

    fn set_blue_sphere_indoor_map(
        &mut self,
        handle: NativeHandle,
        indoor_map_id: &str,
        indoor_floor_id: i32,
    ) -> Result<(), NativeError>;

    /// 取出下一个引擎事件
    ///
    /// 没有事件时返回 `Err(NativeError::Timeout)`，不应长时间阻塞。
    fn poll_event(&mut self) -> Result<EngineEvent, NativeError>;

    fn try_poll_event(&mut self) -> Result<Option<EngineEvent>, NativeError> {
        match self.poll_event() {
            Ok(event) => Ok(Some(event)),
            Err(NativeError::Timeout) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<E: NativeEngine + ?Sized> NativeEngine for Box<E> {
    fn create_positioner(
        &mut self,
        location: &PositionerLocation,
    ) -> Result<NativeHandle, NativeError> {
        (**self).create_positioner(location)
    }

    fn update_positioner_location(
        &mut self,
        handle: NativeHandle,
        location: &PositionerLocation,
    ) -> Result<(), NativeError> {
        (**self).update_positioner_location(handle, location)
    }

    fn destroy_positioner(&mut self, handle: NativeHandle) -> Result<(), NativeError> {
        (**self).destroy_positioner(handle)
    }

    fn create_blue_sphere(&mut self) -> Result<NativeHandle, NativeError> {
        (**self).create_blue_sphere()
    }

    fn set_blue_sphere_enabled(
        &mut self,
        handle: NativeHandle,
        enabled: bool,
    ) -> Result<(), NativeError> {
        (**self).set_blue_sphere_enabled(handle, enabled)
    }

    fn set_blue_sphere_position(
        &mut self,
        handle: NativeHandle,
        position: LatLng,
    ) -> Result<(), NativeError> {
        (**self).set_blue_sphere_position(handle, position)
    }

    fn set_blue_sphere_direction(
        &mut self,
        handle: NativeHandle,
        direction_degrees: f64,
    ) -> Result<(), NativeError> {
        (**self).set_blue_sphere_direction(handle, direction_degrees)
    }

    fn set_blue_sphere_elevation(
        &mut self,
        handle: NativeHandle,
        elevation: f64,
    ) -> Result<(), NativeError> {
        (**self).set_blue_sphere_elevation(handle, elevation)
    }

    fn set_blue_sphere_indoor_map(
        &mut self,
        handle: NativeHandle,
        indoor_map_id: &str,
        indoor_floor_id: i32,
    ) -> Result<(), NativeError> {
        (**self).set_blue_sphere_indoor_map(handle, indoor_map_id, indoor_floor_id)
    }

    fn poll_event(&mut self) -> Result<EngineEvent, NativeError> {
        (**self).poll_event()
    }
}
