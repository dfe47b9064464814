//! Mock 原生引擎
//!
//! 记录所有原生调用（按调用顺序），并允许测试从外部注入引擎事件。
//! 可选地对定位器做简单的等距圆柱投影，自动产生 `PositionerProjected` 事件，
//! 用于演示和端到端测试反向通知链路。

use crate::{EngineEvent, NativeEngine, NativeError, NativeHandle};
use crossbeam_channel::{Receiver, Sender, unbounded};
use mapapi_geometry::{LatLng, PositionerLocation, ProjectedState, ScreenPoint};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::trace;

/// 被记录的原生调用
#[derive(Debug, Clone, PartialEq)]
pub enum NativeCall {
    CreatePositioner {
        handle: NativeHandle,
        location: PositionerLocation,
    },
    UpdatePositionerLocation {
        handle: NativeHandle,
        location: PositionerLocation,
    },
    DestroyPositioner {
        handle: NativeHandle,
    },
    CreateBlueSphere {
        handle: NativeHandle,
    },
    SetBlueSphereEnabled {
        handle: NativeHandle,
        enabled: bool,
    },
    SetBlueSpherePosition {
        handle: NativeHandle,
        position: LatLng,
    },
    SetBlueSphereDirection {
        handle: NativeHandle,
        direction_degrees: f64,
    },
    SetBlueSphereElevation {
        handle: NativeHandle,
        elevation: f64,
    },
    SetBlueSphereIndoorMap {
        handle: NativeHandle,
        indoor_map_id: String,
        indoor_floor_id: i32,
    },
}

/// 模拟视口（用于自动投影）
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
    /// 相机中心（用于判断是否位于地平线之后）
    pub center: LatLng,
    /// 当前聚焦的室内楼层 `(map_id, floor_id)`
    pub focused_indoor: Option<(String, i32)>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            center: LatLng::default(),
            focused_indoor: None,
        }
    }
}

impl Viewport {
    /// 计算定位器的屏幕投影
    pub fn project(&self, location: &PositionerLocation) -> ProjectedState {
        let position = location.position;
        let x = ((position.longitude + 180.0) / 360.0 * f64::from(self.width)).round() as i32;
        let y = ((90.0 - position.latitude) / 180.0 * f64::from(self.height)).round() as i32;

        let is_screen_point_valid = if location.is_indoor() {
            self.focused_indoor
                .as_ref()
                .is_some_and(|(map_id, floor)| {
                    *map_id == location.indoor_map_id && *floor == location.indoor_floor_id
                })
        } else {
            true
        };

        let delta = LatLng::new(0.0, position.longitude - self.center.longitude).longitude;

        ProjectedState {
            screen_point: ScreenPoint::new(x, y),
            is_screen_point_valid,
            is_behind_globe_horizon: delta.abs() > 90.0,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<NativeCall>,
    next_handle: i32,
    fail_next_create: bool,
    positioners: HashMap<NativeHandle, PositionerLocation>,
    blue_sphere: Option<NativeHandle>,
}

impl MockState {
    fn allocate(&mut self) -> NativeHandle {
        self.next_handle += 1;
        NativeHandle::new(self.next_handle)
    }
}

/// Mock 引擎（在工作线程上独占）
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
    injected: Receiver<EngineEvent>,
    projected: VecDeque<EngineEvent>,
    viewport: Option<Viewport>,
}

/// Mock 引擎探针（留在测试线程上，用于断言和注入事件）
#[derive(Clone)]
pub struct MockProbe {
    state: Arc<Mutex<MockState>>,
    inject: Sender<EngineEvent>,
}

impl MockEngine {
    /// 创建不带自动投影的 Mock 引擎
    pub fn new() -> (Self, MockProbe) {
        let state = Arc::new(Mutex::new(MockState::default()));
        let (inject, injected) = unbounded();
        let engine = Self {
            state: state.clone(),
            injected,
            projected: VecDeque::new(),
            viewport: None,
        };
        (engine, MockProbe { state, inject })
    }

    /// 创建带自动投影的 Mock 引擎
    ///
    /// 每次定位器创建或更新后，都会排队一个对应的投影事件。
    pub fn with_projection(viewport: Viewport) -> (Self, MockProbe) {
        let (mut engine, probe) = Self::new();
        engine.viewport = Some(viewport);
        (engine, probe)
    }

    fn queue_projection(&mut self, handle: NativeHandle, location: &PositionerLocation) {
        if let Some(viewport) = &self.viewport {
            self.projected.push_back(EngineEvent::PositionerProjected {
                handle,
                state: viewport.project(location),
            });
        }
    }

    fn check_blue_sphere(state: &MockState, handle: NativeHandle) -> Result<(), NativeError> {
        if state.blue_sphere == Some(handle) {
            Ok(())
        } else {
            Err(NativeError::UnknownHandle(handle))
        }
    }
}

impl NativeEngine for MockEngine {
    fn create_positioner(
        &mut self,
        location: &PositionerLocation,
    ) -> Result<NativeHandle, NativeError> {
        let handle = {
            let mut state = self.state.lock();
            if std::mem::take(&mut state.fail_next_create) {
                return Err(NativeError::Engine("positioner creation rejected".to_string()));
            }
            let handle = state.allocate();
            state.positioners.insert(handle, location.clone());
            state.calls.push(NativeCall::CreatePositioner {
                handle,
                location: location.clone(),
            });
            handle
        };
        trace!("mock: created positioner {}", handle);
        self.queue_projection(handle, location);
        Ok(handle)
    }

    fn update_positioner_location(
        &mut self,
        handle: NativeHandle,
        location: &PositionerLocation,
    ) -> Result<(), NativeError> {
        {
            let mut state = self.state.lock();
            let slot =
                state.positioners.get_mut(&handle).ok_or(NativeError::UnknownHandle(handle))?;
            *slot = location.clone();
            state.calls.push(NativeCall::UpdatePositionerLocation {
                handle,
                location: location.clone(),
            });
        }
        self.queue_projection(handle, location);
        Ok(())
    }

    fn destroy_positioner(&mut self, handle: NativeHandle) -> Result<(), NativeError> {
        let mut state = self.state.lock();
        state.positioners.remove(&handle).ok_or(NativeError::UnknownHandle(handle))?;
        state.calls.push(NativeCall::DestroyPositioner { handle });
        Ok(())
    }

    fn create_blue_sphere(&mut self) -> Result<NativeHandle, NativeError> {
        let mut state = self.state.lock();
        if let Some(handle) = state.blue_sphere {
            return Ok(handle);
        }
        let handle = state.allocate();
        state.blue_sphere = Some(handle);
        state.calls.push(NativeCall::CreateBlueSphere { handle });
        Ok(handle)
    }

    fn set_blue_sphere_enabled(
        &mut self,
        handle: NativeHandle,
        enabled: bool,
    ) -> Result<(), NativeError> {
        let mut state = self.state.lock();
        Self::check_blue_sphere(&state, handle)?;
        state.calls.push(NativeCall::SetBlueSphereEnabled { handle, enabled });
        Ok(())
    }

    fn set_blue_sphere_position(
        &mut self,
        handle: NativeHandle,
        position: LatLng,
    ) -> Result<(), NativeError> {
        let mut state = self.state.lock();
        Self::check_blue_sphere(&state, handle)?;
        state.calls.push(NativeCall::SetBlueSpherePosition { handle, position });
        Ok(())
    }

    fn set_blue_sphere_direction(
        &mut self,
        handle: NativeHandle,
        direction_degrees: f64,
    ) -> Result<(), NativeError> {
        let mut state = self.state.lock();
        Self::check_blue_sphere(&state, handle)?;
        state.calls.push(NativeCall::SetBlueSphereDirection {
            handle,
            direction_degrees,
        });
        Ok(())
    }

    fn set_blue_sphere_elevation(
        &mut self,
        handle: NativeHandle,
        elevation: f64,
    ) -> Result<(), NativeError> {
        let mut state = self.state.lock();
        Self::check_blue_sphere(&state, handle)?;
        state.calls.push(NativeCall::SetBlueSphereElevation { handle, elevation });
        Ok(())
    }

    fn set_blue_sphere_indoor_map(
        &mut self,
        handle: NativeHandle,
        indoor_map_id: &str,
        indoor_floor_id: i32,
    ) -> Result<(), NativeError> {
        let mut state = self.state.lock();
        Self::check_blue_sphere(&state, handle)?;
        state.calls.push(NativeCall::SetBlueSphereIndoorMap {
            handle,
            indoor_map_id: indoor_map_id.to_string(),
            indoor_floor_id,
        });
        Ok(())
    }

    fn poll_event(&mut self) -> Result<EngineEvent, NativeError> {
        if let Some(event) = self.projected.pop_front() {
            return Ok(event);
        }
        self.injected.try_recv().map_err(|_| NativeError::Timeout)
    }
}

impl MockProbe {
    /// 所有已记录的原生调用（按调用顺序）
    pub fn calls(&self) -> Vec<NativeCall> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// 当前存活的定位器句柄
    pub fn live_positioners(&self) -> Vec<NativeHandle> {
        let mut handles: Vec<_> = self.state.lock().positioners.keys().copied().collect();
        handles.sort();
        handles
    }

    /// 引擎侧当前的定位器位置
    pub fn positioner_location(&self, handle: NativeHandle) -> Option<PositionerLocation> {
        self.state.lock().positioners.get(&handle).cloned()
    }

    /// 让下一次 `create_positioner` 失败
    pub fn fail_next_create(&self) {
        self.state.lock().fail_next_create = true;
    }

    /// 注入一个引擎事件（由工作线程下一次 `poll_event` 取出）
    pub fn push_event(&self, event: EngineEvent) {
        let _ = self.inject.send(event);
    }

    pub fn push_projection(&self, handle: NativeHandle, state: ProjectedState) {
        self.push_event(EngineEvent::PositionerProjected { handle, state });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location_at(lat: f64, lng: f64) -> PositionerLocation {
        PositionerLocation {
            position: LatLng::new(lat, lng),
            ..Default::default()
        }
    }

    #[test]
    fn test_mock_records_calls_in_order() {
        let (mut engine, probe) = MockEngine::new();
        let handle = engine.create_positioner(&location_at(1.0, 2.0)).unwrap();
        engine.update_positioner_location(handle, &location_at(3.0, 4.0)).unwrap();
        engine.destroy_positioner(handle).unwrap();

        let calls = probe.calls();
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[0], NativeCall::CreatePositioner { .. }));
        assert!(matches!(calls[1], NativeCall::UpdatePositionerLocation { .. }));
        assert_eq!(calls[2], NativeCall::DestroyPositioner { handle });
        assert!(probe.live_positioners().is_empty());
    }

    #[test]
    fn test_mock_unknown_handle() {
        let (mut engine, _probe) = MockEngine::new();
        let err = engine
            .update_positioner_location(NativeHandle::new(99), &PositionerLocation::default())
            .unwrap_err();
        assert_eq!(err, NativeError::UnknownHandle(NativeHandle::new(99)));

        let err = engine.set_blue_sphere_enabled(NativeHandle::new(1), true).unwrap_err();
        assert!(matches!(err, NativeError::UnknownHandle(_)));
    }

    #[test]
    fn test_mock_fail_next_create_is_one_shot() {
        let (mut engine, probe) = MockEngine::new();
        probe.fail_next_create();
        assert!(engine.create_positioner(&PositionerLocation::default()).is_err());
        assert!(engine.create_positioner(&PositionerLocation::default()).is_ok());
    }

    #[test]
    fn test_mock_blue_sphere_is_singleton() {
        let (mut engine, probe) = MockEngine::new();
        let a = engine.create_blue_sphere().unwrap();
        let b = engine.create_blue_sphere().unwrap();
        assert_eq!(a, b);
        assert_eq!(probe.call_count(), 1);
    }

    #[test]
    fn test_mock_injected_events() {
        let (mut engine, probe) = MockEngine::new();
        assert_eq!(engine.poll_event(), Err(NativeError::Timeout));

        probe.push_projection(NativeHandle::new(5), ProjectedState::default());
        let event = engine.poll_event().unwrap();
        assert_eq!(event.handle(), NativeHandle::new(5));
    }

    #[test]
    fn test_mock_auto_projection() {
        let (mut engine, _probe) = MockEngine::with_projection(Viewport {
            width: 360,
            height: 180,
            ..Default::default()
        });
        let handle = engine.create_positioner(&location_at(0.0, 0.0)).unwrap();

        match engine.poll_event().unwrap() {
            EngineEvent::PositionerProjected { handle: h, state } => {
                assert_eq!(h, handle);
                assert_eq!(state.screen_point(), Some(ScreenPoint::new(180, 90)));
                assert!(!state.is_behind_globe_horizon);
            },
        }
        assert_eq!(engine.poll_event(), Err(NativeError::Timeout));
    }

    #[test]
    fn test_viewport_indoor_and_horizon() {
        let viewport = Viewport {
            focused_indoor: Some(("mall".to_string(), 1)),
            ..Default::default()
        };

        let mut indoor = location_at(0.0, 0.0);
        indoor.indoor_map_id = "mall".to_string();
        indoor.indoor_floor_id = 2;
        assert!(!viewport.project(&indoor).is_screen_point_valid);

        indoor.indoor_floor_id = 1;
        assert!(viewport.project(&indoor).is_screen_point_valid);

        let far_side = location_at(0.0, 170.0);
        assert!(viewport.project(&far_side).is_behind_globe_horizon);
    }
}
