//! Positioner 构造参数与变更监听器

use mapapi_bridge::ProxyId;
use mapapi_geometry::{ElevationMode, LatLng, PositionerLocation, ProjectedState};
use std::fmt;
use std::sync::Arc;

/// 定位标记投影变更监听器
///
/// 在 UI 线程上调用，且仅当引擎推送的投影状态与缓存不同时调用一次。
pub trait PositionerChangedListener: Send + Sync {
    fn on_positioner_changed(&self, positioner: ProxyId, state: &ProjectedState);
}

impl<F> PositionerChangedListener for F
where
    F: Fn(ProxyId, &ProjectedState) + Send + Sync,
{
    fn on_positioner_changed(&self, positioner: ProxyId, state: &ProjectedState) {
        self(positioner, state)
    }
}

/// Positioner 构造参数（Builder 风格）
#[derive(Clone, Default)]
pub struct PositionerOptions {
    location: PositionerLocation,
    listener: Option<Arc<dyn PositionerChangedListener>>,
}

impl PositionerOptions {
    /// 默认参数：(0, 0)，高度 0，离地高度模式，室外
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, position: LatLng) -> Self {
        self.location.position = position;
        self
    }

    pub fn elevation(mut self, elevation: f64) -> Self {
        self.location.elevation = elevation;
        self
    }

    pub fn elevation_mode(mut self, elevation_mode: ElevationMode) -> Self {
        self.location.elevation_mode = elevation_mode;
        self
    }

    /// 放置在室内地图的指定楼层
    pub fn indoor(mut self, indoor_map_id: impl Into<String>, indoor_floor_id: i32) -> Self {
        self.location.indoor_map_id = indoor_map_id.into();
        self.location.indoor_floor_id = indoor_floor_id;
        self
    }

    pub fn changed_listener<L>(mut self, listener: L) -> Self
    where
        L: PositionerChangedListener + 'static,
    {
        self.listener = Some(Arc::new(listener));
        self
    }

    pub fn location(&self) -> &PositionerLocation {
        &self.location
    }

    pub fn has_changed_listener(&self) -> bool {
        self.listener.is_some()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (PositionerLocation, Option<Arc<dyn PositionerChangedListener>>) {
        (self.location, self.listener)
    }
}

impl fmt::Debug for PositionerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionerOptions")
            .field("location", &self.location)
            .field("changed_listener", &self.listener.is_some())
            .finish()
    }
}
