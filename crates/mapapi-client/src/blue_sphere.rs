//! BlueSphere：当前用户位置指示器
//!
//! 与 [`Positioner`](crate::Positioner) 相同的缓存 + 转发模型，但每个属性
//! 单独转发，并且没有反向通知。引擎中只有一个 BlueSphere，它不会被销毁。

use mapapi_bridge::{
    BlueSphereChange, BridgeError, BridgeHandle, HandleAccess, NativeCommand, NativeSlot, ProxyId,
    ProxyKind, ProxyState,
};
use mapapi_geometry::LatLng;
use mapapi_native::NativeHandle;
use std::sync::Arc;

/// 用户位置指示器
#[derive(Debug)]
pub struct BlueSphere {
    bridge: BridgeHandle,
    slot: Arc<NativeSlot>,
    position: LatLng,
    direction: f64,
    elevation: f64,
    indoor_map_id: String,
    indoor_floor_id: i32,
    enabled: bool,
}

impl BlueSphere {
    /// 创建（默认禁用、室外、位于 (0, 0)）
    pub fn new(bridge: &BridgeHandle) -> Result<Self, BridgeError> {
        let slot = Arc::new(NativeSlot::new(ProxyKind::BlueSphere));
        bridge.submit(NativeCommand::CreateBlueSphere { slot: slot.clone() })?;

        Ok(Self {
            bridge: bridge.clone(),
            slot,
            position: LatLng::default(),
            direction: 0.0,
            elevation: 0.0,
            indoor_map_id: String::new(),
            indoor_floor_id: 0,
            enabled: false,
        })
    }

    pub fn id(&self) -> ProxyId {
        self.slot.id()
    }

    pub fn state(&self) -> ProxyState {
        self.slot.state()
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    /// 朝向（度，正北为 0，顺时针）
    pub fn direction(&self) -> f64 {
        self.direction
    }

    pub fn elevation(&self) -> f64 {
        self.elevation
    }

    pub fn indoor_map_id(&self) -> &str {
        &self.indoor_map_id
    }

    pub fn indoor_floor_id(&self) -> i32 {
        self.indoor_floor_id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_position(&mut self, position: LatLng) -> Result<(), BridgeError> {
        self.position = position;
        self.forward(BlueSphereChange::Position(position))
    }

    pub fn set_direction(&mut self, direction: f64) -> Result<(), BridgeError> {
        self.direction = direction;
        self.forward(BlueSphereChange::Direction(direction))
    }

    pub fn set_elevation(&mut self, elevation: f64) -> Result<(), BridgeError> {
        self.elevation = elevation;
        self.forward(BlueSphereChange::Elevation(elevation))
    }

    /// 同时设置室内地图和楼层
    pub fn set_indoor_map(
        &mut self,
        indoor_map_id: impl Into<String>,
        indoor_floor_id: i32,
    ) -> Result<(), BridgeError> {
        self.indoor_map_id = indoor_map_id.into();
        self.indoor_floor_id = indoor_floor_id;
        self.forward_indoor_map()
    }

    /// 只修改楼层，沿用当前室内地图
    pub fn set_indoor_floor_id(&mut self, indoor_floor_id: i32) -> Result<(), BridgeError> {
        self.indoor_floor_id = indoor_floor_id;
        self.forward_indoor_map()
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), BridgeError> {
        self.enabled = enabled;
        self.forward(BlueSphereChange::Enabled(enabled))
    }

    pub fn native_handle(&self, access: Option<&HandleAccess>) -> Result<NativeHandle, BridgeError> {
        self.slot.native_handle(access)
    }

    fn forward_indoor_map(&self) -> Result<(), BridgeError> {
        self.forward(BlueSphereChange::IndoorMap {
            indoor_map_id: self.indoor_map_id.clone(),
            indoor_floor_id: self.indoor_floor_id,
        })
    }

    fn forward(&self, change: BlueSphereChange) -> Result<(), BridgeError> {
        self.bridge.submit(NativeCommand::UpdateBlueSphere {
            slot: self.slot.clone(),
            change,
        })
    }
}
