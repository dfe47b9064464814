//! 定位器位置快照与屏幕投影状态

use crate::{ElevationMode, LatLng, ScreenPoint};

/// 定位器位置快照
///
/// 原生引擎的定位器更新接口是"整体更新"的，因此任何一个位置相关属性变化时，
/// UI 线程都会拷贝完整的快照放入转发命令。
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionerLocation {
    /// 经纬度位置
    pub position: LatLng,
    /// 高度（米），解释方式由 `elevation_mode` 决定
    pub elevation: f64,
    /// 高度解释模式
    pub elevation_mode: ElevationMode,
    /// 室内地图 ID（室外为空字符串）
    pub indoor_map_id: String,
    /// 室内楼层 ID（室外为 0）
    pub indoor_floor_id: i32,
}

impl PositionerLocation {
    /// 是否位于室内地图上
    pub fn is_indoor(&self) -> bool {
        !self.indoor_map_id.is_empty()
    }
}

/// 引擎推送的屏幕投影状态
///
/// 比较使用结构相等：三个字段全部相同才视为"未变化"。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProjectedState {
    /// 屏幕坐标（仅当 `is_screen_point_valid` 为 true 时有意义）
    pub screen_point: ScreenPoint,
    /// 屏幕坐标是否有效
    ///
    /// 位于非当前焦点楼层的室内定位器没有有效的屏幕坐标。
    pub is_screen_point_valid: bool,
    /// 是否位于地球地平线之后
    pub is_behind_globe_horizon: bool,
}

impl ProjectedState {
    /// 有效的屏幕投影
    pub fn visible(screen_point: ScreenPoint) -> Self {
        Self {
            screen_point,
            is_screen_point_valid: true,
            is_behind_globe_horizon: false,
        }
    }

    /// 有效时返回屏幕坐标
    pub fn screen_point(&self) -> Option<ScreenPoint> {
        self.is_screen_point_valid.then_some(self.screen_point)
    }
}
