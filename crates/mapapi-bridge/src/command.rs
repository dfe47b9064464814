//! 转发命令类型定义
//!
//! UI 线程的每一次修改都会变成一个带类型的命令，放入全局 FIFO 队列，
//! 由唯一的工作线程按入队顺序执行。命令只携带值的副本。

use crate::slot::NativeSlot;
use crate::ui::ProjectionSink;
use crossbeam_channel::Sender;
use mapapi_geometry::{LatLng, PositionerLocation};
use std::fmt;
use std::sync::{Arc, Weak};

/// BlueSphere 的单属性修改
#[derive(Debug, Clone, PartialEq)]
pub enum BlueSphereChange {
    Enabled(bool),
    Position(LatLng),
    Direction(f64),
    Elevation(f64),
    IndoorMap {
        indoor_map_id: String,
        indoor_floor_id: i32,
    },
}

/// 转发命令
pub enum NativeCommand {
    /// 异步创建定位器
    CreatePositioner {
        slot: Arc<NativeSlot>,
        location: PositionerLocation,
    },
    /// 把定位器登记到反向通知注册表
    RegisterPositioner {
        slot: Arc<NativeSlot>,
        sink: Weak<dyn ProjectionSink>,
    },
    /// 整体更新定位器位置
    UpdatePositionerLocation {
        slot: Arc<NativeSlot>,
        location: PositionerLocation,
    },
    /// 销毁原生定位器并注销
    DestroyPositioner { slot: Arc<NativeSlot> },
    /// 异步创建 BlueSphere
    CreateBlueSphere { slot: Arc<NativeSlot> },
    /// BlueSphere 单属性修改
    UpdateBlueSphere {
        slot: Arc<NativeSlot>,
        change: BlueSphereChange,
    },
    /// 屏障：之前入队的命令全部执行完后回复
    Flush { done: Sender<()> },
}

impl NativeCommand {
    /// 命令名称（用于日志）
    pub fn name(&self) -> &'static str {
        match self {
            NativeCommand::CreatePositioner { .. } => "CreatePositioner",
            NativeCommand::RegisterPositioner { .. } => "RegisterPositioner",
            NativeCommand::UpdatePositionerLocation { .. } => "UpdatePositionerLocation",
            NativeCommand::DestroyPositioner { .. } => "DestroyPositioner",
            NativeCommand::CreateBlueSphere { .. } => "CreateBlueSphere",
            NativeCommand::UpdateBlueSphere { .. } => "UpdateBlueSphere",
            NativeCommand::Flush { .. } => "Flush",
        }
    }

    /// 命令作用的槽位
    pub fn slot(&self) -> Option<&Arc<NativeSlot>> {
        match self {
            NativeCommand::CreatePositioner { slot, .. }
            | NativeCommand::RegisterPositioner { slot, .. }
            | NativeCommand::UpdatePositionerLocation { slot, .. }
            | NativeCommand::DestroyPositioner { slot }
            | NativeCommand::CreateBlueSphere { slot }
            | NativeCommand::UpdateBlueSphere { slot, .. } => Some(slot),
            NativeCommand::Flush { .. } => None,
        }
    }

    /// 是否为创建命令（入队前需要把槽位切换到 `Pending`）
    pub fn is_creation(&self) -> bool {
        matches!(
            self,
            NativeCommand::CreatePositioner { .. } | NativeCommand::CreateBlueSphere { .. }
        )
    }
}

impl fmt::Debug for NativeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.name());
        if let Some(slot) = self.slot() {
            s.field("proxy", &slot.id());
        }
        match self {
            NativeCommand::CreatePositioner { location, .. }
            | NativeCommand::UpdatePositionerLocation { location, .. } => {
                s.field("location", location);
            },
            NativeCommand::UpdateBlueSphere { change, .. } => {
                s.field("change", change);
            },
            _ => {},
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::ProxyKind;

    #[test]
    fn test_command_names_and_slots() {
        let slot = Arc::new(NativeSlot::new(ProxyKind::Positioner));
        let create = NativeCommand::CreatePositioner {
            slot: slot.clone(),
            location: PositionerLocation::default(),
        };
        assert_eq!(create.name(), "CreatePositioner");
        assert!(create.is_creation());
        assert_eq!(create.slot().map(|s| s.id()), Some(slot.id()));

        let destroy = NativeCommand::DestroyPositioner { slot: slot.clone() };
        assert!(!destroy.is_creation());

        let (done, _rx) = crossbeam_channel::bounded(1);
        let flush = NativeCommand::Flush { done };
        assert!(flush.slot().is_none());
    }

    #[test]
    fn test_command_debug_includes_change() {
        let slot = Arc::new(NativeSlot::new(ProxyKind::BlueSphere));
        let cmd = NativeCommand::UpdateBlueSphere {
            slot,
            change: BlueSphereChange::Direction(90.0),
        };
        let text = format!("{:?}", cmd);
        assert!(text.contains("UpdateBlueSphere"));
        assert!(text.contains("Direction(90.0)"));
    }
}
