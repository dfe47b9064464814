//! 高度解释模式

use crate::GeometryError;

/// 高度解释模式
///
/// 决定 `elevation` 属性如何被原生引擎解释。
/// 原生接口使用 `u8` 表示，因此保留显式的判别值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, num_enum::IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ElevationMode {
    /// 相对地形的高度（米，默认）
    #[default]
    HeightAboveGround = 0x00,
    /// 海拔高度（相对平均海平面，米）
    HeightAboveSeaLevel = 0x01,
}

impl TryFrom<u8> for ElevationMode {
    type Error = GeometryError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(ElevationMode::HeightAboveGround),
            0x01 => Ok(ElevationMode::HeightAboveSeaLevel),
            _ => Err(GeometryError::InvalidValue {
                field: "ElevationMode".to_string(),
                value,
            }),
        }
    }
}
