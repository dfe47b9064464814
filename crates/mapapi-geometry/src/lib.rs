//! # mapapi Geometry
//!
//! 地图 SDK 代理层共享的值类型（无原生引擎依赖）
//!
//! ## 模块
//!
//! - `elevation`: 高度解释模式
//! - `location`: 定位器位置快照与屏幕投影状态
//!
//! 所有类型都是自包含的值类型，可以按值捕获并跨线程传递，
//! 转发命令只携带这些类型的副本，从不携带 UI 线程缓存的引用。

pub mod elevation;
pub mod location;

pub use elevation::ElevationMode;
pub use location::{PositionerLocation, ProjectedState};

use thiserror::Error;

/// 值类型层错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: String, value: u8 },

    #[error("Non-finite coordinate: latitude={latitude}, longitude={longitude}")]
    NonFinite { latitude: f64, longitude: f64 },
}

/// 经纬度坐标（WGS84，单位：度）
///
/// # 归一化规则
///
/// - 纬度截断到 `[-90, 90]`
/// - 经度回绕到 `[-180, 180)`
///
/// # 示例
///
/// ```rust
/// use mapapi_geometry::LatLng;
///
/// let p = LatLng::new(95.0, 190.0);
/// assert_eq!(p.latitude, 90.0);
/// assert_eq!(p.longitude, -170.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatLng {
    /// 纬度（度）
    pub latitude: f64,
    /// 经度（度）
    pub longitude: f64,
}

impl LatLng {
    /// 创建坐标并归一化
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: latitude.clamp(-90.0, 90.0),
            longitude: wrap_longitude(longitude),
        }
    }

    /// 创建坐标，拒绝 NaN/无穷大
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, GeometryError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(GeometryError::NonFinite {
                latitude,
                longitude,
            });
        }
        Ok(Self::new(latitude, longitude))
    }
}

fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..180.0).contains(&longitude) {
        longitude
    } else {
        ((longitude - 180.0) % 360.0 + 360.0) % 360.0 - 180.0
    }
}

/// 屏幕坐标（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_latlng_in_range_is_unchanged() {
        let p = LatLng::new(37.7858, -122.401);
        assert_eq!(p.latitude, 37.7858);
        assert_eq!(p.longitude, -122.401);
    }

    #[test]
    fn test_latlng_clamps_latitude() {
        assert_eq!(LatLng::new(120.0, 0.0).latitude, 90.0);
        assert_eq!(LatLng::new(-91.0, 0.0).latitude, -90.0);
    }

    #[test]
    fn test_latlng_wraps_longitude() {
        assert_eq!(LatLng::new(0.0, 180.0).longitude, -180.0);
        assert_eq!(LatLng::new(0.0, 540.0).longitude, -180.0);
        assert_eq!(LatLng::new(0.0, -190.0).longitude, 170.0);
    }

    #[test]
    fn test_latlng_try_new_rejects_nan() {
        let err = LatLng::try_new(f64::NAN, 0.0).unwrap_err();
        assert!(matches!(err, GeometryError::NonFinite { .. }));
        assert!(LatLng::try_new(0.0, f64::INFINITY).is_err());
        assert!(LatLng::try_new(10.0, 20.0).is_ok());
    }

    #[test]
    fn test_geometry_error_display() {
        let err = GeometryError::InvalidValue {
            field: "ElevationMode".to_string(),
            value: 7,
        };
        assert_eq!(format!("{}", err), "Invalid value for field ElevationMode: 7");
    }

    proptest! {
        #[test]
        fn prop_latlng_is_normalized(lat in -1000.0f64..1000.0, lng in -10_000.0f64..10_000.0) {
            let p = LatLng::new(lat, lng);
            prop_assert!((-90.0..=90.0).contains(&p.latitude));
            prop_assert!((-180.0..180.0).contains(&p.longitude));
        }
    }
}
