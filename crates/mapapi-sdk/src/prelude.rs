//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use mapapi_sdk::prelude::*;
//! ```

// 客户端层
pub use crate::client::{BlueSphere, Positioner, PositionerChangedListener, PositionerOptions};

// 运行时
pub use crate::bridge::{BridgeConfig, BridgeHandle, MapRuntime, ProxyId, ProxyState};

// 值类型
pub use crate::geometry::{ElevationMode, LatLng, ProjectedState, ScreenPoint};

// 引擎接口
pub use crate::native::NativeEngine;

// 错误类型
pub use crate::bridge::BridgeError;
pub use crate::native::NativeError;
