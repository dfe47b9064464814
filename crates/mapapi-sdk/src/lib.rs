//! mapapi SDK - 原生 3D 地图引擎的跨线程代理层
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **值类型层** (`geometry`): 经纬度、高度模式、位置快照、屏幕投影
//! - **引擎层** (`native`): 原生引擎接口与句柄，`mock` feature 提供模拟引擎
//! - **桥接层** (`bridge`): 命令队列、工作线程、能力令牌、反向通知
//! - **客户端层** (`client`): UI 线程代理对象（Positioner、BlueSphere）
//!
//! # 快速开始
//!
//! ```rust
//! use mapapi_sdk::prelude::*;
//! use mapapi_sdk::native::MockEngine;
//!
//! let (engine, _probe) = MockEngine::new();
//! let runtime = MapRuntime::spawn(engine, BridgeConfig::default()).unwrap();
//!
//! let mut positioner = Positioner::new(
//!     runtime.handle(),
//!     PositionerOptions::new().position(LatLng::new(56.46, -2.97)),
//! )
//! .unwrap();
//! positioner.set_elevation(20.0).unwrap();
//!
//! runtime.flush(std::time::Duration::from_secs(1)).unwrap();
//! assert!(positioner.state().is_ready());
//! ```

mod logging;
pub mod prelude;

pub use mapapi_bridge as bridge;
pub use mapapi_client as client;
pub use mapapi_geometry as geometry;
pub use mapapi_native as native;

pub use logging::{DEFAULT_LOG_DIRECTIVE, init_logging, init_logging_with};

// 值类型
pub use geometry::{
    ElevationMode, GeometryError, LatLng, PositionerLocation, ProjectedState, ScreenPoint,
};

// 引擎层
pub use native::{EngineEvent, NativeEngine, NativeError, NativeHandle};

// 桥接层
pub use bridge::{
    BridgeConfig, BridgeError, BridgeHandle, ConfigError, HandleAccess, MapRuntime,
    MetricsSnapshot, ProxyId, ProxyState,
};

// 客户端层（推荐入口）
pub use client::{BlueSphere, Positioner, PositionerChangedListener, PositionerOptions};
