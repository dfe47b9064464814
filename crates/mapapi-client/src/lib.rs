//! # mapapi Client Layer
//!
//! UI 线程代理对象：
//! - [`Positioner`]：地图定位标记，带屏幕投影反向通知
//! - [`BlueSphere`]：用户位置指示器
//!
//! 代理对象的 getter 只读本地缓存，永不阻塞；setter 先更新缓存，
//! 再把值的副本作为命令提交到工作线程。

mod blue_sphere;
mod options;
mod positioner;

pub use blue_sphere::BlueSphere;
pub use options::{PositionerChangedListener, PositionerOptions};
pub use positioner::Positioner;
