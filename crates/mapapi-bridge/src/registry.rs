//! 反向通知注册表
//!
//! 工作线程独占，把原生句柄映射到代理对象的弱引用。
//! 弱引用保证注册表不会延长代理对象的生命周期。

use crate::ui::ProjectionSink;
use mapapi_native::NativeHandle;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

#[derive(Default)]
pub struct ProxyRegistry {
    entries: HashMap<NativeHandle, Weak<dyn ProjectionSink>>,
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记句柄对应的接收端；同一句柄重复登记时覆盖旧条目
    pub fn register(&mut self, handle: NativeHandle, sink: Weak<dyn ProjectionSink>) {
        if self.entries.insert(handle, sink).is_some() {
            debug!("Registry entry for {} replaced", handle);
        }
    }

    /// 注销句柄，返回是否存在过
    pub fn unregister(&mut self, handle: NativeHandle) -> bool {
        self.entries.remove(&handle).is_some()
    }

    /// 查找句柄对应的接收端
    ///
    /// 如果代理对象已经被释放，顺带清除该条目并返回 `None`。
    pub fn lookup(&mut self, handle: NativeHandle) -> Option<Arc<dyn ProjectionSink>> {
        let sink = self.entries.get(&handle)?.upgrade();
        if sink.is_none() {
            self.entries.remove(&handle);
            debug!("Pruned stale registry entry for {}", handle);
        }
        sink
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
