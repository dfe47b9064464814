//! 原生槽位：代理对象的原生侧状态
//!
//! 每个代理对象（Positioner、BlueSphere）持有一个 `Arc<NativeSlot>`，
//! 与工作线程共享。槽位保存生命周期状态和原生句柄。
//!
//! # 状态机
//!
//! ```text
//! Uninitialized --(提交创建命令)--> Pending --(工作线程创建成功)--> Ready
//!       ^                              |                              |
//!       +-------(原生创建失败)---------+                              |
//!                                                                     v
//!                         (工作线程执行销毁命令，从任意状态) ---> Destroyed
//! ```
//!
//! `Pending -> Ready` 只发生在工作线程上；`Destroyed` 是终止状态。
//! 句柄只写一次（创建时），之后只被工作线程读取。

use crate::error::BridgeError;
use crate::token::HandleAccess;
use mapapi_native::NativeHandle;
use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

/// 代理对象标识（进程内唯一，用于日志和注册表）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId(u64);

impl ProxyId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proxy-{}", self.0)
    }
}

/// 代理对象种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    Positioner,
    BlueSphere,
}

/// 代理对象生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ProxyState {
    /// 没有句柄，也没有排队的创建命令
    #[default]
    Uninitialized = 0,
    /// 创建命令已入队，尚未执行
    Pending = 1,
    /// 句柄可用，修改正常转发
    Ready = 2,
    /// 句柄已释放（终止状态）
    Destroyed = 3,
}

impl ProxyState {
    /// 从 u8 转换
    ///
    /// 如果值无效，返回 Destroyed（拒绝任何进一步的访问）。
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Uninitialized,
            1 => Self::Pending,
            2 => Self::Ready,
            _ => Self::Destroyed,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }

    pub fn is_destroyed(self) -> bool {
        self == Self::Destroyed
    }
}

/// 代理对象状态（原子版本，用于线程间共享）
#[derive(Debug)]
pub struct AtomicProxyState {
    inner: AtomicU8,
}

impl AtomicProxyState {
    pub fn new(state: ProxyState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    pub fn get(&self, ordering: Ordering) -> ProxyState {
        ProxyState::from_u8(self.inner.load(ordering))
    }

    /// 比较并交换
    ///
    /// 失败时返回实际的当前状态。
    pub fn compare_exchange(
        &self,
        current: ProxyState,
        new: ProxyState,
        success: Ordering,
        failure: Ordering,
    ) -> Result<ProxyState, ProxyState> {
        self.inner
            .compare_exchange(current.as_u8(), new.as_u8(), success, failure)
            .map(ProxyState::from_u8)
            .map_err(ProxyState::from_u8)
    }

    /// 无条件写入新状态，返回旧状态
    pub fn swap(&self, new: ProxyState, ordering: Ordering) -> ProxyState {
        ProxyState::from_u8(self.inner.swap(new.as_u8(), ordering))
    }
}

/// 原生槽位
#[derive(Debug)]
pub struct NativeSlot {
    id: ProxyId,
    kind: ProxyKind,
    state: AtomicProxyState,
    handle: OnceLock<NativeHandle>,
}

impl NativeSlot {
    /// 创建处于 `Uninitialized` 状态的槽位
    pub fn new(kind: ProxyKind) -> Self {
        Self {
            id: ProxyId::next(),
            kind,
            state: AtomicProxyState::new(ProxyState::Uninitialized),
            handle: OnceLock::new(),
        }
    }

    pub fn id(&self) -> ProxyId {
        self.id
    }

    pub fn kind(&self) -> ProxyKind {
        self.kind
    }

    pub fn state(&self) -> ProxyState {
        self.state.get(Ordering::Acquire)
    }

    /// 获取原生句柄（仅工作线程）
    ///
    /// 两级检查：
    /// 1. 没有令牌 → `AccessDenied`
    /// 2. 句柄尚未创建 → `NotReady`；已释放 → `Destroyed`
    pub fn native_handle(
        &self,
        access: Option<&HandleAccess>,
    ) -> Result<NativeHandle, BridgeError> {
        if access.is_none() {
            return Err(BridgeError::AccessDenied);
        }

        match self.state() {
            ProxyState::Ready => self.handle.get().copied().ok_or(BridgeError::NotReady),
            ProxyState::Destroyed => Err(BridgeError::Destroyed),
            ProxyState::Uninitialized | ProxyState::Pending => Err(BridgeError::NotReady),
        }
    }

    /// 创建命令入队前调用：`Uninitialized -> Pending`
    pub(crate) fn mark_pending(&self) -> Result<(), BridgeError> {
        self.transition(ProxyState::Uninitialized, ProxyState::Pending)
    }

    /// 创建命令入队失败时回退：`Pending -> Uninitialized`
    pub(crate) fn revert_pending(&self) {
        let _ = self.transition(ProxyState::Pending, ProxyState::Uninitialized);
    }

    /// 工作线程创建成功：写入句柄并进入 `Ready`
    pub(crate) fn complete_creation(
        &self,
        handle: NativeHandle,
        _access: &HandleAccess,
    ) -> Result<(), BridgeError> {
        if self.handle.set(handle).is_err() {
            return Err(BridgeError::InvalidTransition {
                from: self.state(),
                to: ProxyState::Ready,
            });
        }
        self.transition(ProxyState::Pending, ProxyState::Ready)
    }

    /// 工作线程创建失败：回到无句柄状态
    pub(crate) fn fail_creation(&self, _access: &HandleAccess) {
        let _ = self.transition(ProxyState::Pending, ProxyState::Uninitialized);
    }

    /// 工作线程释放句柄：进入 `Destroyed`
    ///
    /// 仅当之前处于 `Ready` 时返回句柄，调用方负责销毁原生对象。
    pub(crate) fn release(&self, _access: &HandleAccess) -> Option<NativeHandle> {
        match self.state.swap(ProxyState::Destroyed, Ordering::AcqRel) {
            ProxyState::Ready => self.handle.get().copied(),
            _ => None,
        }
    }

    fn transition(&self, from: ProxyState, to: ProxyState) -> Result<(), BridgeError> {
        self.state
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|actual| BridgeError::InvalidTransition { from: actual, to })
    }
}
