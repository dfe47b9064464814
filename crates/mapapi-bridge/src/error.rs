//! 桥接层错误类型定义

use crate::slot::ProxyState;
use mapapi_native::NativeError;
use thiserror::Error;

/// 桥接层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// 未出示访问令牌就请求原生句柄
    ///
    /// 这是协作方的编程错误，而不是用户输入错误。
    #[error("Null access token: native handle access is reserved for the native bridge")]
    AccessDenied,

    /// 异步创建完成之前请求原生句柄
    #[error("Native handle not available")]
    NotReady,

    /// 代理对象已销毁
    #[error("Proxy object has been destroyed")]
    Destroyed,

    /// 非法的状态转换
    #[error("Invalid proxy state transition: {from:?} -> {to:?}")]
    InvalidTransition { from: ProxyState, to: ProxyState },

    /// 命令通道已关闭（工作线程退出）
    #[error("Command channel closed")]
    ChannelClosed,

    /// 原生引擎错误
    #[error("Native engine error: {0}")]
    Native(#[from] NativeError),

    /// 工作线程错误
    #[error("Worker thread error: {0}")]
    WorkerThread(String),

    /// 操作超时
    #[error("Operation timeout")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapapi_native::NativeHandle;

    #[test]
    fn test_bridge_error_display() {
        let msg = format!("{}", BridgeError::AccessDenied);
        assert!(msg.contains("Null access token"));

        assert_eq!(
            format!("{}", BridgeError::NotReady),
            "Native handle not available"
        );
        assert_eq!(format!("{}", BridgeError::ChannelClosed), "Command channel closed");
        assert_eq!(format!("{}", BridgeError::Timeout), "Operation timeout");

        let msg = format!(
            "{}",
            BridgeError::InvalidTransition {
                from: ProxyState::Ready,
                to: ProxyState::Pending,
            }
        );
        assert!(msg.contains("Ready") && msg.contains("Pending"));

        let msg = format!("{}", BridgeError::WorkerThread("spawn failed".to_string()));
        assert!(msg.contains("Worker thread") && msg.contains("spawn failed"));
    }

    #[test]
    fn test_from_native_error() {
        let err: BridgeError = NativeError::UnknownHandle(NativeHandle::new(4)).into();
        match err {
            BridgeError::Native(NativeError::UnknownHandle(handle)) => {
                assert_eq!(handle.raw(), 4)
            },
            other => panic!("Expected Native variant, got {:?}", other),
        }
    }
}
