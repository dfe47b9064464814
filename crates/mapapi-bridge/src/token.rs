//! 原生句柄访问令牌
//!
//! 只有桥接层（工作线程）能够构造 [`HandleAccess`]，
//! 因此只有桥接层能够从代理对象中取出原生句柄。
//! 应用代码和客户端层可以看到这个类型，但无法创建它的实例。

/// 原生句柄访问令牌（零大小类型）
///
/// - 类型大小：0 字节
/// - 构造函数仅在本 crate 内可见
/// - 每个工作线程持有一个实例
#[derive(Debug)]
pub struct HandleAccess(());

impl HandleAccess {
    pub(crate) const fn new() -> Self {
        Self(())
    }
}
