//! 作用域处理器抽象接口

use di_common::{ClassDescriptor, DependencyResult, HookError, Instance};
use std::sync::Arc;

/// 实例创建回调
pub type InstanceSupplier<'a> = &'a mut dyn FnMut() -> DependencyResult<Instance>;

/// 作用域处理器 trait
///
/// 处理器决定带有对应作用域标记的类的实例身份和缓存策略：
/// 返回已缓存的实例，或调用 `create` 构建新实例。
pub trait ScopeHandler: Send + Sync {
    /// 获取实例
    fn get(&self, class: &Arc<ClassDescriptor>, create: InstanceSupplier<'_>) -> DependencyResult<Instance>;

    /// 关闭作用域，引擎关闭时调用
    fn close(&self) -> Result<(), HookError> {
        Ok(())
    }

    /// 处理器名称，用于日志
    fn name(&self) -> &str {
        "scope"
    }
}
