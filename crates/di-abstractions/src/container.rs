//! 依赖注入容器抽象接口
//!
//! 提供依赖注入容器的核心抽象

use crate::registry::ScopeHandler;
use di_common::{BindingKey, DependencyResult, Instance, ScopeMarker, TypeName, TypeRef};
use std::sync::Arc;

/// 依赖注入容器 trait
///
/// 对象安全的容器门面，可以 `Arc<dyn DiContainer>` 形式传递
pub trait DiContainer: Send + Sync {
    /// 注入指定类型（默认限定符）
    fn inject(&self, ty: &TypeRef) -> DependencyResult<Instance>;

    /// 按绑定键注入
    fn inject_key(&self, key: &BindingKey) -> DependencyResult<Instance>;

    /// 显式绑定：覆盖某个绑定键的自动解析
    fn bind(&self, key: BindingKey, implementation: TypeName);

    /// 启用备选实现
    fn enable_alternative(&self, class: TypeName);

    /// 注册作用域处理器，返回被替换的旧处理器
    fn register_scope(&self, marker: ScopeMarker, handler: Arc<dyn ScopeHandler>) -> Option<Arc<dyn ScopeHandler>>;

    /// 对实例执行销毁前回调
    fn destroy(&self, instance: &Instance) -> DependencyResult<()>;

    /// 关闭容器
    fn shutdown(&self);
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// 活跃单例数量
    pub active_singletons: usize,
    /// 已注册的自定义作用域数量
    pub registered_scopes: usize,
    /// 显式绑定数量
    pub bindings: usize,
    /// 已启用的备选实现数量
    pub enabled_alternatives: usize,
}
