//! 类型解析器抽象接口
//!
//! 提供限定符感知的实现解析，以及按线程保存的构造栈

use di_common::{BindingKey, ClassDescriptor, DependencyError, DependencyResult, TypeName, TypeRef};
use std::cell::RefCell;
use std::sync::Arc;

/// 类型解析器 trait
///
/// 负责为请求的类型和限定符选出具体实现类
pub trait TypeResolver: Send + Sync {
    /// 解析唯一实现；没有候选返回 `Unsatisfied`，多个候选返回 `Ambiguous`
    fn resolve_one(&self, key: &BindingKey) -> DependencyResult<Arc<ClassDescriptor>>;

    /// 解析所有满足限定符的候选实现（`Any` 返回全部候选）
    fn resolve_all(&self, key: &BindingKey) -> DependencyResult<Vec<Arc<ClassDescriptor>>>;

    /// 候选类是否可赋值给目标类型
    fn is_assignable(&self, target: &TypeRef, candidate: &ClassDescriptor) -> DependencyResult<bool>;

    /// 按名称查找类描述符
    fn lookup(&self, name: &TypeName) -> DependencyResult<Option<Arc<ClassDescriptor>>>;
}

thread_local! {
    /// 当前线程上正在构造的类型
    static CONSTRUCTION_STACK: RefCell<Vec<TypeName>> = const { RefCell::new(Vec::new()) };
}

/// 解析上下文
///
/// 构造栈按线程保存：同一线程上嵌套的注入调用（例如构造函数里调用句柄的 `get()`）
/// 看到外层调用已经压入的类型，不同线程互不可见。
/// 上下文丢弃时弹出自己压入但尚未弹出的类型。
#[derive(Debug)]
pub struct ResolveContext {
    /// 创建时线程构造栈的深度
    base: usize,
    /// 本上下文压入且尚未弹出的类型数
    pushed: usize,
}

impl ResolveContext {
    /// 在当前线程的构造栈之上创建解析上下文
    pub fn new() -> Self {
        Self {
            base: CONSTRUCTION_STACK.with(|stack| stack.borrow().len()),
            pushed: 0,
        }
    }

    /// 添加类型到构造链，已在链中时报告完整的循环路径
    pub fn push_type(&mut self, name: &TypeName) -> Result<(), DependencyError> {
        CONSTRUCTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(name) {
                let chain = stack
                    .iter()
                    .chain(std::iter::once(name))
                    .map(TypeName::as_str)
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(DependencyError::CircularDependency {
                    dependency_chain: chain,
                });
            }
            stack.push(name.clone());
            self.pushed += 1;
            Ok(())
        })
    }

    /// 从构造链中移除本上下文最后压入的类型
    pub fn pop_type(&mut self) {
        if self.pushed == 0 {
            return;
        }
        self.pushed -= 1;
        CONSTRUCTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }

    /// 当前线程的构造深度（包含外层调用）
    pub fn depth(&self) -> usize {
        CONSTRUCTION_STACK.with(|stack| stack.borrow().len())
    }

    /// 当前线程的构造链
    pub fn chain(&self) -> Vec<TypeName> {
        CONSTRUCTION_STACK.with(|stack| stack.borrow().clone())
    }
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ResolveContext {
    fn drop(&mut self) {
        if self.pushed > 0 {
            let base = self.base;
            CONSTRUCTION_STACK.with(|stack| stack.borrow_mut().truncate(base));
        }
    }
}
