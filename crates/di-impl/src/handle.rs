//! 延迟解析句柄
//!
//! [`InstanceHandle`] 把“某类型加限定符的所有实现”包装成可以随时解析的值，
//! 注入句柄而不是实例可以打断构造期的循环依赖。

use crate::injector::Injector;
use di_common::{
    BindingKey, ClassBuilder, ClassDescriptor, DependencyError, DependencyResult, FromInstance, Instance, Qualifier,
    TypeKind, TypeRef,
};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;
use std::vec;
use tracing::debug;

static HANDLE_CLASS: Lazy<Arc<ClassDescriptor>> = Lazy::new(|| {
    Arc::new(
        ClassBuilder::<InstanceHandle>::new("InstanceHandle")
            .package("di_impl::handle")
            .kind(TypeKind::Interface)
            .build(),
    )
});

/// 延迟解析句柄
///
/// 句柄是不可变值：`select` 返回新句柄，不修改接收者。
/// 句柄持有注入器的引用，单例持有的句柄在注入器关闭后释放。
#[derive(Clone)]
pub struct InstanceHandle {
    injector: Injector,
    key: BindingKey,
}

impl InstanceHandle {
    pub(crate) fn new(injector: Injector, key: BindingKey) -> Self {
        Self { injector, key }
    }

    /// 句柄对应的绑定键
    pub fn key(&self) -> &BindingKey {
        &self.key
    }

    /// 解析并注入唯一实例
    pub fn get(&self) -> DependencyResult<Instance> {
        self.injector.inject_key(&self.key)
    }

    /// 解析唯一实例并转换为具体类型
    pub fn get_as<T: Any + Send + Sync>(&self) -> DependencyResult<Arc<T>> {
        Arc::<T>::from_instance(self.get()?)
    }

    /// 追加限定符，返回新句柄
    pub fn select(&self, qualifiers: impl IntoIterator<Item = Qualifier>) -> Self {
        self.select_type(self.key.ty.clone(), qualifiers)
    }

    /// 收窄类型并追加限定符，返回新句柄
    pub fn select_type(&self, ty: impl Into<TypeRef>, qualifiers: impl IntoIterator<Item = Qualifier>) -> Self {
        Self {
            injector: self.injector.clone(),
            key: BindingKey::new(ty, self.key.qualifiers.merge(qualifiers)),
        }
    }

    /// 遍历所有候选
    ///
    /// 候选集在调用时解析，解析失败立即返回错误；每个实例在迭代到时才构造。
    pub fn iter(&self) -> DependencyResult<HandleIter> {
        let classes = self.injector.resolve_all(&self.key)?;
        debug!("句柄候选: {} 共 {} 个", self.key, classes.len());
        Ok(HandleIter {
            injector: self.injector.clone(),
            classes: classes.into_iter(),
        })
    }

    /// 没有候选，或解析失败
    pub fn is_unsatisfied(&self) -> bool {
        self.candidate_count().map_or(true, |count| count == 0)
    }

    /// 多于一个候选；解析失败时为 `false`
    pub fn is_ambiguous(&self) -> bool {
        self.candidate_count().map_or(false, |count| count > 1)
    }

    fn candidate_count(&self) -> DependencyResult<usize> {
        Ok(self.injector.resolve_all(&self.key)?.len())
    }

    /// 对实例执行销毁前回调；`None` 和重复调用不做任何事
    pub fn destroy(&self, instance: Option<&Instance>) -> DependencyResult<()> {
        match instance {
            Some(instance) => self.injector.destroy(instance),
            None => Ok(()),
        }
    }

    /// 唯一候选的延迟构造句柄
    pub fn get_handle(&self) -> DependencyResult<CandidateHandle> {
        let class = self.injector.resolve_one(&self.key)?;
        Ok(CandidateHandle::new(self.injector.clone(), class))
    }

    /// 每个候选一个延迟构造句柄
    pub fn handles(&self) -> DependencyResult<Vec<CandidateHandle>> {
        Ok(self
            .injector
            .resolve_all(&self.key)?
            .into_iter()
            .map(|class| CandidateHandle::new(self.injector.clone(), class))
            .collect())
    }

    pub(crate) fn into_instance(self) -> Instance {
        Instance::new(Arc::new(self), HANDLE_CLASS.clone())
    }
}

impl FromInstance for InstanceHandle {
    fn from_instance(instance: Instance) -> DependencyResult<Self> {
        instance
            .downcast_ref::<InstanceHandle>()
            .cloned()
            .ok_or_else(|| DependencyError::TypeMismatch {
                expected: HANDLE_CLASS.name.to_string(),
                actual: instance.type_name().to_string(),
            })
    }
}

impl std::fmt::Debug for InstanceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceHandle").field("key", &self.key).finish()
    }
}

/// 候选迭代器
pub struct HandleIter {
    injector: Injector,
    classes: vec::IntoIter<Arc<ClassDescriptor>>,
}

impl Iterator for HandleIter {
    type Item = DependencyResult<Instance>;

    fn next(&mut self) -> Option<Self::Item> {
        let class = self.classes.next()?;
        Some(self.injector.construct(&class))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.classes.size_hint()
    }
}

impl ExactSizeIterator for HandleIter {}

enum HandleState {
    Pending,
    Ready(Instance),
    Destroyed,
}

/// 单个候选的延迟构造句柄
///
/// 第一次 `get()` 时构造，之后返回同一实例；`destroy()` 之后再 `get()` 返回非法状态错误。
pub struct CandidateHandle {
    injector: Injector,
    class: Arc<ClassDescriptor>,
    state: Mutex<HandleState>,
}

impl CandidateHandle {
    fn new(injector: Injector, class: Arc<ClassDescriptor>) -> Self {
        Self {
            injector,
            class,
            state: Mutex::new(HandleState::Pending),
        }
    }

    /// 候选类
    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    /// 是否已经构造
    pub fn is_constructed(&self) -> bool {
        matches!(*self.state.lock(), HandleState::Ready(_))
    }

    /// 获取实例，第一次调用时构造
    ///
    /// 构造在锁外进行；并发的首次调用中先发布的实例胜出。
    pub fn get(&self) -> DependencyResult<Instance> {
        if let Some(instance) = self.current()? {
            return Ok(instance);
        }
        let instance = self.injector.construct(&self.class)?;

        let mut state = self.state.lock();
        if let HandleState::Ready(existing) = &*state {
            return Ok(existing.clone());
        }
        if matches!(*state, HandleState::Pending) {
            *state = HandleState::Ready(instance.clone());
            return Ok(instance);
        }
        // 构造期间句柄被销毁
        drop(state);
        self.injector.destroy(&instance)?;
        Err(self.destroyed())
    }

    fn current(&self) -> DependencyResult<Option<Instance>> {
        match &*self.state.lock() {
            HandleState::Pending => Ok(None),
            HandleState::Ready(instance) => Ok(Some(instance.clone())),
            HandleState::Destroyed => Err(self.destroyed()),
        }
    }

    fn destroyed(&self) -> DependencyError {
        DependencyError::illegal_state(format!("句柄已销毁: {}", self.class.name))
    }

    /// 销毁句柄，可重复调用
    pub fn destroy(&self) -> DependencyResult<()> {
        let previous = std::mem::replace(&mut *self.state.lock(), HandleState::Destroyed);
        match previous {
            HandleState::Ready(instance) => self.injector.destroy(&instance),
            HandleState::Pending | HandleState::Destroyed => Ok(()),
        }
    }
}

impl std::fmt::Debug for CandidateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateHandle")
            .field("class", &self.class.name)
            .field("constructed", &self.is_constructed())
            .finish()
    }
}
