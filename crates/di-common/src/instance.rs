//! 类型擦除的实例与参数

use crate::component::ClassDescriptor;
use crate::errors::{DependencyError, DependencyResult};
use crate::metadata::TypeName;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 类型擦除后的共享值
pub type ErasedValue = Arc<dyn Any + Send + Sync>;

/// 注入得到的实例
///
/// 克隆只复制引用，所有克隆共享同一个值和同一个销毁标记。
#[derive(Clone)]
pub struct Instance {
    value: ErasedValue,
    class: Arc<ClassDescriptor>,
    destroyed: Arc<AtomicBool>,
}

impl Instance {
    /// 包装一个值
    pub fn new(value: ErasedValue, class: Arc<ClassDescriptor>) -> Self {
        Self {
            value,
            class,
            destroyed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 实例所属类的描述符
    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    /// 实例所属类的名称
    pub fn type_name(&self) -> &TypeName {
        &self.class.name
    }

    /// 底层值
    pub fn value(&self) -> &ErasedValue {
        &self.value
    }

    /// 以 `&dyn Any` 访问底层值
    pub fn as_any(&self) -> &dyn Any {
        &*self.value
    }

    /// 转换为具体类型
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }

    /// 借用为具体类型
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// 转换为类声明过的接口视图，例如 `Arc<dyn Greeter>`
    pub fn cast<I: ?Sized + 'static>(&self) -> Option<Arc<I>> {
        self.class.cast::<I>(self.value.clone())
    }

    /// 是否指向同一个对象
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.value, &b.value)
    }

    /// 是否已经执行过销毁回调
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// 标记为已销毁；只有第一次调用返回 `true`
    pub fn mark_destroyed(&self) -> bool {
        !self.destroyed.swap(true, Ordering::AcqRel)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

/// 从注入实例转换为构造参数或字段值
pub trait FromInstance: Sized {
    /// 执行转换
    fn from_instance(instance: Instance) -> DependencyResult<Self>;
}

impl FromInstance for Instance {
    fn from_instance(instance: Instance) -> DependencyResult<Self> {
        Ok(instance)
    }
}

impl<T: Any + Send + Sync> FromInstance for Arc<T> {
    fn from_instance(instance: Instance) -> DependencyResult<Self> {
        instance
            .downcast::<T>()
            .ok_or_else(|| DependencyError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                actual: instance.type_name().to_string(),
            })
    }
}

/// 构造函数或注入方法的有序参数
#[derive(Debug)]
pub struct Arguments {
    owner: TypeName,
    values: std::vec::IntoIter<Instance>,
    index: usize,
}

impl Arguments {
    /// 创建参数游标
    pub fn new(owner: TypeName, values: Vec<Instance>) -> Self {
        Self {
            owner,
            values: values.into_iter(),
            index: 0,
        }
    }

    /// 取出下一个参数并转换为目标类型
    pub fn take<V: FromInstance>(&mut self) -> DependencyResult<V> {
        let index = self.index;
        self.index += 1;
        let instance = self.values.next().ok_or_else(|| DependencyError::MissingArgument {
            type_name: self.owner.to_string(),
            index,
        })?;
        V::from_instance(instance)
    }

    /// 剩余参数数量
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}
