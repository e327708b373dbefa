//! 内置作用域处理器

use di_abstractions::{InstanceSupplier, ScopeHandler};
use di_common::{ClassDescriptor, DependencyResult, HookError, Instance, TypeName};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// 基于映射表的作用域
///
/// 同一作用域存活期间每个类只创建一次实例；`clear()` 结束当前作用域。
#[derive(Debug)]
pub struct MapScope {
    name: String,
    instances: Mutex<HashMap<TypeName, Instance>>,
    calls: AtomicUsize,
}

impl MapScope {
    /// 创建作用域
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instances: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// 清空作用域内的实例
    pub fn clear(&self) {
        self.instances.lock().clear();
    }

    /// `get` 被调用的次数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 当前缓存的实例数量
    pub fn len(&self) -> usize {
        self.instances.lock().len()
    }

    /// 是否没有缓存实例
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScopeHandler for MapScope {
    fn get(&self, class: &Arc<ClassDescriptor>, create: InstanceSupplier<'_>) -> DependencyResult<Instance> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(existing) = self.instances.lock().get(&class.name) {
            return Ok(existing.clone());
        }
        // 构造期间不持有锁，依赖可能进入同一个作用域
        let created = create()?;
        let mut instances = self.instances.lock();
        let instance = instances.entry(class.name.clone()).or_insert(created).clone();
        debug!("作用域 {} 缓存实例: {}", self.name, class.name);
        Ok(instance)
    }

    fn close(&self) -> Result<(), HookError> {
        self.clear();
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
