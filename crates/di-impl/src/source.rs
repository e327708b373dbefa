//! 类型来源实现
//!
//! [`DescriptorLoader`] 在内存中保存类描述符，[`PackageScanner`] 按配置的包前缀扫描并缓存结果。

use crate::cache::MemoCache;
use di_abstractions::{package_matches, ClassLoader, ClassSource, DiscoveryConfig, DiscoveryMode, TypeUniverse};
use di_common::{ClassDescriptor, Describe, ScanError, ScanResult};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// 内存类型加载器
#[derive(Debug)]
pub struct DescriptorLoader {
    id: String,
    classes: RwLock<Vec<Arc<ClassDescriptor>>>,
}

impl DescriptorLoader {
    /// 创建加载器
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            classes: RwLock::new(Vec::new()),
        }
    }

    /// 注册可描述类型
    pub fn register<T: Describe>(&self) -> Arc<ClassDescriptor> {
        self.register_descriptor(T::describe())
    }

    /// 注册类描述符
    pub fn register_descriptor(&self, descriptor: ClassDescriptor) -> Arc<ClassDescriptor> {
        let descriptor = Arc::new(descriptor);
        debug!("注册类描述符: {} ({})", descriptor.name, descriptor.package);
        self.classes.write().push(descriptor.clone());
        descriptor
    }

    /// 构建器风格注册可描述类型
    pub fn with<T: Describe>(self) -> Self {
        self.register::<T>();
        self
    }

    /// 构建器风格注册类描述符
    pub fn with_descriptor(self, descriptor: ClassDescriptor) -> Self {
        self.register_descriptor(descriptor);
        self
    }

    /// 已注册的描述符数量
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ClassLoader for DescriptorLoader {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self, package: &str) -> ScanResult<Vec<Arc<ClassDescriptor>>> {
        Ok(self
            .classes
            .read()
            .iter()
            .filter(|class| package_matches(package, &class.package))
            .cloned()
            .collect())
    }

    fn is_available(&self, name: &str) -> bool {
        self.classes.read().iter().any(|class| class.name.as_str() == name)
    }
}

/// 包扫描器
///
/// 绑定到第一次使用的加载器，之后拒绝其他加载器；扫描结果按加载器缓存。
pub struct PackageScanner {
    discovery: DiscoveryConfig,
    properties: HashMap<String, String>,
    cache: MemoCache<String, Arc<TypeUniverse>>,
    bound_loader: Mutex<Option<String>>,
}

impl PackageScanner {
    /// 默认缓存容量
    pub const DEFAULT_CAPACITY: usize = 16;

    /// 创建扫描器
    pub fn new(discovery: DiscoveryConfig) -> Self {
        Self {
            discovery,
            properties: HashMap::new(),
            cache: MemoCache::new(Self::DEFAULT_CAPACITY),
            bound_loader: Mutex::new(None),
        }
    }

    /// 设置用于排除条件的属性
    pub fn with_properties(mut self, properties: HashMap<String, String>) -> Self {
        self.properties = properties;
        self
    }

    /// 发现配置
    pub fn discovery(&self) -> &DiscoveryConfig {
        &self.discovery
    }

    /// 丢弃缓存的扫描结果，下次调用重新扫描
    pub fn refresh(&self) {
        self.cache.clear();
    }

    /// 缓存统计
    pub fn cache_stats(&self) -> crate::cache::CacheStats {
        self.cache.stats()
    }

    fn property(&self, name: &str) -> Option<String> {
        self.properties
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }

    fn scan(&self, loader: &dyn ClassLoader) -> ScanResult<Arc<TypeUniverse>> {
        if self.discovery.mode == DiscoveryMode::None {
            info!("发现模式为 none，跳过扫描");
            return Ok(Arc::new(TypeUniverse::default()));
        }

        let excludes: Vec<_> = self
            .discovery
            .exclude
            .iter()
            .filter(|rule| rule.is_active(|name| loader.is_available(name), |name| self.property(name)))
            .collect();
        for rule in &excludes {
            debug!("排除规则生效: {}", rule.package);
        }

        let root = [String::new()];
        let packages: &[String] = if self.discovery.packages.is_empty() {
            &root
        } else {
            &self.discovery.packages
        };

        let mut classes = Vec::new();
        for package in packages {
            for class in loader.load(package)? {
                if excludes.iter().any(|rule| rule.covers(&class.package)) {
                    continue;
                }
                if !self.discovery.mode.admits(&class) {
                    continue;
                }
                classes.push(class);
            }
        }

        let universe = TypeUniverse::new(classes);
        info!("扫描完成: 加载器 {}, {} 个类型", loader.id(), universe.len());
        Ok(Arc::new(universe))
    }
}

impl ClassSource for PackageScanner {
    fn all_classes(&self, loader: &dyn ClassLoader) -> ScanResult<Arc<TypeUniverse>> {
        {
            let mut bound = self.bound_loader.lock();
            match bound.as_deref() {
                Some(id) if id != loader.id() => {
                    return Err(ScanError::LoaderMismatch {
                        bound: id.to_string(),
                        requested: loader.id().to_string(),
                    });
                }
                Some(_) => {}
                None => *bound = Some(loader.id().to_string()),
            }
        }
        self.cache
            .compute_if_absent(loader.id().to_string(), || self.scan(loader))
    }
}

impl std::fmt::Debug for PackageScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageScanner")
            .field("discovery", &self.discovery)
            .field("bound_loader", &*self.bound_loader.lock())
            .finish_non_exhaustive()
    }
}
