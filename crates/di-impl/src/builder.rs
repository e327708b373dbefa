//! 注入器构建器

use crate::config::EngineConfig;
use crate::injector::Injector;
use crate::resolver::QualifiedTypeResolver;
use crate::source::{DescriptorLoader, PackageScanner};
use di_abstractions::{ClassLoader, ClassSource, ScopeHandler};
use di_common::{BindingKey, ClassDescriptor, Describe, DependencyError, DependencyResult, ScopeMarker, TypeName};
use std::sync::Arc;
use tracing::{debug, info};

/// 注入器构建器
///
/// 未指定加载器时使用内置的 [`DescriptorLoader`]，未指定类型来源时按配置创建 [`PackageScanner`]。
#[derive(Default)]
pub struct InjectorBuilder {
    loader: Option<Arc<dyn ClassLoader>>,
    source: Option<Arc<dyn ClassSource>>,
    config: EngineConfig,
    descriptors: Vec<ClassDescriptor>,
    bindings: Vec<(BindingKey, TypeName)>,
    alternatives: Vec<TypeName>,
    scopes: Vec<(ScopeMarker, Arc<dyn ScopeHandler>)>,
}

impl InjectorBuilder {
    /// 创建构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置类型加载器
    pub fn with_loader(mut self, loader: Arc<dyn ClassLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// 设置类型来源
    pub fn with_source(mut self, source: Arc<dyn ClassSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// 设置引擎配置
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// 添加扫描包
    pub fn scan_package(mut self, package: impl Into<String>) -> Self {
        self.config.discovery.packages.push(package.into());
        self
    }

    /// 登记可描述类型
    pub fn register<T: Describe>(self) -> Self {
        self.register_descriptor(T::describe())
    }

    /// 登记类描述符
    pub fn register_descriptor(mut self, descriptor: ClassDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// 启用备选实现
    pub fn enable_alternative(mut self, class: impl Into<TypeName>) -> Self {
        self.alternatives.push(class.into());
        self
    }

    /// 显式绑定
    pub fn bind(mut self, key: BindingKey, implementation: impl Into<TypeName>) -> Self {
        self.bindings.push((key, implementation.into()));
        self
    }

    /// 注册作用域处理器
    pub fn register_scope(mut self, marker: ScopeMarker, handler: Arc<dyn ScopeHandler>) -> Self {
        self.scopes.push((marker, handler));
        self
    }

    /// 构建注入器
    ///
    /// 构建时执行一次扫描，加载失败在这里返回。
    pub fn build(self) -> DependencyResult<Injector> {
        self.config
            .validate()
            .map_err(|e| DependencyError::illegal_state(e.to_string()))?;

        let mut extra = Vec::new();
        let loader: Arc<dyn ClassLoader> = match self.loader {
            Some(loader) => {
                extra = self.descriptors;
                loader
            }
            None => {
                let loader = DescriptorLoader::new("default");
                for descriptor in self.descriptors {
                    loader.register_descriptor(descriptor);
                }
                Arc::new(loader)
            }
        };
        let source: Arc<dyn ClassSource> = match self.source {
            Some(source) => source,
            None => Arc::new(
                PackageScanner::new(self.config.discovery.clone()).with_properties(self.config.properties.clone()),
            ),
        };

        let universe = source.all_classes(loader.as_ref())?;
        debug!("加载器 {} 扫描到 {} 个类型", loader.id(), universe.len());

        let resolver = QualifiedTypeResolver::with_capacity(loader, source, self.config.cache.capacity);
        for class in self.config.discovery.alternatives.iter().cloned().chain(self.alternatives) {
            resolver.enable_alternative(class);
        }
        for (key, implementation) in self.bindings {
            resolver.bind(key, implementation);
        }
        for descriptor in extra {
            resolver.add_class(Arc::new(descriptor))?;
        }

        let injector = Injector::new(resolver);
        for (marker, handler) in self.scopes {
            injector.register_scope(marker, handler);
        }

        info!("注入器构建完成: {:?}", injector.stats());
        Ok(injector)
    }
}
