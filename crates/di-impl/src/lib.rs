//! # 依赖注入具体实现
//!
//! 提供限定符感知的类型解析器、对象图构建器、延迟解析句柄，
//! 以及类型扫描、缓存和配置等配套实现

pub mod builder;
pub mod cache;
pub mod config;
pub mod handle;
pub mod injector;
pub mod plan;
pub mod resolver;
pub mod scope;
pub mod source;

pub use builder::InjectorBuilder;
pub use cache::{CacheStats, MemoCache};
pub use config::{CacheConfig, EngineConfig};
pub use handle::{CandidateHandle, HandleIter, InstanceHandle};
pub use injector::Injector;
pub use plan::{InjectionPlan, PlanLevel};
pub use resolver::QualifiedTypeResolver;
pub use scope::MapScope;
pub use source::{DescriptorLoader, PackageScanner};

// 重新导出常用类型，使用方只依赖本 crate 即可
pub use di_abstractions::{
    ClassLoader, ClassSource, ContainerStats, DiContainer, DiscoveryConfig, DiscoveryMode, ExcludeRule,
    ResolveContext, ScopeHandler, TypeResolver, TypeUniverse,
};
pub use di_common::*;
