//! # DI Common
//!
//! 依赖注入引擎各层共享的值类型。
//!
//! ## 核心类型
//!
//! - [`Qualifier`] / [`QualifierSet`] - 结构相等的限定符
//! - [`TypeRef`] / [`BindingKey`] - 类型引用（含泛型参数）与绑定键
//! - [`ClassDescriptor`] / [`ClassBuilder`] - 代替运行时反射的描述符表
//! - [`Instance`] - 类型擦除的注入实例
//! - [`DependencyError`] - 引擎统一的致命错误类型
//!
//! ## 设计原则
//!
//! - 描述符每个类型只构建一次，引擎只读描述符
//! - 限定符、类型引用都是纯数据，按值比较
//! - 回调按具体类型编写，由构建器擦除

pub mod component;
pub mod errors;
pub mod instance;
pub mod lifecycle;
pub mod metadata;
pub mod qualifier;

pub use component::*;
pub use errors::*;
pub use instance::*;
pub use lifecycle::*;
pub use metadata::*;
pub use qualifier::*;
