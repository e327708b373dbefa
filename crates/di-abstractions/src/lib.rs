//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义类型来源、类型解析、作用域和容器的核心接口。
//!
//! ## 核心接口
//!
//! - [`ClassLoader`] / [`ClassSource`] - 类型全集的来源
//! - [`TypeResolver`] - 限定符感知的实现解析
//! - [`ScopeHandler`] - 自定义作用域处理器
//! - [`DiContainer`] - 容器门面
//! - [`ResolveContext`] - 按线程保存的构造栈

pub mod container;
pub mod discovery;
pub mod registry;
pub mod resolver;
pub mod scanner;

pub use container::*;
pub use discovery::*;
pub use registry::*;
pub use resolver::*;
pub use scanner::*;
