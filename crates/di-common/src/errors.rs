//! 错误类型定义

use thiserror::Error;

/// 用户回调（构造函数、注入方法、生命周期钩子）返回的错误
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// 依赖注入错误类型
///
/// 引擎对外只暴露这一种致命错误，消息中包含出错的类型、字段或构造函数以及违反的规则。
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("无效的注入目标: {type_name}, 违反规则: {rule}")]
    InvalidInjectionTarget { type_name: String, rule: String },

    #[error("构造函数解析失败: {type_name}, 原因: {message}")]
    ConstructorResolution { type_name: String, message: String },

    #[error("没有满足条件的实现: {key}")]
    Unsatisfied { key: String },

    #[error("存在多个满足条件的实现: {key}, 候选: [{candidates}]")]
    Ambiguous { key: String, candidates: String },

    #[error("循环依赖检测到: {dependency_chain}")]
    CircularDependency { dependency_chain: String },

    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed {
        type_name: String,
        source: HookError,
    },

    #[error("生命周期回调失败: {type_name}::{hook}, 原因: {source}")]
    LifecycleFailed {
        type_name: String,
        hook: String,
        source: HookError,
    },

    #[error("类型转换失败: 期望 {expected}, 实际 {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("参数缺失: {type_name} 的第 {index} 个参数")]
    MissingArgument { type_name: String, index: usize },

    #[error("非法状态: {message}")]
    IllegalState { message: String },

    #[error("类型扫描失败: {source}")]
    Scan {
        #[from]
        source: ScanError,
    },
}

impl DependencyError {
    /// 创建无效注入目标错误
    pub fn invalid_target(type_name: impl Into<String>, rule: impl Into<String>) -> Self {
        Self::InvalidInjectionTarget {
            type_name: type_name.into(),
            rule: rule.into(),
        }
    }

    /// 创建非法状态错误
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }

    /// 是否为“无满足实现”错误
    pub fn is_unsatisfied(&self) -> bool {
        matches!(self, Self::Unsatisfied { .. })
    }

    /// 是否为“多个实现”错误
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous { .. })
    }
}

/// 类型扫描错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("类型加载器不一致: 已绑定 {bound}, 请求 {requested}")]
    LoaderMismatch { bound: String, requested: String },

    #[error("包扫描失败: {package}, 原因: {message}")]
    LoadFailed { package: String, message: String },
}

impl ScanError {
    /// 创建包扫描失败错误
    pub fn load_failed(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LoadFailed {
            package: package.into(),
            message: message.into(),
        }
    }
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("不支持的配置格式: {path}")]
    UnsupportedFormat { path: String },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

impl ConfigError {
    /// 包装解析错误
    pub fn parse(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::ParseError {
            source: Box::new(source),
        }
    }
}

/// 结果类型别名
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type ScanResult<T> = Result<T, ScanError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
