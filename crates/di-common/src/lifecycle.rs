//! 作用域标记

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// 作用域标记
///
/// 类上的作用域标记决定由哪个作用域处理器管理实例的身份和缓存。
/// 没有作用域标记的类每次注入都会创建新实例。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeMarker(Cow<'static, str>);

impl ScopeMarker {
    /// 内置单例作用域，优先于作用域注册表处理
    pub const SINGLETON: ScopeMarker = ScopeMarker::from_static("Singleton");

    /// 由静态字符串创建
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// 创建作用域标记
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// 名称
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 是否为内置单例作用域
    pub fn is_singleton(&self) -> bool {
        *self == Self::SINGLETON
    }
}

impl fmt::Display for ScopeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl From<&'static str> for ScopeMarker {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}
