//! 声明式类型发现配置
//!
//! 描述扫描哪些包、排除哪些包以及预先启用哪些备选实现

use di_common::{ClassDescriptor, TypeName};
use serde::{Deserialize, Serialize};

/// 发现模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    /// 扫描包内所有类型
    #[default]
    All,
    /// 只保留带作用域标记的具体类（接口和抽象类保留以便解析层次结构）
    Annotated,
    /// 不扫描任何类型
    None,
}

impl DiscoveryMode {
    /// 在当前模式下是否保留该类型
    pub fn admits(self, class: &ClassDescriptor) -> bool {
        match self {
            Self::All => true,
            Self::Annotated => !class.is_concrete() || class.scope.is_some(),
            Self::None => false,
        }
    }
}

/// 属性条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyCondition {
    pub name: String,
    pub value: String,
}

/// 条件排除规则
///
/// 所有给出的条件都成立时规则生效；没有条件的规则总是生效。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludeRule {
    /// 排除的包（含子包）
    pub package: String,
    #[serde(default)]
    pub if_class_available: Option<String>,
    #[serde(default)]
    pub if_class_not_available: Option<String>,
    #[serde(default)]
    pub if_property: Option<PropertyCondition>,
}

impl ExcludeRule {
    /// 创建无条件排除规则
    pub fn package(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            if_class_available: None,
            if_class_not_available: None,
            if_property: None,
        }
    }

    /// 规则是否生效
    pub fn is_active<A, P>(&self, is_available: A, property: P) -> bool
    where
        A: Fn(&str) -> bool,
        P: Fn(&str) -> Option<String>,
    {
        if let Some(name) = &self.if_class_available {
            if !is_available(name) {
                return false;
            }
        }
        if let Some(name) = &self.if_class_not_available {
            if is_available(name) {
                return false;
            }
        }
        if let Some(condition) = &self.if_property {
            if property(&condition.name).as_deref() != Some(condition.value.as_str()) {
                return false;
            }
        }
        true
    }

    /// 包名是否落在规则范围内
    pub fn covers(&self, package: &str) -> bool {
        package_matches(&self.package, package)
    }
}

/// 类型发现配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub mode: DiscoveryMode,
    /// 扫描的包前缀
    pub packages: Vec<String>,
    /// 预先启用的备选实现
    pub alternatives: Vec<TypeName>,
    pub exclude: Vec<ExcludeRule>,
}

impl DiscoveryConfig {
    /// 添加扫描包
    pub fn add_package<S: Into<String>>(mut self, package: S) -> Self {
        self.packages.push(package.into());
        self
    }

    /// 添加备选实现
    pub fn add_alternative<S: Into<TypeName>>(mut self, class: S) -> Self {
        self.alternatives.push(class.into());
        self
    }

    /// 添加排除规则
    pub fn add_exclude(mut self, rule: ExcludeRule) -> Self {
        self.exclude.push(rule);
        self
    }

    /// 设置发现模式
    pub fn with_mode(mut self, mode: DiscoveryMode) -> Self {
        self.mode = mode;
        self
    }
}

/// 包前缀匹配，按 `::` 分段：`a::b` 匹配 `a::b` 和 `a::b::c`，不匹配 `a::bc`；空前缀匹配所有包
pub fn package_matches(prefix: &str, package: &str) -> bool {
    if prefix.is_empty() || prefix == package {
        return true;
    }
    package
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with("::"))
}
