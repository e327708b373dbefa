//! 限定符模型
//!
//! 限定符是带有零个或多个命名属性的标签，按结构比较：标签相同且属性值全部相同才相等。

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// 限定符属性值
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeValue {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => write!(f, "{value:?}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// 限定符
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Qualifier {
    tag: Cow<'static, str>,
    attributes: BTreeMap<String, AttributeValue>,
}

impl Qualifier {
    /// 默认限定符：没有显式请求任何限定符
    pub const DEFAULT: Qualifier = Qualifier::marker("Default");

    /// 任意限定符：忽略限定符匹配所有实现
    pub const ANY: Qualifier = Qualifier::marker("Any");

    /// 命名限定符使用的标签
    pub const NAMED_TAG: &'static str = "Named";

    /// 创建不带属性的标记限定符
    pub const fn marker(tag: &'static str) -> Self {
        Self {
            tag: Cow::Borrowed(tag),
            attributes: BTreeMap::new(),
        }
    }

    /// 创建限定符
    pub fn new(tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// 创建命名限定符 `@Named(value = ..)`
    pub fn named(value: impl Into<String>) -> Self {
        Self::new(Self::NAMED_TAG).with_attribute("value", value.into())
    }

    /// 添加属性
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// 标签
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// 获取属性值
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// 所有属性（按名称排序）
    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    /// 是否为默认限定符
    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }

    /// 是否为任意限定符
    pub fn is_any(&self) -> bool {
        *self == Self::ANY
    }

    /// 是否为显式限定符（既不是 Default 也不是 Any）
    pub fn is_explicit(&self) -> bool {
        !self.is_default() && !self.is_any()
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.tag)?;
        if self.attributes.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (index, (name, value)) in self.attributes.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name} = {value}")?;
        }
        f.write_str(")")
    }
}

/// 限定符集合
///
/// 空集合等价于 `{Default}`。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifierSet(BTreeSet<Qualifier>);

impl QualifierSet {
    /// 由限定符列表创建；列表为空时得到默认集合
    pub fn of(qualifiers: impl IntoIterator<Item = Qualifier>) -> Self {
        let set: BTreeSet<Qualifier> = qualifiers.into_iter().collect();
        if set.is_empty() {
            Self::default()
        } else {
            Self(set)
        }
    }

    /// `{Any}`
    pub fn any() -> Self {
        Self(BTreeSet::from([Qualifier::ANY]))
    }

    /// 是否请求任意实现
    pub fn is_any(&self) -> bool {
        self.0.contains(&Qualifier::ANY)
    }

    /// 是否只请求默认实现
    pub fn is_default(&self) -> bool {
        !self.is_any() && self.explicit().next().is_none()
    }

    /// 显式限定符
    pub fn explicit(&self) -> impl Iterator<Item = &Qualifier> {
        self.0.iter().filter(|qualifier| qualifier.is_explicit())
    }

    /// 是否包含指定限定符
    pub fn contains(&self, qualifier: &Qualifier) -> bool {
        self.0.contains(qualifier)
    }

    /// 遍历所有限定符
    pub fn iter(&self) -> impl Iterator<Item = &Qualifier> {
        self.0.iter()
    }

    /// 限定符数量
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否为空（正常构造的集合不会为空）
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 合并限定符，返回新集合
    ///
    /// 新限定符替换 Default，其余限定符保留；不修改接收者。
    pub fn merge(&self, additional: impl IntoIterator<Item = Qualifier>) -> Self {
        let additional: Vec<Qualifier> = additional.into_iter().collect();
        if additional.is_empty() {
            return self.clone();
        }
        let mut merged: BTreeSet<Qualifier> = self
            .0
            .iter()
            .filter(|qualifier| !qualifier.is_default())
            .cloned()
            .collect();
        merged.extend(additional);
        Self(merged)
    }
}

impl Default for QualifierSet {
    fn default() -> Self {
        Self(BTreeSet::from([Qualifier::DEFAULT]))
    }
}

impl FromIterator<Qualifier> for QualifierSet {
    fn from_iter<I: IntoIterator<Item = Qualifier>>(iter: I) -> Self {
        Self::of(iter)
    }
}

impl fmt::Display for QualifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (index, qualifier) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{qualifier}")?;
        }
        f.write_str("]")
    }
}
