//! 类型元数据定义
//!
//! 提供类型名称、类型引用（含泛型参数）以及绑定键

use crate::qualifier::QualifierSet;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// 类型名称
///
/// 引擎内部按值比较类型，不依赖 `TypeId`，因此接口和外部类型也可以有名称。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(Cow<'static, str>);

impl TypeName {
    /// 由静态字符串创建（可用于常量）
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// 创建类型名称
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// 获取名称字符串
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for TypeName {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

/// 类型引用
///
/// 普通类型或带有有序类型参数的参数化类型。数组和通配符只为了被拒绝而存在，
/// 可赋值性判断对它们一律返回 `false`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeRef {
    /// 普通类型
    Plain(TypeName),
    /// 参数化类型，例如 `List<String>`
    Parameterized { raw: TypeName, args: Vec<TypeRef> },
    /// 数组类型
    Array(Box<TypeRef>),
    /// 通配符
    Wildcard,
}

impl TypeRef {
    /// 创建普通类型引用
    pub fn plain(name: impl Into<TypeName>) -> Self {
        Self::Plain(name.into())
    }

    /// 创建参数化类型引用
    pub fn generic(raw: impl Into<TypeName>, args: impl IntoIterator<Item = TypeRef>) -> Self {
        Self::Parameterized {
            raw: raw.into(),
            args: args.into_iter().collect(),
        }
    }

    /// 创建数组类型引用
    pub fn array_of(element: TypeRef) -> Self {
        Self::Array(Box::new(element))
    }

    /// 原始类型名称（数组和通配符没有原始类型）
    pub fn raw(&self) -> Option<&TypeName> {
        match self {
            Self::Plain(name) => Some(name),
            Self::Parameterized { raw, .. } => Some(raw),
            Self::Array(_) | Self::Wildcard => None,
        }
    }

    /// 是否为参数化类型
    pub fn is_parameterized(&self) -> bool {
        matches!(self, Self::Parameterized { .. })
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(name) => write!(f, "{name}"),
            Self::Parameterized { raw, args } => {
                write!(f, "{raw}<")?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            Self::Array(element) => write!(f, "{element}[]"),
            Self::Wildcard => f.write_str("?"),
        }
    }
}

impl From<TypeName> for TypeRef {
    fn from(name: TypeName) -> Self {
        Self::Plain(name)
    }
}

impl From<&'static str> for TypeRef {
    fn from(name: &'static str) -> Self {
        Self::Plain(TypeName::from_static(name))
    }
}

/// 类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeKind {
    /// 可实例化的具体类
    #[default]
    Class,
    /// 抽象类
    Abstract,
    /// 接口
    Interface,
    /// 枚举
    Enum,
    /// 基本类型
    Primitive,
}

impl TypeKind {
    /// 是否可以直接实例化
    pub fn is_concrete(self) -> bool {
        matches!(self, Self::Class)
    }
}

/// 类型的嵌套方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Nesting {
    /// 顶层类型
    #[default]
    TopLevel,
    /// 静态嵌套类型
    StaticNested,
    /// 非静态内部类型
    Inner,
    /// 局部类型
    Local,
    /// 匿名类型
    Anonymous,
}

/// 绑定键
///
/// (类型, 限定符集合)，类型参数必须完全一致，不做协变匹配。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingKey {
    pub ty: TypeRef,
    pub qualifiers: QualifierSet,
}

impl BindingKey {
    /// 创建绑定键
    pub fn new(ty: impl Into<TypeRef>, qualifiers: QualifierSet) -> Self {
        Self {
            ty: ty.into(),
            qualifiers,
        }
    }

    /// 使用默认限定符创建绑定键
    pub fn of(ty: impl Into<TypeRef>) -> Self {
        Self::new(ty, QualifierSet::default())
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.qualifiers)
    }
}
