//! 类型来源抽象接口
//!
//! 提供“某个包下所有可加载类型”的枚举能力

use di_common::{ClassDescriptor, ScanResult, TypeName};
use std::collections::HashMap;
use std::sync::Arc;

/// 类型加载器 trait
///
/// 按包前缀加载类描述符。
pub trait ClassLoader: Send + Sync {
    /// 加载器标识，用于缓存和“不混用加载器”检查
    fn id(&self) -> &str;

    /// 加载指定包（含子包）下的所有类描述符
    fn load(&self, package: &str) -> ScanResult<Vec<Arc<ClassDescriptor>>>;

    /// 指定名称的类型是否可加载
    fn is_available(&self, name: &str) -> bool;
}

/// 类型来源 trait
///
/// 对同一个加载器的多次调用必须返回同一结果；不能完成扫描时返回错误而不是部分结果。
pub trait ClassSource: Send + Sync {
    /// 获取类型全集
    fn all_classes(&self, loader: &dyn ClassLoader) -> ScanResult<Arc<TypeUniverse>>;
}

/// 类型全集
///
/// 有序、去重、不可变。
#[derive(Debug, Default)]
pub struct TypeUniverse {
    classes: Vec<Arc<ClassDescriptor>>,
    by_name: HashMap<TypeName, usize>,
}

impl TypeUniverse {
    /// 创建类型全集，同名类型保留第一次出现的
    pub fn new(classes: impl IntoIterator<Item = Arc<ClassDescriptor>>) -> Self {
        let mut universe = Self::default();
        for class in classes {
            if universe.by_name.contains_key(&class.name) {
                continue;
            }
            universe.by_name.insert(class.name.clone(), universe.classes.len());
            universe.classes.push(class);
        }
        universe
    }

    /// 按顺序返回所有类型
    pub fn classes(&self) -> &[Arc<ClassDescriptor>] {
        &self.classes
    }

    /// 按名称查找
    pub fn get(&self, name: &TypeName) -> Option<&Arc<ClassDescriptor>> {
        self.by_name.get(name).map(|index| &self.classes[*index])
    }

    /// 是否包含指定名称
    pub fn contains(&self, name: &TypeName) -> bool {
        self.by_name.contains_key(name)
    }

    /// 类型数量
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
