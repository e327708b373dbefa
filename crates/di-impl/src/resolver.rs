//! 限定符感知的类型解析器

use crate::cache::{CacheStats, MemoCache};
use dashmap::{DashMap, DashSet};
use di_abstractions::{ClassLoader, ClassSource, TypeResolver, TypeUniverse};
use di_common::{
    BindingKey, ClassDescriptor, DependencyError, DependencyResult, QualifierSet, TypeName, TypeRef,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

type CandidateSet = Arc<[Arc<ClassDescriptor>]>;

/// 单次匹配过程内的可赋值性缓存
type AssignMemo = HashMap<(TypeRef, TypeName), bool>;

/// 限定符感知的类型解析器
///
/// 类型全集来自 [`ClassSource`]，另外可以直接追加描述符。
/// 可赋值候选集按请求类型缓存，备选实现和限定符在每次调用时过滤。
pub struct QualifiedTypeResolver {
    loader: Arc<dyn ClassLoader>,
    source: Arc<dyn ClassSource>,
    bindings: DashMap<BindingKey, TypeName>,
    enabled_alternatives: DashSet<TypeName>,
    extra_classes: DashMap<TypeName, Arc<ClassDescriptor>>,
    candidates: MemoCache<TypeRef, CandidateSet>,
}

impl QualifiedTypeResolver {
    /// 默认候选集缓存容量
    pub const DEFAULT_CAPACITY: usize = 256;

    /// 创建解析器
    pub fn new(loader: Arc<dyn ClassLoader>, source: Arc<dyn ClassSource>) -> Self {
        Self::with_capacity(loader, source, Self::DEFAULT_CAPACITY)
    }

    /// 指定候选集缓存容量创建解析器
    pub fn with_capacity(loader: Arc<dyn ClassLoader>, source: Arc<dyn ClassSource>, capacity: usize) -> Self {
        Self {
            loader,
            source,
            bindings: DashMap::new(),
            enabled_alternatives: DashSet::new(),
            extra_classes: DashMap::new(),
            candidates: MemoCache::new(capacity),
        }
    }

    /// 显式绑定
    pub fn bind(&self, key: BindingKey, implementation: TypeName) {
        debug!("显式绑定: {} -> {}", key, implementation);
        self.bindings.insert(key, implementation);
    }

    /// 启用备选实现
    pub fn enable_alternative(&self, class: TypeName) {
        debug!("启用备选实现: {}", class);
        self.enabled_alternatives.insert(class);
    }

    /// 备选实现是否已启用
    pub fn is_alternative_enabled(&self, class: &TypeName) -> bool {
        self.enabled_alternatives.contains(class)
    }

    /// 追加不经扫描的类描述符，已存在同名类型时返回已有描述符
    pub fn add_class(&self, class: Arc<ClassDescriptor>) -> DependencyResult<Arc<ClassDescriptor>> {
        if let Some(existing) = self.lookup(&class.name)? {
            return Ok(existing);
        }
        let entry = self.extra_classes.entry(class.name.clone()).or_insert(class);
        let class = entry.value().clone();
        drop(entry);
        self.candidates.clear();
        Ok(class)
    }

    /// 显式绑定数量
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// 已启用的备选实现数量
    pub fn enabled_alternative_count(&self) -> usize {
        self.enabled_alternatives.len()
    }

    /// 候选集缓存统计
    pub fn cache_stats(&self) -> CacheStats {
        self.candidates.stats()
    }

    fn universe(&self) -> DependencyResult<Arc<TypeUniverse>> {
        Ok(self.source.all_classes(self.loader.as_ref())?)
    }

    fn all_classes(&self) -> DependencyResult<Vec<Arc<ClassDescriptor>>> {
        let universe = self.universe()?;
        let mut classes = universe.classes().to_vec();
        classes.extend(
            self.extra_classes
                .iter()
                .filter(|entry| !universe.contains(entry.key()))
                .map(|entry| entry.value().clone()),
        );
        Ok(classes)
    }

    /// 所有可赋值给 `ty` 的具体类（未过滤备选实现）
    fn assignable_classes(&self, ty: &TypeRef) -> DependencyResult<CandidateSet> {
        self.candidates.compute_if_absent::<DependencyError, _>(ty.clone(), || {
            let mut memo = AssignMemo::new();
            let mut found = Vec::new();
            for class in self.all_classes()? {
                if class.is_concrete() && self.assignable(ty, &class, &mut memo)? {
                    found.push(class);
                }
            }
            debug!("候选集计算完成: {} 共 {} 个", ty, found.len());
            Ok(found.into())
        })
    }

    fn candidate_set(&self, ty: &TypeRef) -> DependencyResult<Vec<Arc<ClassDescriptor>>> {
        Ok(self
            .assignable_classes(ty)?
            .iter()
            .filter(|class| !class.alternative || self.enabled_alternatives.contains(&class.name))
            .cloned()
            .collect())
    }

    fn assignable(&self, target: &TypeRef, class: &ClassDescriptor, memo: &mut AssignMemo) -> DependencyResult<bool> {
        let memo_key = (target.clone(), class.name.clone());
        if let Some(known) = memo.get(&memo_key) {
            return Ok(*known);
        }
        // 层次结构中出现环时按不可赋值处理
        memo.insert(memo_key.clone(), false);

        let result = match target {
            TypeRef::Plain(name) => self.is_subtype(target, name, class, memo)?,
            TypeRef::Parameterized { raw, args } => self.matches_parameterized(target, raw, args, class, memo)?,
            TypeRef::Array(_) | TypeRef::Wildcard => false,
        };
        memo.insert(memo_key, result);
        Ok(result)
    }

    fn is_subtype(
        &self,
        target: &TypeRef,
        name: &TypeName,
        class: &ClassDescriptor,
        memo: &mut AssignMemo,
    ) -> DependencyResult<bool> {
        if &class.name == name {
            return Ok(true);
        }
        for supertype in class.supertypes() {
            let Some(raw) = supertype.raw() else {
                continue;
            };
            if raw == name {
                return Ok(true);
            }
            if let Some(parent) = self.lookup(raw)? {
                if self.assignable(target, &parent, memo)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn matches_parameterized(
        &self,
        target: &TypeRef,
        raw: &TypeName,
        args: &[TypeRef],
        class: &ClassDescriptor,
        memo: &mut AssignMemo,
    ) -> DependencyResult<bool> {
        for supertype in class.supertypes() {
            if let TypeRef::Parameterized {
                raw: super_raw,
                args: super_args,
            } = supertype
            {
                if super_raw == raw && super_args.as_slice() == args {
                    return Ok(true);
                }
            }
            let Some(super_raw) = supertype.raw() else {
                continue;
            };
            if let Some(parent) = self.lookup(super_raw)? {
                if self.assignable(target, &parent, memo)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn filter_qualified(candidates: Vec<Arc<ClassDescriptor>>, qualifiers: &QualifierSet) -> Vec<Arc<ClassDescriptor>> {
        if qualifiers.explicit().next().is_none() {
            if qualifiers.is_any() {
                return candidates;
            }
            return candidates
                .into_iter()
                .filter(|class| !class.has_explicit_qualifier())
                .collect();
        }
        // Any 与显式限定符同时出现时按显式限定符过滤
        candidates
            .into_iter()
            .filter(|class| qualifiers.explicit().all(|qualifier| class.has_qualifier(qualifier)))
            .collect()
    }

    fn bound_class(&self, key: &BindingKey) -> DependencyResult<Option<Arc<ClassDescriptor>>> {
        let Some(bound) = self.bindings.get(key).map(|entry| entry.value().clone()) else {
            return Ok(None);
        };
        match self.lookup(&bound)? {
            Some(class) => Ok(Some(class)),
            None => Err(DependencyError::Unsatisfied {
                key: format!("{key} -> {bound}"),
            }),
        }
    }

    /// 请求本身就是具体类时返回它
    fn concrete_request(&self, ty: &TypeRef) -> DependencyResult<Option<Arc<ClassDescriptor>>> {
        let Some(raw) = ty.raw() else {
            return Ok(None);
        };
        Ok(self.lookup(raw)?.filter(|class| class.is_concrete()))
    }
}

impl TypeResolver for QualifiedTypeResolver {
    fn resolve_one(&self, key: &BindingKey) -> DependencyResult<Arc<ClassDescriptor>> {
        if let Some(class) = self.bound_class(key)? {
            return Ok(class);
        }
        if let Some(class) = self.concrete_request(&key.ty)? {
            return Ok(class);
        }

        let mut matched = Self::filter_qualified(self.candidate_set(&key.ty)?, &key.qualifiers);
        match matched.len() {
            0 => Err(DependencyError::Unsatisfied { key: key.to_string() }),
            1 => Ok(matched.remove(0)),
            _ => Err(DependencyError::Ambiguous {
                key: key.to_string(),
                candidates: matched
                    .iter()
                    .map(|class| class.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    fn resolve_all(&self, key: &BindingKey) -> DependencyResult<Vec<Arc<ClassDescriptor>>> {
        if let Some(class) = self.bound_class(key)? {
            return Ok(vec![class]);
        }
        if let Some(class) = self.concrete_request(&key.ty)? {
            return Ok(vec![class]);
        }
        Ok(Self::filter_qualified(self.candidate_set(&key.ty)?, &key.qualifiers))
    }

    fn is_assignable(&self, target: &TypeRef, candidate: &ClassDescriptor) -> DependencyResult<bool> {
        self.assignable(target, candidate, &mut AssignMemo::new())
    }

    fn lookup(&self, name: &TypeName) -> DependencyResult<Option<Arc<ClassDescriptor>>> {
        if let Some(class) = self.universe()?.get(name) {
            return Ok(Some(class.clone()));
        }
        Ok(self.extra_classes.get(name).map(|entry| entry.value().clone()))
    }
}

impl std::fmt::Debug for QualifiedTypeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualifiedTypeResolver")
            .field("loader", &self.loader.id())
            .field("bindings", &self.bindings.len())
            .field("enabled_alternatives", &self.enabled_alternatives.len())
            .field("extra_classes", &self.extra_classes.len())
            .finish_non_exhaustive()
    }
}
