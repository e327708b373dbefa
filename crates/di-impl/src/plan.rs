//! 注入计划
//!
//! 每个具体类计算一次的继承链：字段、方法和生命周期回调按祖先优先的顺序访问，
//! 注入时不再重复遍历类层次结构。

use di_abstractions::TypeResolver;
use di_common::{ClassDescriptor, DependencyError, DependencyResult, HookError, Instance, LifecycleHook};
use std::any::Any;
use std::sync::Arc;
use tracing::error;

/// 继承链中的一层
#[derive(Debug, Clone, Copy)]
pub struct PlanLevel<'a> {
    pub class: &'a Arc<ClassDescriptor>,
    /// 从叶子类到本层需要经过的父类投影次数
    pub depth: usize,
}

/// 注入计划
#[derive(Debug)]
pub struct InjectionPlan {
    /// 叶子类在前
    chain: Vec<Arc<ClassDescriptor>>,
}

impl InjectionPlan {
    /// 沿父类链接构建注入计划，并校验所有注入字段
    pub fn build(leaf: &Arc<ClassDescriptor>, resolver: &dyn TypeResolver) -> DependencyResult<Self> {
        let mut chain = vec![leaf.clone()];
        let mut current = leaf.clone();
        while let Some(link) = &current.superclass {
            let Some(raw) = link.ty.raw() else {
                break;
            };
            let Some(parent) = resolver.lookup(raw)? else {
                break;
            };
            if chain.iter().any(|class| class.name == parent.name) {
                break;
            }
            chain.push(parent.clone());
            current = parent;
        }

        for class in &chain {
            if let Some(field) = class.fields.iter().find(|field| field.is_final) {
                return Err(DependencyError::invalid_target(
                    format!("{}::{}", class.name, field.name),
                    "final 字段不可注入",
                ));
            }
        }
        Ok(Self { chain })
    }

    /// 叶子类
    pub fn leaf(&self) -> &Arc<ClassDescriptor> {
        &self.chain[0]
    }

    /// 祖先优先遍历继承链
    pub fn levels(&self) -> impl Iterator<Item = PlanLevel<'_>> {
        self.chain
            .iter()
            .enumerate()
            .rev()
            .map(|(depth, class)| PlanLevel { class, depth })
    }

    /// 继承链长度
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// 将叶子值投影为指定层的值
    pub fn project<'v>(&self, value: &'v dyn Any, level: PlanLevel<'_>) -> DependencyResult<&'v dyn Any> {
        let mut current = value;
        for class in &self.chain[..level.depth] {
            current = class
                .superclass
                .as_ref()
                .and_then(|link| link.project(current))
                .ok_or_else(|| {
                    DependencyError::illegal_state(format!(
                        "无法从 {} 访问父类 {} 的成员",
                        self.leaf().name,
                        level.class.name
                    ))
                })?;
        }
        Ok(current)
    }

    /// 祖先优先执行构造后回调，失败立即返回
    pub fn run_post_construct(&self, instance: &Instance) -> DependencyResult<()> {
        for level in self.levels() {
            let Some(hook) = &level.class.post_construct else {
                continue;
            };
            let target = self.project(instance.as_any(), level)?;
            hook.invoke(target)
                .map_err(|source| Self::hook_failed(level, hook, source))?;
        }
        Ok(())
    }

    /// 祖先优先执行销毁前回调
    ///
    /// 某一层失败时记录日志并继续执行其余层，最后返回第一个错误。
    pub fn run_pre_destroy(&self, instance: &Instance) -> DependencyResult<()> {
        let mut first_error = None;
        for level in self.levels() {
            let Some(hook) = &level.class.pre_destroy else {
                continue;
            };
            let result = self
                .project(instance.as_any(), level)
                .and_then(|target| hook.invoke(target).map_err(|source| Self::hook_failed(level, hook, source)));
            if let Err(e) = result {
                error!("销毁前回调失败: {}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn hook_failed(level: PlanLevel<'_>, hook: &LifecycleHook, source: HookError) -> DependencyError {
        DependencyError::LifecycleFailed {
            type_name: level.class.name.to_string(),
            hook: hook.name.clone(),
            source,
        }
    }
}
