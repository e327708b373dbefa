//! 对象图构建器
//!
//! [`Injector`] 是引擎入口：解析实现类、选择构造函数、注入字段和方法、
//! 应用作用域策略、检测循环依赖并执行生命周期回调。

use crate::handle::InstanceHandle;
use crate::plan::InjectionPlan;
use crate::resolver::QualifiedTypeResolver;
use dashmap::{DashMap, DashSet};
use di_abstractions::{ContainerStats, DiContainer, ResolveContext, ScopeHandler, TypeResolver};
use di_common::{
    Arguments, BindingKey, ClassDescriptor, ConstructorDescriptor, Describe, DependencyError, DependencyResult,
    InjectionPoint, Instance, PointKind, QualifierSet, ScopeMarker, TypeName, TypeRef,
};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

struct InjectorInner {
    resolver: QualifiedTypeResolver,
    singletons: DashMap<TypeName, Arc<OnceCell<Instance>>>,
    /// 按创建顺序记录的单例，关闭时按此顺序销毁
    singleton_order: Mutex<Vec<Instance>>,
    scopes: RwLock<HashMap<ScopeMarker, Arc<dyn ScopeHandler>>>,
    plans: DashMap<TypeName, Arc<InjectionPlan>>,
    /// 已注入过的静态成员 (类, 成员名)
    injected_statics: DashSet<(TypeName, String)>,
    described: DashMap<TypeId, TypeName>,
}

/// 依赖注入器
///
/// 克隆只复制引用，所有克隆共享同一份单例存储、作用域注册表和解析器。
#[derive(Clone)]
pub struct Injector {
    inner: Arc<InjectorInner>,
}

impl Injector {
    /// 使用解析器创建注入器
    pub fn new(resolver: QualifiedTypeResolver) -> Self {
        Self {
            inner: Arc::new(InjectorInner {
                resolver,
                singletons: DashMap::new(),
                singleton_order: Mutex::new(Vec::new()),
                scopes: RwLock::new(HashMap::new()),
                plans: DashMap::new(),
                injected_statics: DashSet::new(),
                described: DashMap::new(),
            }),
        }
    }

    /// 底层解析器
    pub fn resolver(&self) -> &QualifiedTypeResolver {
        &self.inner.resolver
    }

    /// 注入指定类型（默认限定符）
    pub fn inject(&self, ty: impl Into<TypeRef>) -> DependencyResult<Instance> {
        self.inject_key(&BindingKey::of(ty))
    }

    /// 按类型和限定符注入
    pub fn inject_qualified(&self, ty: impl Into<TypeRef>, qualifiers: QualifierSet) -> DependencyResult<Instance> {
        self.inject_key(&BindingKey::new(ty, qualifiers))
    }

    /// 按绑定键注入
    pub fn inject_key(&self, key: &BindingKey) -> DependencyResult<Instance> {
        let mut context = ResolveContext::new();
        self.inject_point(&mut context, key)
    }

    /// 注入可描述类型并转换为具体类型
    ///
    /// 类型第一次使用时登记其描述符。
    pub fn get<T: Describe>(&self) -> DependencyResult<Arc<T>> {
        let name = self.describe::<T>()?;
        let instance = self.inject(name)?;
        instance.downcast::<T>().ok_or_else(|| DependencyError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            actual: instance.type_name().to_string(),
        })
    }

    fn describe<T: Describe>(&self) -> DependencyResult<TypeName> {
        let type_id = TypeId::of::<T>();
        if let Some(name) = self.inner.described.get(&type_id) {
            return Ok(name.value().clone());
        }
        let class = self.inner.resolver.add_class(Arc::new(T::describe()))?;
        self.inner.described.insert(type_id, class.name.clone());
        Ok(class.name.clone())
    }

    /// 创建延迟解析句柄
    pub fn instance_handle(&self, ty: impl Into<TypeRef>, qualifiers: QualifierSet) -> InstanceHandle {
        InstanceHandle::new(self.clone(), BindingKey::new(ty, qualifiers))
    }

    /// 解析唯一实现类
    pub fn resolve_one(&self, key: &BindingKey) -> DependencyResult<Arc<ClassDescriptor>> {
        self.inner.resolver.resolve_one(key)
    }

    /// 解析所有满足限定符的实现类
    pub fn resolve_all(&self, key: &BindingKey) -> DependencyResult<Vec<Arc<ClassDescriptor>>> {
        self.inner.resolver.resolve_all(key)
    }

    /// 候选类是否可赋值给目标类型
    pub fn is_assignable(&self, target: &TypeRef, candidate: &ClassDescriptor) -> DependencyResult<bool> {
        self.inner.resolver.is_assignable(target, candidate)
    }

    /// 显式绑定
    pub fn bind(&self, key: BindingKey, implementation: impl Into<TypeName>) {
        self.inner.resolver.bind(key, implementation.into());
    }

    /// 绑定到一个不经扫描的类描述符
    pub fn bind_descriptor(&self, key: BindingKey, class: ClassDescriptor) -> DependencyResult<()> {
        let class = self.inner.resolver.add_class(Arc::new(class))?;
        self.inner.resolver.bind(key, class.name.clone());
        Ok(())
    }

    /// 启用备选实现
    pub fn enable_alternative(&self, class: impl Into<TypeName>) {
        self.inner.resolver.enable_alternative(class.into());
    }

    /// 注册作用域处理器，替换同一标记的旧处理器
    ///
    /// 单例标记的处理器不会登记，返回 `None`。
    pub fn register_scope(&self, marker: ScopeMarker, handler: Arc<dyn ScopeHandler>) -> Option<Arc<dyn ScopeHandler>> {
        if marker.is_singleton() {
            warn!("单例作用域由注入器内部处理，忽略处理器 {}", handler.name());
            return None;
        }
        info!("注册作用域处理器: {} -> {}", marker, handler.name());
        self.inner.scopes.write().insert(marker, handler)
    }

    /// 对实例执行销毁前回调
    ///
    /// 同一实例只执行一次，重复调用直接返回。单例仍保留在单例存储中。
    pub fn destroy(&self, instance: &Instance) -> DependencyResult<()> {
        if !instance.mark_destroyed() {
            return Ok(());
        }
        debug!("销毁实例: {}", instance.type_name());
        self.plan_for(instance.class())?.run_pre_destroy(instance)
    }

    /// 关闭注入器
    ///
    /// 依次销毁所有单例，然后关闭并移除所有作用域处理器。单个回调失败只记录日志。
    /// 可以重复调用；之后注入单例类会创建新实例。
    pub fn shutdown(&self) {
        let singletons = std::mem::take(&mut *self.inner.singleton_order.lock());
        self.inner.singletons.clear();
        info!("关闭注入器: {} 个单例", singletons.len());

        for instance in &singletons {
            if let Err(e) = self.destroy(instance) {
                error!("单例销毁失败: {}, 错误: {}", instance.type_name(), e);
            }
        }

        let handlers: Vec<(ScopeMarker, Arc<dyn ScopeHandler>)> = self.inner.scopes.write().drain().collect();
        for (marker, handler) in handlers {
            if let Err(e) = handler.close() {
                error!("作用域关闭失败: {} ({}), 错误: {}", marker, handler.name(), e);
            }
        }
    }

    /// 当前存活的单例数量
    pub fn singleton_count(&self) -> usize {
        self.inner.singleton_order.lock().len()
    }

    /// 容器统计信息
    pub fn stats(&self) -> ContainerStats {
        ContainerStats {
            active_singletons: self.singleton_count(),
            registered_scopes: self.inner.scopes.read().len(),
            bindings: self.inner.resolver.binding_count(),
            enabled_alternatives: self.inner.resolver.enabled_alternative_count(),
        }
    }

    /// 构造指定类的实例，供句柄使用
    ///
    /// 新上下文建立在当前线程的构造栈之上，构造函数里调用句柄形成的循环同样会被检测到。
    pub(crate) fn construct(&self, class: &Arc<ClassDescriptor>) -> DependencyResult<Instance> {
        let mut context = ResolveContext::new();
        self.inject_class(&mut context, class)
    }

    fn inject_point(&self, context: &mut ResolveContext, key: &BindingKey) -> DependencyResult<Instance> {
        self.validate_type(&key.ty)?;
        let class = self.inner.resolver.resolve_one(key)?;
        self.inject_class(context, &class)
    }

    fn validate_type(&self, ty: &TypeRef) -> DependencyResult<()> {
        let Some(raw) = ty.raw() else {
            return Ok(());
        };
        match self.inner.resolver.lookup(raw)? {
            Some(class) => Self::validate_class(&class),
            None => Ok(()),
        }
    }

    fn validate_class(class: &ClassDescriptor) -> DependencyResult<()> {
        match class.injectability_violation() {
            Some(rule) => Err(DependencyError::invalid_target(class.name.as_str(), rule)),
            None => Ok(()),
        }
    }

    fn inject_class(&self, context: &mut ResolveContext, class: &Arc<ClassDescriptor>) -> DependencyResult<Instance> {
        Self::validate_class(class)?;
        context.push_type(&class.name)?;
        let result = self.scoped_instance(context, class);
        context.pop_type();
        result
    }

    fn scoped_instance(&self, context: &mut ResolveContext, class: &Arc<ClassDescriptor>) -> DependencyResult<Instance> {
        let Some(marker) = &class.scope else {
            return self.build(context, class);
        };
        if marker.is_singleton() {
            return self.singleton(context, class);
        }

        let handler = self.inner.scopes.read().get(marker).cloned();
        match handler {
            Some(handler) => handler.get(class, &mut || self.build(context, class)),
            None => {
                warn!("作用域 {} 没有注册处理器，{} 每次创建新实例", marker, class.name);
                self.build(context, class)
            }
        }
    }

    fn singleton(&self, context: &mut ResolveContext, class: &Arc<ClassDescriptor>) -> DependencyResult<Instance> {
        let cell = self
            .inner
            .singletons
            .entry(class.name.clone())
            .or_default()
            .value()
            .clone();
        let instance = cell.get_or_try_init(|| {
            let instance = self.build(context, class)?;
            self.inner.singleton_order.lock().push(instance.clone());
            info!("创建单例: {}", class.name);
            Ok::<_, DependencyError>(instance)
        })?;
        Ok(instance.clone())
    }

    fn plan_for(&self, class: &Arc<ClassDescriptor>) -> DependencyResult<Arc<InjectionPlan>> {
        if let Some(plan) = self.inner.plans.get(&class.name) {
            return Ok(plan.value().clone());
        }
        let plan = Arc::new(InjectionPlan::build(class, &self.inner.resolver)?);
        self.inner.plans.insert(class.name.clone(), plan.clone());
        Ok(plan)
    }

    fn build(&self, context: &mut ResolveContext, class: &Arc<ClassDescriptor>) -> DependencyResult<Instance> {
        let plan = self.plan_for(class)?;
        let constructor = Self::select_constructor(class)?;
        let args = self.resolve_points(context, &constructor.params)?;
        let value = constructor
            .create(Arguments::new(class.name.clone(), args))
            .map_err(|source| DependencyError::ComponentCreationFailed {
                type_name: class.name.to_string(),
                source,
            })?;
        let instance = Instance::new(value, class.clone());

        self.inject_members(context, &plan, &instance)?;
        plan.run_post_construct(&instance)?;
        debug!("构造完成: {} (深度 {})", class.name, context.depth());
        Ok(instance)
    }

    fn select_constructor(class: &ClassDescriptor) -> DependencyResult<&ConstructorDescriptor> {
        let mut marked = class.constructors.iter().filter(|constructor| constructor.marked);
        match (marked.next(), marked.next()) {
            (Some(constructor), None) => Ok(constructor),
            (Some(_), Some(_)) => Err(DependencyError::ConstructorResolution {
                type_name: class.name.to_string(),
                message: "存在多个带注入标记的构造函数".to_string(),
            }),
            (None, _) => class
                .constructors
                .iter()
                .find(|constructor| constructor.params.is_empty())
                .ok_or_else(|| DependencyError::ConstructorResolution {
                    type_name: class.name.to_string(),
                    message: "没有可用的构造函数".to_string(),
                }),
        }
    }

    fn resolve_points(&self, context: &mut ResolveContext, points: &[InjectionPoint]) -> DependencyResult<Vec<Instance>> {
        points.iter().map(|point| self.resolve_point(context, point)).collect()
    }

    fn resolve_point(&self, context: &mut ResolveContext, point: &InjectionPoint) -> DependencyResult<Instance> {
        match point.kind {
            PointKind::Handle => Ok(InstanceHandle::new(self.clone(), point.key()).into_instance()),
            PointKind::Direct => self.inject_point(context, &point.key()),
        }
    }

    fn inject_members(&self, context: &mut ResolveContext, plan: &InjectionPlan, instance: &Instance) -> DependencyResult<()> {
        for level in plan.levels() {
            let class = level.class;
            if class.fields.is_empty() && class.methods.is_empty() {
                continue;
            }
            let target = plan.project(instance.as_any(), level)?;

            for field in &class.fields {
                let member = format!("{}::{}", class.name, field.name);
                let static_key = field.is_static.then(|| (class.name.clone(), field.name.clone()));
                if let Some(key) = &static_key {
                    if !self.inner.injected_statics.insert(key.clone()) {
                        continue;
                    }
                }
                let result = self
                    .resolve_point(context, &field.point)
                    .and_then(|value| {
                        field.assign(target, value).map_err(|source| DependencyError::ComponentCreationFailed {
                            type_name: member.clone(),
                            source,
                        })
                    });
                if let Err(e) = result {
                    if let Some(key) = &static_key {
                        self.inner.injected_statics.remove(key);
                    }
                    return Err(e);
                }
            }

            for method in &class.methods {
                let member = format!("{}::{}", class.name, method.name);
                let static_key = method.is_static.then(|| (class.name.clone(), method.name.clone()));
                if let Some(key) = &static_key {
                    if !self.inner.injected_statics.insert(key.clone()) {
                        continue;
                    }
                }
                let result = self.resolve_points(context, &method.params).and_then(|args| {
                    method
                        .invoke(target, Arguments::new(class.name.clone(), args))
                        .map_err(|source| DependencyError::ComponentCreationFailed {
                            type_name: member.clone(),
                            source,
                        })
                });
                if let Err(e) = result {
                    if let Some(key) = &static_key {
                        self.inner.injected_statics.remove(key);
                    }
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

impl DiContainer for Injector {
    fn inject(&self, ty: &TypeRef) -> DependencyResult<Instance> {
        Injector::inject(self, ty.clone())
    }

    fn inject_key(&self, key: &BindingKey) -> DependencyResult<Instance> {
        Injector::inject_key(self, key)
    }

    fn bind(&self, key: BindingKey, implementation: TypeName) {
        Injector::bind(self, key, implementation);
    }

    fn enable_alternative(&self, class: TypeName) {
        Injector::enable_alternative(self, class);
    }

    fn register_scope(&self, marker: ScopeMarker, handler: Arc<dyn ScopeHandler>) -> Option<Arc<dyn ScopeHandler>> {
        Injector::register_scope(self, marker, handler)
    }

    fn destroy(&self, instance: &Instance) -> DependencyResult<()> {
        Injector::destroy(self, instance)
    }

    fn shutdown(&self) {
        Injector::shutdown(self);
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("resolver", &self.inner.resolver)
            .field("stats", &self.stats())
            .finish()
    }
}
