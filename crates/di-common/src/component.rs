//! 类描述符
//!
//! Rust 没有运行时反射，注入点、限定符和生命周期回调都记录在每个类型的描述符中。
//! 描述符每个类型只构建一次，引擎之后只读取描述符，不再检查原始类型。

use crate::errors::{DependencyError, HookError};
use crate::instance::{Arguments, ErasedValue, FromInstance, Instance};
use crate::lifecycle::ScopeMarker;
use crate::metadata::{BindingKey, Nesting, TypeKind, TypeName, TypeRef};
use crate::qualifier::{Qualifier, QualifierSet};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 从子类值投影到其内嵌的父类值
pub type Projection = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;

type CreateFn = Arc<dyn Fn(Arguments) -> Result<ErasedValue, HookError> + Send + Sync>;
type AssignFn = Arc<dyn Fn(&dyn Any, Instance) -> Result<(), HookError> + Send + Sync>;
type InvokeFn = Arc<dyn Fn(&dyn Any, Arguments) -> Result<(), HookError> + Send + Sync>;
type HookFn = Arc<dyn Fn(&dyn Any) -> Result<(), HookError> + Send + Sync>;
type CastFn = Arc<dyn Fn(ErasedValue) -> Option<Box<dyn Any>> + Send + Sync>;

fn projection<F>(f: F) -> Projection
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn target_mismatch<T: Any>(name: &TypeName) -> DependencyError {
    DependencyError::TypeMismatch {
        expected: std::any::type_name::<T>().to_string(),
        actual: name.to_string(),
    }
}

/// 注入点种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointKind {
    /// 直接注入一个实例
    #[default]
    Direct,
    /// 注入延迟解析句柄，构造推迟到句柄的 `get()`
    Handle,
}

/// 注入点：构造参数、字段或方法参数
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InjectionPoint {
    pub ty: TypeRef,
    pub qualifiers: QualifierSet,
    pub kind: PointKind,
}

impl InjectionPoint {
    /// 默认限定符的直接注入点
    pub fn of(ty: impl Into<TypeRef>) -> Self {
        Self {
            ty: ty.into(),
            qualifiers: QualifierSet::default(),
            kind: PointKind::Direct,
        }
    }

    /// 命名限定符的直接注入点
    pub fn named(ty: impl Into<TypeRef>, name: impl Into<String>) -> Self {
        Self::of(ty).with_qualifier(Qualifier::named(name))
    }

    /// 延迟解析句柄注入点
    pub fn handle(ty: impl Into<TypeRef>) -> Self {
        Self {
            kind: PointKind::Handle,
            ..Self::of(ty)
        }
    }

    /// 追加限定符（替换 Default）
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers = self.qualifiers.merge([qualifier]);
        self
    }

    /// 设置限定符集合
    pub fn with_qualifiers(mut self, qualifiers: QualifierSet) -> Self {
        self.qualifiers = qualifiers;
        self
    }

    /// 对应的绑定键
    pub fn key(&self) -> BindingKey {
        BindingKey::new(self.ty.clone(), self.qualifiers.clone())
    }
}

/// 父类链接
#[derive(Clone)]
pub struct SuperLink {
    pub ty: TypeRef,
    project: Projection,
}

impl SuperLink {
    /// 将子类值投影为父类值
    pub fn project<'a>(&self, value: &'a dyn Any) -> Option<&'a dyn Any> {
        (self.project)(value)
    }
}

impl fmt::Debug for SuperLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuperLink").field("ty", &self.ty).finish()
    }
}

/// 构造函数描述符
#[derive(Clone)]
pub struct ConstructorDescriptor {
    /// 是否带有注入标记
    pub marked: bool,
    pub params: Vec<InjectionPoint>,
    create: CreateFn,
}

impl ConstructorDescriptor {
    /// 使用已解析的参数创建值
    pub fn create(&self, args: Arguments) -> Result<ErasedValue, HookError> {
        (self.create)(args)
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("marked", &self.marked)
            .field("params", &self.params)
            .finish()
    }
}

/// 字段描述符
#[derive(Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub point: InjectionPoint,
    pub is_static: bool,
    pub is_final: bool,
    assign: AssignFn,
}

impl FieldDescriptor {
    /// 写入字段值
    pub fn assign(&self, target: &dyn Any, value: Instance) -> Result<(), HookError> {
        (self.assign)(target, value)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("point", &self.point)
            .field("is_static", &self.is_static)
            .field("is_final", &self.is_final)
            .finish()
    }
}

/// 注入方法描述符
#[derive(Clone)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<InjectionPoint>,
    pub is_static: bool,
    invoke: InvokeFn,
}

impl MethodDescriptor {
    /// 调用方法
    pub fn invoke(&self, target: &dyn Any, args: Arguments) -> Result<(), HookError> {
        (self.invoke)(target, args)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("is_static", &self.is_static)
            .finish()
    }
}

/// 生命周期回调（构造后 / 销毁前）
#[derive(Clone)]
pub struct LifecycleHook {
    pub name: String,
    hook: HookFn,
}

impl LifecycleHook {
    /// 执行回调
    pub fn invoke(&self, target: &dyn Any) -> Result<(), HookError> {
        (self.hook)(target)
    }
}

impl fmt::Debug for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHook").field("name", &self.name).finish()
    }
}

/// 类描述符
pub struct ClassDescriptor {
    pub name: TypeName,
    /// 所在包（模块路径）
    pub package: String,
    pub kind: TypeKind,
    pub nesting: Nesting,
    pub synthetic: bool,
    pub superclass: Option<SuperLink>,
    pub interfaces: Vec<TypeRef>,
    pub qualifiers: Vec<Qualifier>,
    /// 备选实现，显式启用前不参与解析
    pub alternative: bool,
    pub scope: Option<ScopeMarker>,
    pub constructors: Vec<ConstructorDescriptor>,
    pub fields: Vec<FieldDescriptor>,
    pub methods: Vec<MethodDescriptor>,
    pub post_construct: Option<LifecycleHook>,
    pub pre_destroy: Option<LifecycleHook>,
    /// 对应的 Rust 类型（纯声明的接口没有）
    pub rust_type: Option<TypeId>,
    casts: HashMap<TypeId, CastFn>,
}

impl ClassDescriptor {
    /// 声明一个接口
    pub fn interface(name: impl Into<TypeName>) -> ClassBuilder<()> {
        Self::declare(name, TypeKind::Interface)
    }

    /// 声明一个没有 Rust 表示的类型（接口、抽象类、枚举、基本类型等）
    pub fn declare(name: impl Into<TypeName>, kind: TypeKind) -> ClassBuilder<()> {
        let mut builder = ClassBuilder::<()>::new(name).kind(kind);
        builder.descriptor.rust_type = None;
        builder
    }

    /// 直接声明的父类型：先父类，后接口
    pub fn supertypes(&self) -> impl Iterator<Item = &TypeRef> {
        self.superclass
            .as_ref()
            .map(|link| &link.ty)
            .into_iter()
            .chain(self.interfaces.iter())
    }

    /// 是否可以直接实例化
    pub fn is_concrete(&self) -> bool {
        self.kind.is_concrete()
    }

    /// 是否带有显式限定符（Default 和 Any 不算）
    pub fn has_explicit_qualifier(&self) -> bool {
        self.qualifiers.iter().any(Qualifier::is_explicit)
    }

    /// 是否暴露指定限定符
    pub fn has_qualifier(&self, qualifier: &Qualifier) -> bool {
        self.qualifiers.contains(qualifier)
    }

    /// 检查类型能否作为注入目标，返回违反的规则
    pub fn injectability_violation(&self) -> Option<&'static str> {
        if self.kind == TypeKind::Enum {
            return Some("枚举类型不可注入");
        }
        if self.kind == TypeKind::Primitive {
            return Some("基本类型不可注入");
        }
        if self.synthetic {
            return Some("合成类型不可注入");
        }
        match self.nesting {
            Nesting::Local => Some("局部类型不可注入"),
            Nesting::Anonymous => Some("匿名类型不可注入"),
            Nesting::Inner => Some("非静态内部类型不可注入"),
            Nesting::TopLevel | Nesting::StaticNested => None,
        }
    }

    /// 按声明过的接口视图转换值
    pub fn cast<I: ?Sized + 'static>(&self, value: ErasedValue) -> Option<Arc<I>> {
        let caster = self.casts.get(&TypeId::of::<Arc<I>>())?;
        caster(value)?.downcast::<Arc<I>>().ok().map(|boxed| *boxed)
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("package", &self.package)
            .field("kind", &self.kind)
            .field("nesting", &self.nesting)
            .field("superclass", &self.superclass)
            .field("interfaces", &self.interfaces)
            .field("qualifiers", &self.qualifiers)
            .field("alternative", &self.alternative)
            .field("scope", &self.scope)
            .field("constructors", &self.constructors.len())
            .field("fields", &self.fields.len())
            .field("methods", &self.methods.len())
            .finish_non_exhaustive()
    }
}

/// 可描述的类型
///
/// 手写实现或由 `#[derive(Injectable)]` 生成。
pub trait Describe: Any + Send + Sync + Sized {
    /// 构建类描述符
    fn describe() -> ClassDescriptor;
}

/// 类描述符构建器
///
/// 回调按 `&T` 编写，构建器负责擦除为 `&dyn Any`。
pub struct ClassBuilder<T> {
    descriptor: ClassDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
    /// 创建具体类构建器
    pub fn new(name: impl Into<TypeName>) -> Self {
        Self {
            descriptor: ClassDescriptor {
                name: name.into(),
                package: String::new(),
                kind: TypeKind::Class,
                nesting: Nesting::TopLevel,
                synthetic: false,
                superclass: None,
                interfaces: Vec::new(),
                qualifiers: Vec::new(),
                alternative: false,
                scope: None,
                constructors: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                post_construct: None,
                pre_destroy: None,
                rust_type: Some(TypeId::of::<T>()),
                casts: HashMap::new(),
            },
            _marker: PhantomData,
        }
    }

    /// 设置所在包
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.descriptor.package = package.into();
        self
    }

    /// 设置类型种类
    pub fn kind(mut self, kind: TypeKind) -> Self {
        self.descriptor.kind = kind;
        self
    }

    /// 设置嵌套方式
    pub fn nesting(mut self, nesting: Nesting) -> Self {
        self.descriptor.nesting = nesting;
        self
    }

    /// 标记为合成类型
    pub fn synthetic(mut self) -> Self {
        self.descriptor.synthetic = true;
        self
    }

    /// 声明实现的接口
    pub fn implements(mut self, ty: impl Into<TypeRef>) -> Self {
        self.descriptor.interfaces.push(ty.into());
        self
    }

    /// 声明父类，父类的注入成员和回调通过 `project` 作用在内嵌的父类值上
    pub fn extends<P: Any>(mut self, ty: impl Into<TypeRef>, project: fn(&T) -> &P) -> Self {
        self.descriptor.superclass = Some(SuperLink {
            ty: ty.into(),
            project: projection(move |value| {
                value
                    .downcast_ref::<T>()
                    .map(|typed| project(typed) as &dyn Any)
            }),
        });
        self
    }

    /// 只声明父类型关系，父类没有可访问的成员
    pub fn extends_type(mut self, ty: impl Into<TypeRef>) -> Self {
        self.descriptor.superclass = Some(SuperLink {
            ty: ty.into(),
            project: projection(|_| None),
        });
        self
    }

    /// 添加限定符
    pub fn qualifier(mut self, qualifier: Qualifier) -> Self {
        self.descriptor.qualifiers.push(qualifier);
        self
    }

    /// 添加命名限定符
    pub fn named(self, name: impl Into<String>) -> Self {
        self.qualifier(Qualifier::named(name))
    }

    /// 标记为备选实现
    pub fn alternative(mut self) -> Self {
        self.descriptor.alternative = true;
        self
    }

    /// 设置作用域
    pub fn scope(mut self, scope: ScopeMarker) -> Self {
        self.descriptor.scope = Some(scope);
        self
    }

    /// 设置为单例
    pub fn singleton(self) -> Self {
        self.scope(ScopeMarker::SINGLETON)
    }

    /// 添加带注入标记的构造函数
    pub fn constructor<F>(self, params: Vec<InjectionPoint>, create: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<T, HookError> + Send + Sync + 'static,
    {
        self.push_constructor(true, params, create)
    }

    /// 添加不带注入标记的构造函数
    pub fn unmarked_constructor<F>(self, params: Vec<InjectionPoint>, create: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<T, HookError> + Send + Sync + 'static,
    {
        self.push_constructor(false, params, create)
    }

    /// 添加无参构造函数
    pub fn default_constructor<F>(self, create: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.push_constructor(false, Vec::new(), move |_| Ok(create()))
    }

    fn push_constructor<F>(mut self, marked: bool, params: Vec<InjectionPoint>, create: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<T, HookError> + Send + Sync + 'static,
    {
        let create: CreateFn = Arc::new(move |mut args: Arguments| -> Result<ErasedValue, HookError> {
            let value = create(&mut args)?;
            Ok(Arc::new(value))
        });
        self.descriptor.constructors.push(ConstructorDescriptor {
            marked,
            params,
            create,
        });
        self
    }

    /// 添加注入字段，字段需要内部可变性（例如 `OnceCell`）
    pub fn field<V, F>(self, name: impl Into<String>, point: InjectionPoint, setter: F) -> Self
    where
        V: FromInstance,
        F: Fn(&T, V) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.push_field(name.into(), point, false, false, setter)
    }

    /// 添加静态注入字段，每个引擎生命周期最多注入一次
    pub fn static_field<V, F>(self, name: impl Into<String>, point: InjectionPoint, setter: F) -> Self
    where
        V: FromInstance,
        F: Fn(&T, V) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.push_field(name.into(), point, true, false, setter)
    }

    /// 添加 final 字段上的注入标记（注入时报错）
    pub fn final_field(self, name: impl Into<String>, point: InjectionPoint) -> Self {
        self.push_field(name.into(), point, false, true, |_: &T, _: Instance| Ok(()))
    }

    fn push_field<V, F>(mut self, name: String, point: InjectionPoint, is_static: bool, is_final: bool, setter: F) -> Self
    where
        V: FromInstance,
        F: Fn(&T, V) -> Result<(), HookError> + Send + Sync + 'static,
    {
        let owner = self.descriptor.name.clone();
        let assign: AssignFn = Arc::new(move |target: &dyn Any, value: Instance| -> Result<(), HookError> {
            let target = target
                .downcast_ref::<T>()
                .ok_or_else(|| target_mismatch::<T>(&owner))?;
            setter(target, V::from_instance(value)?)
        });
        self.descriptor.fields.push(FieldDescriptor {
            name,
            point,
            is_static,
            is_final,
            assign,
        });
        self
    }

    /// 添加注入方法
    pub fn method<F>(self, name: impl Into<String>, params: Vec<InjectionPoint>, invoke: F) -> Self
    where
        F: Fn(&T, &mut Arguments) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.push_method(name.into(), params, false, invoke)
    }

    /// 添加静态注入方法，每个引擎生命周期最多调用一次
    pub fn static_method<F>(self, name: impl Into<String>, params: Vec<InjectionPoint>, invoke: F) -> Self
    where
        F: Fn(&T, &mut Arguments) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.push_method(name.into(), params, true, invoke)
    }

    fn push_method<F>(mut self, name: String, params: Vec<InjectionPoint>, is_static: bool, invoke: F) -> Self
    where
        F: Fn(&T, &mut Arguments) -> Result<(), HookError> + Send + Sync + 'static,
    {
        let owner = self.descriptor.name.clone();
        let erased: InvokeFn = Arc::new(move |target: &dyn Any, mut args: Arguments| -> Result<(), HookError> {
            let target = target
                .downcast_ref::<T>()
                .ok_or_else(|| target_mismatch::<T>(&owner))?;
            invoke(target, &mut args)
        });
        self.descriptor.methods.push(MethodDescriptor {
            name,
            params,
            is_static,
            invoke: erased,
        });
        self
    }

    /// 设置构造后回调
    pub fn post_construct<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&T) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.descriptor.post_construct = Some(self.erase_hook(name.into(), hook));
        self
    }

    /// 设置销毁前回调
    pub fn pre_destroy<F>(mut self, name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&T) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.descriptor.pre_destroy = Some(self.erase_hook(name.into(), hook));
        self
    }

    fn erase_hook<F>(&self, name: String, hook: F) -> LifecycleHook
    where
        F: Fn(&T) -> Result<(), HookError> + Send + Sync + 'static,
    {
        let owner = self.descriptor.name.clone();
        LifecycleHook {
            name,
            hook: Arc::new(move |target: &dyn Any| -> Result<(), HookError> {
                let target = target
                    .downcast_ref::<T>()
                    .ok_or_else(|| target_mismatch::<T>(&owner))?;
                hook(target)
            }),
        }
    }

    /// 声明接口视图，使 `Instance::cast::<I>()` 可用
    pub fn exposes<I: ?Sized + 'static>(mut self, cast: fn(Arc<T>) -> Arc<I>) -> Self {
        let erased: CastFn = Arc::new(move |value: ErasedValue| {
            value
                .downcast::<T>()
                .ok()
                .map(|typed| Box::new(cast(typed)) as Box<dyn Any>)
        });
        self.descriptor.casts.insert(TypeId::of::<Arc<I>>(), erased);
        self
    }

    /// 完成构建
    pub fn build(self) -> ClassDescriptor {
        self.descriptor
    }
}
