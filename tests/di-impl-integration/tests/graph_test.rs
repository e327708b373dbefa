//! 对象图构建：作用域、循环依赖、成员注入、生命周期和关闭

mod common;

use common::{entries, injector, new_log, record, Log};
use di_abstractions::{InstanceSupplier, ScopeHandler};
use di_common::{
    ClassBuilder, ClassDescriptor, DependencyError, DependencyResult, HookError, InjectionPoint, Instance, ScopeMarker,
    TypeKind,
};
use di_impl::{InstanceHandle, MapScope};
use std::sync::Arc;

struct Clock;

fn clock() -> ClassBuilder<Clock> {
    ClassBuilder::<Clock>::new("Clock").default_constructor(|| Clock)
}

#[test]
fn test_unscoped_instances_are_distinct() {
    let injector = injector(vec![clock().build()]);
    let first = injector.inject("Clock").unwrap();
    let second = injector.inject("Clock").unwrap();
    assert!(!Instance::ptr_eq(&first, &second));
}

#[test]
fn test_singleton_identity_until_shutdown() {
    let injector = injector(vec![clock().singleton().build()]);
    let first = injector.inject("Clock").unwrap();
    let second = injector.inject("Clock").unwrap();
    assert!(Instance::ptr_eq(&first, &second));

    injector.shutdown();
    let third = injector.inject("Clock").unwrap();
    assert!(!Instance::ptr_eq(&first, &third));
}

struct A {
    _b: Instance,
}

struct B {
    _a: Instance,
}

struct LazyB {
    a: InstanceHandle,
}

#[test]
fn test_cycle_reports_full_path() {
    let injector = injector(vec![
        ClassBuilder::<A>::new("A")
            .constructor(vec![InjectionPoint::of("B")], |args| Ok(A { _b: args.take()? }))
            .build(),
        ClassBuilder::<B>::new("B")
            .constructor(vec![InjectionPoint::of("A")], |args| Ok(B { _a: args.take()? }))
            .build(),
    ]);
    let err = injector.inject("A").unwrap_err();
    assert!(matches!(err, DependencyError::CircularDependency { .. }));
    assert!(err.to_string().contains("A -> B -> A"), "{err}");
}

#[test]
fn test_handle_breaks_cycle() {
    let injector = injector(vec![
        ClassBuilder::<A>::new("A")
            .constructor(vec![InjectionPoint::of("B")], |args| Ok(A { _b: args.take()? }))
            .build(),
        ClassBuilder::<LazyB>::new("B")
            .constructor(vec![InjectionPoint::handle("A")], |args| Ok(LazyB { a: args.take()? }))
            .build(),
    ]);
    injector.inject("A").unwrap();

    let b = injector.inject("B").unwrap().downcast::<LazyB>().unwrap();
    assert_eq!(b.a.get().unwrap().type_name().as_str(), "A");
}

struct EagerA {
    _b: Instance,
}

/// A 在构造函数里立即通过句柄取 B，B 直接依赖 A
fn eager_handle_cycle(a: ClassBuilder<EagerA>) -> Vec<ClassDescriptor> {
    vec![
        a.constructor(vec![InjectionPoint::handle("B")], |args| {
            let handle: InstanceHandle = args.take()?;
            Ok(EagerA { _b: handle.get()? })
        })
        .build(),
        ClassBuilder::<B>::new("B")
            .constructor(vec![InjectionPoint::of("A")], |args| Ok(B { _a: args.take()? }))
            .build(),
    ]
}

#[test]
fn test_cycle_through_eager_handle_get() {
    let injector = injector(eager_handle_cycle(ClassBuilder::<EagerA>::new("A")));
    let err = injector.inject("A").unwrap_err();
    assert!(err.to_string().contains("A -> B -> A"), "{err}");

    // 失败的调用不会在构造栈上留下残余
    let err = injector.inject("B").unwrap_err();
    assert!(err.to_string().contains("B -> A -> B"), "{err}");
}

#[test]
fn test_singleton_cycle_through_eager_handle_get() {
    let injector = injector(eager_handle_cycle(ClassBuilder::<EagerA>::new("A").singleton()));
    let err = injector.inject("A").unwrap_err();
    assert!(err.to_string().contains("A -> B -> A"), "{err}");
    assert_eq!(injector.singleton_count(), 0);
}

struct Parent {
    log: Log,
}

struct Child {
    parent: Parent,
}

fn parent() -> ClassDescriptor {
    ClassBuilder::<Parent>::new("Parent")
        .kind(TypeKind::Abstract)
        .field("clock", InjectionPoint::of("Clock"), |parent: &Parent, _: Arc<Clock>| {
            record(&parent.log, "parent:clock");
            Ok(())
        })
        .method("configure", vec![InjectionPoint::of("Clock")], |parent, args| {
            let _clock: Arc<Clock> = args.take()?;
            record(&parent.log, "parent:configure");
            Ok(())
        })
        .post_construct("parent_init", |parent| {
            record(&parent.log, "parent:init");
            Ok(())
        })
        .build()
}

fn child(log: &Log) -> ClassDescriptor {
    let log = log.clone();
    ClassBuilder::<Child>::new("Child")
        .extends::<Parent>("Parent", |child| &child.parent)
        .default_constructor(move || Child {
            parent: Parent { log: log.clone() },
        })
        .field("clock", InjectionPoint::of("Clock"), |child: &Child, _: Instance| {
            record(&child.parent.log, "child:clock");
            Ok(())
        })
        .post_construct("child_init", |child| {
            record(&child.parent.log, "child:init");
            Ok(())
        })
        .build()
}

#[test]
fn test_members_and_hooks_run_ancestor_first() {
    let log = new_log();
    let injector = injector(vec![clock().build(), parent(), child(&log)]);
    injector.inject("Child").unwrap();
    assert_eq!(
        entries(&log),
        vec!["parent:clock", "parent:configure", "child:clock", "parent:init", "child:init"]
    );
}

#[test]
fn test_post_construct_failure_aborts_injection() {
    let injector = injector(vec![clock()
        .post_construct("explode", |_| Err("boom".into()))
        .build()]);
    let err = injector.inject("Clock").unwrap_err();
    assert!(matches!(err, DependencyError::LifecycleFailed { .. }));
    assert!(err.to_string().contains("Clock::explode"));
}

#[test]
fn test_final_field_is_invalid_target() {
    let injector = injector(vec![clock()
        .final_field("frozen", InjectionPoint::of("Clock"))
        .build()]);
    let err = injector.inject("Clock").unwrap_err();
    assert!(matches!(err, DependencyError::InvalidInjectionTarget { .. }));
    assert!(err.to_string().contains("Clock::frozen"));
}

#[test]
fn test_custom_scope_and_replacement() {
    let injector = injector(vec![clock().scope(ScopeMarker::from("Request")).build()]);
    let marker = ScopeMarker::from("Request");
    let scope = Arc::new(MapScope::new("request"));
    injector.register_scope(marker.clone(), scope.clone());

    let first = injector.inject("Clock").unwrap();
    let second = injector.inject("Clock").unwrap();
    assert!(Instance::ptr_eq(&first, &second));

    scope.clear();
    let third = injector.inject("Clock").unwrap();
    assert!(!Instance::ptr_eq(&first, &third));

    let replacement = Arc::new(MapScope::new("request-2"));
    let previous = injector.register_scope(marker, replacement.clone());
    assert!(previous.is_some());
    let frozen = scope.call_count();

    injector.inject("Clock").unwrap();
    assert_eq!(scope.call_count(), frozen);
    assert_eq!(replacement.call_count(), 1);
}

struct Base {
    log: Log,
    name: &'static str,
}

struct Leaf {
    base: Base,
}

fn base() -> ClassDescriptor {
    ClassBuilder::<Base>::new("Base")
        .kind(TypeKind::Abstract)
        .pre_destroy("base_close", |base| {
            record(&base.log, format!("{}:base", base.name));
            Ok(())
        })
        .build()
}

fn leaf(name: &'static str, log: &Log) -> ClassBuilder<Leaf> {
    let log = log.clone();
    ClassBuilder::<Leaf>::new(name)
        .extends::<Base>("Base", |leaf| &leaf.base)
        .singleton()
        .default_constructor(move || Leaf {
            base: Base { log: log.clone(), name },
        })
}

#[test]
fn test_shutdown_destroys_each_singleton_once() {
    let log = new_log();
    let injector = injector(vec![
        base(),
        leaf("First", &log)
            .pre_destroy("leaf_close", |leaf| {
                record(&leaf.base.log, format!("{}:leaf", leaf.base.name));
                Ok(())
            })
            .build(),
        leaf("Broken", &log)
            .pre_destroy("explode", |_| Err("close failed".into()))
            .build(),
        leaf("Second", &log).build(),
    ]);
    for name in ["First", "Broken", "Second"] {
        injector.inject(name).unwrap();
    }
    assert_eq!(injector.singleton_count(), 3);

    injector.shutdown();
    injector.shutdown();
    assert_eq!(
        entries(&log),
        vec!["First:base", "First:leaf", "Broken:base", "Second:base"]
    );
    assert_eq!(injector.singleton_count(), 0);
}

#[test]
fn test_failing_ancestor_hook_does_not_skip_descendant_hook() {
    let log = new_log();
    let injector = injector(vec![
        ClassBuilder::<Base>::new("Base")
            .kind(TypeKind::Abstract)
            .pre_destroy("base_close", |_| Err("base close failed".into()))
            .build(),
        leaf("Fragile", &log)
            .pre_destroy("leaf_close", |leaf| {
                record(&leaf.base.log, format!("{}:leaf", leaf.base.name));
                Ok(())
            })
            .build(),
    ]);
    let instance = injector.inject("Fragile").unwrap();

    let err = injector.destroy(&instance).unwrap_err();
    assert!(err.to_string().contains("Base::base_close"), "{err}");
    assert_eq!(entries(&log), vec!["Fragile:leaf"]);

    injector.shutdown();
    assert_eq!(entries(&log), vec!["Fragile:leaf"]);
}

#[test]
fn test_shutdown_runs_descendant_hook_after_ancestor_failure() {
    let log = new_log();
    let injector = injector(vec![
        ClassBuilder::<Base>::new("Base")
            .kind(TypeKind::Abstract)
            .pre_destroy("base_close", |_| Err("base close failed".into()))
            .build(),
        leaf("Fragile", &log)
            .pre_destroy("leaf_close", |leaf| {
                record(&leaf.base.log, format!("{}:leaf", leaf.base.name));
                Ok(())
            })
            .build(),
    ]);
    injector.inject("Fragile").unwrap();

    injector.shutdown();
    assert_eq!(entries(&log), vec!["Fragile:leaf"]);
}

struct FailingScope;

impl ScopeHandler for FailingScope {
    fn get(&self, _class: &Arc<ClassDescriptor>, create: InstanceSupplier<'_>) -> DependencyResult<Instance> {
        create()
    }

    fn close(&self) -> Result<(), HookError> {
        Err("scope close failed".into())
    }
}

#[test]
fn test_shutdown_closes_every_scope() {
    let injector = injector(vec![clock().scope(ScopeMarker::from("Session")).build()]);
    let session = Arc::new(MapScope::new("session"));
    injector.register_scope(ScopeMarker::from("Broken"), Arc::new(FailingScope));
    injector.register_scope(ScopeMarker::from("Session"), session.clone());
    injector.inject("Clock").unwrap();
    assert_eq!(session.len(), 1);

    injector.shutdown();
    assert!(session.is_empty());
    assert_eq!(injector.stats().registered_scopes, 0);
}

#[test]
fn test_explicit_destroy_counts_as_shutdown_destroy() {
    let log = new_log();
    let injector = injector(vec![base(), leaf("Only", &log).build()]);
    let instance = injector.inject("Only").unwrap();

    injector.destroy(&instance).unwrap();
    injector.destroy(&instance).unwrap();
    injector.shutdown();
    assert_eq!(entries(&log), vec!["Only:base"]);
}
