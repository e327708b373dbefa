//! 延迟解析句柄

mod common;

use common::{entries, injector, new_log, record, Log};
use di_common::{BindingKey, ClassBuilder, ClassDescriptor, Qualifier, QualifierSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Plugin(&'static str);

fn plugin(name: &'static str) -> ClassBuilder<Plugin> {
    ClassBuilder::<Plugin>::new(name)
        .implements("Plugin")
        .default_constructor(move || Plugin(name))
}

fn plugins() -> Vec<ClassDescriptor> {
    vec![
        ClassDescriptor::interface("Plugin").build(),
        plugin("Core").build(),
        plugin("Audit").named("audit").build(),
        plugin("Metrics").named("metrics").build(),
    ]
}

#[test]
fn test_zero_candidates() {
    let injector = injector(plugins());
    let handle = injector.instance_handle("Exporter", QualifierSet::default());

    assert!(handle.get().unwrap_err().is_unsatisfied());
    assert_eq!(handle.iter().unwrap().count(), 0);
    assert!(handle.is_unsatisfied());
    assert!(!handle.is_ambiguous());
}

#[test]
fn test_any_iterates_every_candidate() {
    let injector = injector(plugins());
    let handle = injector.instance_handle("Plugin", QualifierSet::any());

    assert!(handle.is_ambiguous());
    assert!(!handle.is_unsatisfied());
    assert!(handle.get().unwrap_err().is_ambiguous());

    let iter = handle.iter().unwrap();
    assert_eq!(iter.len(), 3);
    let mut names: Vec<_> = iter
        .map(|instance| instance.unwrap().downcast::<Plugin>().unwrap().0)
        .collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Audit", "Core", "Metrics"]);
}

#[test]
fn test_resolution_failure_is_unsatisfied_not_ambiguous() {
    let injector = injector(plugins());
    injector.bind(BindingKey::of("Plugin"), "Removed");
    let handle = injector.instance_handle("Plugin", QualifierSet::default());

    assert!(handle.iter().is_err());
    assert!(handle.is_unsatisfied());
    assert!(!handle.is_ambiguous());
}

#[test]
fn test_select_narrows_candidates() {
    let injector = injector(plugins());
    let any = injector.instance_handle("Plugin", QualifierSet::any());

    let audit = any.select([Qualifier::named("audit")]);
    assert!(!audit.is_ambiguous());
    assert_eq!(audit.get_as::<Plugin>().unwrap().0, "Audit");

    let core = injector
        .instance_handle("Object", QualifierSet::default())
        .select_type("Plugin", Vec::<Qualifier>::new());
    assert_eq!(core.get_as::<Plugin>().unwrap().0, "Core");
    assert_eq!(core.key().ty.to_string(), "Plugin");
}

fn tracked(log: &Log, singleton: bool) -> ClassDescriptor {
    let builder = ClassBuilder::<Log>::new("Tracked")
        .default_constructor({
            let log = log.clone();
            move || log.clone()
        })
        .pre_destroy("close", |log| {
            record(log, "closed");
            Ok(())
        });
    if singleton {
        builder.singleton().build()
    } else {
        builder.build()
    }
}

#[test]
fn test_destroy_runs_hook_once() {
    let log = new_log();
    let injector = injector(vec![tracked(&log, false)]);
    let handle = injector.instance_handle("Tracked", QualifierSet::default());

    let instance = handle.get().unwrap();
    handle.destroy(Some(&instance)).unwrap();
    handle.destroy(Some(&instance)).unwrap();
    handle.destroy(None).unwrap();
    assert_eq!(entries(&log), vec!["closed"]);
}

#[test]
fn test_destroyed_singleton_keeps_identity() {
    let log = new_log();
    let injector = injector(vec![tracked(&log, true)]);
    let handle = injector.instance_handle("Tracked", QualifierSet::default());

    let first = handle.get().unwrap();
    handle.destroy(Some(&first)).unwrap();
    let second = handle.get().unwrap();
    assert!(di_common::Instance::ptr_eq(&first, &second));
    assert!(second.is_destroyed());

    // 已销毁的单例在关闭时不再执行回调
    injector.shutdown();
    assert_eq!(entries(&log), vec!["closed"]);
}

static BUILT: AtomicUsize = AtomicUsize::new(0);

#[test]
fn test_candidate_handles_construct_lazily() {
    let injector = injector(vec![
        ClassDescriptor::interface("Job").build(),
        ClassBuilder::<()>::new("Nightly")
            .implements("Job")
            .default_constructor(|| {
                BUILT.fetch_add(1, Ordering::SeqCst);
            })
            .build(),
        ClassBuilder::<()>::new("Hourly")
            .implements("Job")
            .named("hourly")
            .default_constructor(|| {
                BUILT.fetch_add(1, Ordering::SeqCst);
            })
            .build(),
    ]);
    let handle = injector.instance_handle("Job", QualifierSet::any());

    let handles = handle.handles().unwrap();
    assert_eq!(handles.len(), 2);
    assert_eq!(BUILT.load(Ordering::SeqCst), 0);

    let first = &handles[0];
    let a = first.get().unwrap();
    let b = first.get().unwrap();
    assert!(di_common::Instance::ptr_eq(&a, &b));
    assert!(first.is_constructed());
    assert!(!handles[1].is_constructed());
    assert_eq!(BUILT.load(Ordering::SeqCst), 1);

    first.destroy().unwrap();
    first.destroy().unwrap();
    assert!(first.get().is_err());

    let single = injector
        .instance_handle("Job", QualifierSet::default())
        .get_handle()
        .unwrap();
    assert_eq!(single.class().name.as_str(), "Nightly");
}

#[test]
fn test_handle_shared_through_arc() {
    let injector = injector(plugins());
    let handle = Arc::new(injector.instance_handle("Plugin", QualifierSet::default()));
    let clone = Arc::clone(&handle);
    let value = std::thread::spawn(move || clone.get_as::<Plugin>().map(|plugin| plugin.0))
        .join()
        .unwrap()
        .unwrap();
    assert_eq!(value, "Core");
}
