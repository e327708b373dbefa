//! 派生宏生成的描述符与注入引擎协同工作

use di_common::{Describe, HookError, Qualifier, QualifierSet};
use di_impl::{InjectorBuilder, InstanceHandle};
use di_macros::Injectable;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> String;
}

#[derive(Debug, Default, Injectable)]
#[injectable(singleton)]
pub struct SystemClock {
    ticks: AtomicUsize,
}

impl SystemClock {
    fn tick(&self) -> usize {
        self.ticks.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[derive(Injectable)]
#[injectable(implements("Greeter"), exposes(dyn Greeter), post_construct = "init", pre_destroy = "close")]
pub struct EnglishGreeter {
    #[inject]
    clock: Arc<SystemClock>,
    ready: AtomicBool,
}

impl EnglishGreeter {
    fn init(&self) -> Result<(), HookError> {
        self.clock.tick();
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) -> Result<(), HookError> {
        self.ready.store(false, Ordering::SeqCst);
        Ok(())
    }
}

impl Greeter for EnglishGreeter {
    fn greet(&self, name: &str) -> String {
        format!("Hello, {name}")
    }
}

#[derive(Injectable)]
#[injectable(implements("Greeter"), exposes(dyn Greeter), named = "fr")]
pub struct FrenchGreeter;

impl Greeter for FrenchGreeter {
    fn greet(&self, name: &str) -> String {
        format!("Bonjour, {name}")
    }
}

#[derive(Injectable)]
pub struct Reception {
    #[inject]
    greeter: Arc<dyn Greeter>,
    #[inject(named = "fr")]
    french: Arc<dyn Greeter>,
    #[inject(ty = "Greeter")]
    all: InstanceHandle,
}

fn builder() -> InjectorBuilder {
    InjectorBuilder::new()
        .register::<SystemClock>()
        .register::<EnglishGreeter>()
        .register::<FrenchGreeter>()
        .register::<Reception>()
}

#[test]
fn test_generated_descriptor() {
    let descriptor = EnglishGreeter::describe();
    assert_eq!(descriptor.name.as_str(), "EnglishGreeter");
    assert_eq!(descriptor.package, module_path!());
    assert_eq!(descriptor.interfaces.len(), 1);
    assert_eq!(descriptor.constructors.len(), 1);
    assert!(descriptor.constructors[0].marked);
    assert_eq!(descriptor.constructors[0].params.len(), 1);
    assert!(descriptor.post_construct.is_some());
    assert!(descriptor.pre_destroy.is_some());

    let french = FrenchGreeter::describe();
    assert!(french.has_qualifier(&Qualifier::named("fr")));
}

#[test]
fn test_inject_derived_graph() {
    let injector = builder().build().unwrap();
    let reception = injector.get::<Reception>().unwrap();

    assert_eq!(reception.greeter.greet("Ada"), "Hello, Ada");
    assert_eq!(reception.french.greet("Ada"), "Bonjour, Ada");
    assert!(!reception.all.is_ambiguous());
    assert!(reception.all.select([Qualifier::ANY]).is_ambiguous());
    assert_eq!(
        reception
            .all
            .select([Qualifier::named("fr")])
            .get()
            .unwrap()
            .cast::<dyn Greeter>()
            .unwrap()
            .greet("Bob"),
        "Bonjour, Bob"
    );

    let clock = injector.get::<SystemClock>().unwrap();
    assert_eq!(clock.tick(), 2);
}

#[test]
fn test_lifecycle_methods_from_attributes() {
    let injector = builder().build().unwrap();
    let instance = injector
        .inject_qualified("Greeter", QualifierSet::default())
        .unwrap();
    let greeter = instance.downcast::<EnglishGreeter>().unwrap();
    assert!(greeter.ready.load(Ordering::SeqCst));

    injector.destroy(&instance).unwrap();
    assert!(!greeter.ready.load(Ordering::SeqCst));
}

#[test]
fn test_get_registers_descriptor_on_demand() {
    let injector = InjectorBuilder::new().build().unwrap();
    let first = injector.get::<SystemClock>().unwrap();
    let second = injector.get::<SystemClock>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}
