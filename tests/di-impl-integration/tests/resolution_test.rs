//! 限定符解析、泛型可赋值性、显式绑定和备选实现

mod common;

use common::injector;
use di_abstractions::DiContainer;
use di_common::{BindingKey, ClassBuilder, ClassDescriptor, Qualifier, QualifierSet, TypeKind, TypeName, TypeRef};
use di_impl::{DescriptorLoader, DiscoveryConfig, Injector, InjectorBuilder};
use std::sync::Arc;

struct Greeter(&'static str);

fn greeter(name: &'static str) -> ClassBuilder<Greeter> {
    ClassBuilder::<Greeter>::new(name)
        .implements("Greeter")
        .default_constructor(move || Greeter(name))
}

fn greeters() -> Vec<ClassDescriptor> {
    vec![
        ClassDescriptor::interface("Greeter").build(),
        greeter("Standard").build(),
        greeter("Named1").named("a").build(),
        greeter("Named2").named("b").build(),
    ]
}

fn named(value: &str) -> QualifierSet {
    QualifierSet::of([Qualifier::named(value)])
}

fn resolved(injector: &Injector, qualifiers: QualifierSet) -> String {
    injector
        .resolve_one(&BindingKey::new("Greeter", qualifiers))
        .map(|class| class.name.to_string())
        .unwrap_or_else(|e| e.to_string())
}

#[test]
fn test_qualifier_resolution() {
    let injector = injector(greeters());
    assert_eq!(resolved(&injector, QualifierSet::default()), "Standard");
    assert_eq!(resolved(&injector, named("a")), "Named1");

    let err = injector
        .resolve_one(&BindingKey::new("Greeter", named("missing")))
        .unwrap_err();
    assert!(err.is_unsatisfied());

    let greeter = injector
        .inject_qualified("Greeter", named("b"))
        .unwrap()
        .downcast::<Greeter>()
        .unwrap();
    assert_eq!(greeter.0, "Named2");
}

#[test]
fn test_second_unqualified_implementation_is_ambiguous() {
    let mut classes = greeters();
    classes.push(greeter("Fallback").build());
    let injector = injector(classes);

    let err = injector.inject("Greeter").unwrap_err();
    assert!(err.is_ambiguous());
    assert!(err.to_string().contains("Standard"));
    assert!(err.to_string().contains("Fallback"));
    // 限定符请求不受影响
    assert_eq!(resolved(&injector, named("a")), "Named1");
}

#[test]
fn test_generic_assignability() {
    let list_of = |arg: &'static str| TypeRef::generic("List", [TypeRef::plain(arg)]);
    let injector = injector(vec![
        ClassDescriptor::interface("List").build(),
        ClassBuilder::<()>::new("ArrayList")
            .implements(list_of("String"))
            .default_constructor(|| ())
            .build(),
        ClassBuilder::<()>::new("RawList")
            .implements("List")
            .default_constructor(|| ())
            .build(),
        ClassBuilder::<()>::new("StringList")
            .extends_type("ArrayList")
            .default_constructor(|| ())
            .build(),
    ]);
    let class = |name: &'static str| {
        injector.resolve_one(&BindingKey::of(name)).unwrap()
    };

    assert!(injector.is_assignable(&list_of("String"), &class("ArrayList")).unwrap());
    assert!(!injector.is_assignable(&list_of("String"), &class("RawList")).unwrap());
    assert!(!injector.is_assignable(&list_of("Integer"), &class("ArrayList")).unwrap());
    assert!(injector.is_assignable(&list_of("String"), &class("StringList")).unwrap());
    assert!(!injector
        .is_assignable(&TypeRef::array_of(list_of("String")), &class("ArrayList"))
        .unwrap());
}

struct Repository(&'static str);

#[test]
fn test_parameterized_request_picks_matching_arguments() {
    let repository_of = |arg: &'static str| TypeRef::generic("Repository", [TypeRef::plain(arg)]);
    let injector = injector(vec![
        ClassDescriptor::interface("Repository").build(),
        ClassBuilder::<Repository>::new("UserRepository")
            .implements(repository_of("User"))
            .default_constructor(|| Repository("users"))
            .build(),
        ClassBuilder::<Repository>::new("OrderRepository")
            .implements(repository_of("Order"))
            .default_constructor(|| Repository("orders"))
            .build(),
    ]);

    let repository = injector
        .inject(repository_of("Order"))
        .unwrap()
        .downcast::<Repository>()
        .unwrap();
    assert_eq!(repository.0, "orders");
    assert!(injector.inject(repository_of("Invoice")).unwrap_err().is_unsatisfied());
    assert!(injector.inject("Repository").unwrap_err().is_ambiguous());
}

#[test]
fn test_binding_for_undiscoverable_interface() {
    let injector = injector(vec![ClassBuilder::<Vec<String>>::new("ArrayList")
        .default_constructor(Vec::new)
        .build()]);
    let collection = TypeRef::generic("Collection", [TypeRef::plain("String")]);
    assert!(injector.inject(collection.clone()).unwrap_err().is_unsatisfied());

    let container: Arc<dyn DiContainer> = Arc::new(injector.clone());
    container.bind(BindingKey::of(collection.clone()), TypeName::from("ArrayList"));
    let value = container.inject(&collection).unwrap();
    assert!(value.downcast::<Vec<String>>().is_some());

    container.bind(BindingKey::of("Queue"), TypeName::from("MissingQueue"));
    assert!(container.inject(&TypeRef::plain("Queue")).unwrap_err().is_unsatisfied());
}

#[test]
fn test_alternative_enabled_at_runtime() {
    let injector = injector(vec![
        ClassDescriptor::interface("Gateway").build(),
        ClassBuilder::<()>::new("MockGateway")
            .implements("Gateway")
            .alternative()
            .default_constructor(|| ())
            .build(),
    ]);
    assert!(injector.inject("Gateway").unwrap_err().is_unsatisfied());

    injector.enable_alternative("MockGateway");
    assert_eq!(injector.inject("Gateway").unwrap().type_name().as_str(), "MockGateway");
}

#[test]
fn test_primitive_request_is_invalid_target() {
    let injector = injector(vec![ClassDescriptor::declare("int", TypeKind::Primitive).build()]);
    let err = injector.inject("int").unwrap_err();
    assert!(err.to_string().contains("基本类型不可注入"));
}

#[test]
fn test_scanned_packages_limit_universe() -> anyhow::Result<()> {
    let loader = Arc::new(
        DescriptorLoader::new("packages")
            .with_descriptor(ClassDescriptor::interface("Greeter").package("app").build())
            .with_descriptor(greeter("Visible").package("app::greeters").build())
            .with_descriptor(greeter("Hidden").package("vendor").build()),
    );
    let injector = InjectorBuilder::new()
        .with_loader(loader)
        .with_config(di_impl::EngineConfig {
            discovery: DiscoveryConfig::default().add_package("app"),
            ..Default::default()
        })
        .build()?;

    assert_eq!(injector.inject("Greeter")?.type_name().as_str(), "Visible");
    Ok(())
}
