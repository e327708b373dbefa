use di_common::Describe;
use di_macros::Injectable;
use std::sync::Arc;

#[derive(Injectable)]
struct Config;

#[derive(Injectable)]
#[injectable(singleton)]
struct Wrapper(#[inject] Arc<Config>, String);

fn main() {
    let descriptor = Wrapper::describe();
    assert!(descriptor.scope.is_some());
    assert_eq!(descriptor.constructors[0].params.len(), 1);
}
