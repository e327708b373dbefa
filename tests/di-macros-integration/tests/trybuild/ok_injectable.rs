use di_common::{Describe, ScopeMarker};
use di_macros::Injectable;
use std::sync::Arc;

#[derive(Default, Injectable)]
#[injectable(scope = "Request", alternative)]
struct Clock;

#[derive(Injectable)]
#[injectable(name = "Ticker", package = "app::time", implements("Source"))]
struct OkTicker {
    #[inject]
    clock: Arc<Clock>,
    ticks: u64,
}

fn main() {
    let descriptor = OkTicker::describe();
    assert_eq!(descriptor.name.as_str(), "Ticker");
    assert_eq!(descriptor.package, "app::time");
    assert_eq!(descriptor.constructors.len(), 1);

    let clock = Clock::describe();
    assert!(clock.alternative);
    assert_eq!(clock.scope, Some(ScopeMarker::new("Request")));
}
