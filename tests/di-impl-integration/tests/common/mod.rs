//! 集成测试共用的辅助函数

#![allow(dead_code)]

use di_common::ClassDescriptor;
use di_impl::{Injector, InjectorBuilder};
use std::sync::{Arc, Mutex};

/// 回调执行顺序记录
pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn record(log: &Log, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// 用给定描述符构建注入器
pub fn injector(classes: Vec<ClassDescriptor>) -> Injector {
    init_tracing();
    classes
        .into_iter()
        .fold(InjectorBuilder::new(), InjectorBuilder::register_descriptor)
        .build()
        .expect("构建注入器失败")
}
