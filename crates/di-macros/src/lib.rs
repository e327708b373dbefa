//! # DI Macros
//!
//! 为结构体生成 `di_common::Describe` 实现的派生宏。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use di_macros::Injectable;
//! use std::sync::Arc;
//!
//! #[derive(Injectable)]
//! #[injectable(implements("Greeter"), named = "en", singleton, post_construct = "init")]
//! pub struct EnglishGreeter {
//!     #[inject]
//!     clock: Arc<SystemClock>,
//!     #[inject(ty = "Translator", named = "fallback")]
//!     fallback: InstanceHandle,
//!     greetings: AtomicUsize,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod injectable;
mod utils;

/// 可注入类型派生宏
///
/// # 结构体参数 `#[injectable(...)]`
///
/// - `name = "..."` - 类型名称（默认为结构体名）
/// - `package = "..."` - 包名（默认为 `module_path!()`）
/// - `implements("A", "B")` - 实现的接口
/// - `exposes(dyn Trait)` - 可通过 `Instance::cast` 获取的接口视图
/// - `singleton` / `scope = "..."` - 作用域标记
/// - `named = "..."` - `@Named` 限定符
/// - `alternative` - 备选实现
/// - `post_construct = "method"` / `pre_destroy = "method"` - 生命周期回调，
///   方法签名为 `fn(&self) -> Result<(), E>`
///
/// # 字段参数
///
/// - `#[inject]` - 注入字段，`Arc<X>` 推断类型名 `X`
/// - `#[inject(ty = "...", named = "...")]` - 指定类型名和限定符
///
/// 注入字段成为唯一带注入标记的构造函数的参数，其余字段使用 `Default::default()`。
/// `InstanceHandle` 字段注入延迟解析句柄，必须指定 `ty`。
#[proc_macro_derive(Injectable, attributes(injectable, inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    injectable::derive_injectable_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
