//! `#[derive(Injectable)]` 实现

use crate::utils::{arc_inner, infer_type_name, is_handle_type, is_trait_object};
use proc_macro2::TokenStream;
use quote::{quote, ToTokens};
use syn::{
    parenthesized, punctuated::Punctuated, Attribute, Data, DeriveInput, Error, Field, Fields, Ident, Index, LitStr,
    Member, Result, Token, Type,
};

/// 结构体级参数
#[derive(Default)]
struct InjectableArgs {
    name: Option<String>,
    package: Option<String>,
    implements: Vec<String>,
    exposes: Vec<Type>,
    singleton: bool,
    scope: Option<String>,
    named: Option<String>,
    alternative: bool,
    post_construct: Option<Ident>,
    pre_destroy: Option<Ident>,
}

impl InjectableArgs {
    fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut args = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("injectable")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("singleton") {
                    args.singleton = true;
                } else if meta.path.is_ident("alternative") {
                    args.alternative = true;
                } else if meta.path.is_ident("name") {
                    args.name = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.path.is_ident("package") {
                    args.package = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.path.is_ident("scope") {
                    args.scope = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.path.is_ident("named") {
                    args.named = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.path.is_ident("post_construct") {
                    args.post_construct = Some(meta.value()?.parse::<LitStr>()?.parse()?);
                } else if meta.path.is_ident("pre_destroy") {
                    args.pre_destroy = Some(meta.value()?.parse::<LitStr>()?.parse()?);
                } else if meta.path.is_ident("implements") {
                    let content;
                    parenthesized!(content in meta.input);
                    let names = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
                    args.implements.extend(names.iter().map(LitStr::value));
                } else if meta.path.is_ident("exposes") {
                    let content;
                    parenthesized!(content in meta.input);
                    let types = Punctuated::<Type, Token![,]>::parse_terminated(&content)?;
                    args.exposes.extend(types);
                } else {
                    return Err(meta.error("未知的 injectable 参数"));
                }
                Ok(())
            })?;
        }
        Ok(args)
    }
}

/// 字段级参数
#[derive(Default)]
struct InjectArgs {
    ty: Option<String>,
    named: Option<String>,
}

impl InjectArgs {
    /// 字段没有 `#[inject]` 时返回 `None`
    fn from_field(field: &Field) -> Result<Option<Self>> {
        let Some(attr) = field.attrs.iter().find(|attr| attr.path().is_ident("inject")) else {
            return Ok(None);
        };
        let mut args = Self::default();
        if matches!(attr.meta, syn::Meta::Path(_)) {
            return Ok(Some(args));
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("ty") {
                args.ty = Some(meta.value()?.parse::<LitStr>()?.value());
            } else if meta.path.is_ident("named") {
                args.named = Some(meta.value()?.parse::<LitStr>()?.value());
            } else {
                return Err(meta.error("未知的 inject 参数"));
            }
            Ok(())
        })?;
        Ok(Some(args))
    }
}

/// 一个注入字段生成的注入点和取值表达式
struct InjectedField {
    point: TokenStream,
    value: TokenStream,
}

fn injected_field(field: &Field, args: InjectArgs) -> Result<InjectedField> {
    let field_ty = &field.ty;
    let handle = is_handle_type(field_ty);
    let inner = arc_inner(field_ty);

    let type_name = match (&args.ty, inner) {
        (Some(name), _) => name.clone(),
        (None, Some(inner)) if !handle => infer_type_name(inner)
            .ok_or_else(|| Error::new_spanned(inner, "无法推断注入类型名，请使用 #[inject(ty = \"...\")]"))?,
        _ => {
            return Err(Error::new_spanned(
                field_ty,
                "非 Arc 字段需要指定类型名: #[inject(ty = \"...\")]",
            ))
        }
    };

    let mut point = if handle {
        quote!(::di_common::InjectionPoint::handle(#type_name))
    } else {
        quote!(::di_common::InjectionPoint::of(#type_name))
    };
    if let Some(named) = &args.named {
        point = quote!(#point.with_qualifier(::di_common::Qualifier::named(#named)));
    }

    let value = match inner {
        Some(object) if is_trait_object(object) => quote! {{
            let __instance: ::di_common::Instance = __args.take()?;
            __instance
                .cast::<#object>()
                .ok_or_else(|| ::di_common::DependencyError::TypeMismatch {
                    expected: ::std::string::String::from(#type_name),
                    actual: __instance.type_name().to_string(),
                })?
        }},
        _ => quote!(__args.take::<#field_ty>()?),
    };
    Ok(InjectedField { point, value })
}

fn lifecycle_hook(builder_method: &str, method: &Ident) -> TokenStream {
    let builder_method = Ident::new(builder_method, method.span());
    let hook_name = method.to_string();
    quote! {
        .#builder_method(#hook_name, |__value: &Self| {
            Self::#method(__value).map_err(::core::convert::Into::into)
        })
    }
}

/// 实现 #[derive(Injectable)]
pub fn derive_injectable_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(&input.generics, "Injectable 不支持泛型结构体"));
    }
    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(struct_name, "Injectable 只能用于结构体"));
    };

    let args = InjectableArgs::from_attrs(&input.attrs)?;
    if args.singleton && args.scope.is_some() {
        return Err(Error::new_spanned(struct_name, "singleton 和 scope 不能同时使用"));
    }

    let fields: Vec<&Field> = match &data.fields {
        Fields::Named(named) => named.named.iter().collect(),
        Fields::Unnamed(unnamed) => unnamed.unnamed.iter().collect(),
        Fields::Unit => Vec::new(),
    };

    let mut points = Vec::new();
    let mut inits = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let member = match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(Index::from(index)),
        };
        match InjectArgs::from_field(field)? {
            Some(inject) => {
                let injected = injected_field(field, inject)?;
                points.push(injected.point);
                let value = injected.value;
                inits.push(quote!(#member: #value));
            }
            None => inits.push(quote!(#member: ::core::default::Default::default())),
        }
    }

    let class_name = args.name.clone().unwrap_or_else(|| struct_name.to_string());
    let package = match &args.package {
        Some(package) => package.to_token_stream(),
        None => quote!(::core::module_path!()),
    };
    let implements = args.implements.iter().map(|name| quote!(.implements(#name)));
    let exposes = args
        .exposes
        .iter()
        .map(|ty| quote!(.exposes::<#ty>(|__value| __value as ::std::sync::Arc<#ty>)));
    let scope = match (&args.scope, args.singleton) {
        (_, true) => quote!(.singleton()),
        (Some(scope), false) => quote!(.scope(::di_common::ScopeMarker::new(#scope))),
        (None, false) => quote!(),
    };
    let named = args.named.as_ref().map(|named| quote!(.named(#named)));
    let alternative = args.alternative.then(|| quote!(.alternative()));
    let post_construct = args
        .post_construct
        .as_ref()
        .map(|method| lifecycle_hook("post_construct", method));
    let pre_destroy = args
        .pre_destroy
        .as_ref()
        .map(|method| lifecycle_hook("pre_destroy", method));

    Ok(quote! {
        impl ::di_common::Describe for #struct_name {
            fn describe() -> ::di_common::ClassDescriptor {
                ::di_common::ClassBuilder::<Self>::new(#class_name)
                    .package(#package)
                    #(#implements)*
                    #(#exposes)*
                    #scope
                    #named
                    #alternative
                    .constructor(
                        ::std::vec![#(#points),*],
                        |__args: &mut ::di_common::Arguments| {
                            ::core::result::Result::Ok(Self { #(#inits),* })
                        },
                    )
                    #post_construct
                    #pre_destroy
                    .build()
            }
        }
    })
}
