//! 宏工具函数

use syn::{GenericArgument, PathArguments, PathSegment, Type, TypeParamBound};

/// 类型路径的最后一段
pub fn last_segment(ty: &Type) -> Option<&PathSegment> {
    match ty {
        Type::Path(type_path) => type_path.path.segments.last(),
        _ => None,
    }
}

/// 检查类型是否为 `InstanceHandle`
pub fn is_handle_type(ty: &Type) -> bool {
    last_segment(ty).is_some_and(|segment| segment.ident == "InstanceHandle")
}

/// 提取 `Arc<T>` 中的 `T`
pub fn arc_inner(ty: &Type) -> Option<&Type> {
    let segment = last_segment(ty)?;
    if segment.ident != "Arc" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => match args.args.first() {
            Some(GenericArgument::Type(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

/// 检查类型是否为 trait 对象
pub fn is_trait_object(ty: &Type) -> bool {
    match ty {
        Type::TraitObject(_) => true,
        Type::Paren(paren) => is_trait_object(&paren.elem),
        _ => false,
    }
}

/// 推断类型名：路径取最后一段，trait 对象取第一个 trait
pub fn infer_type_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(_) => last_segment(ty).map(|segment| segment.ident.to_string()),
        Type::Paren(paren) => infer_type_name(&paren.elem),
        Type::TraitObject(object) => object.bounds.iter().find_map(|bound| match bound {
            TypeParamBound::Trait(bound) => bound.path.segments.last().map(|segment| segment.ident.to_string()),
            _ => None,
        }),
        _ => None,
    }
}
