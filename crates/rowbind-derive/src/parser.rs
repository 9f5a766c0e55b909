use syn::{
    Attribute, Data, Expr, Field, Fields, GenericArgument, Lit, Meta, PathArguments, Token, Type,
    punctuated::Punctuated,
};

/// Indirections wrapping an embedded struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Indirection {
    /// `T`
    None,
    /// `Box<T>`
    Box,
    /// `Option<T>`
    Option,
    /// `Option<Box<T>>`
    OptionBox,
}

/// Returns the type name as a str.
pub(super) fn get_type_name(ty: &Type) -> String {
    if let Type::Path(ty) = ty {
        if let Some(segment) = ty.path.segments.last() {
            let type_name = segment.ident.to_string();
            if let PathArguments::AngleBracketed(ref generics) = segment.arguments {
                if let Some(GenericArgument::Type(ty)) = generics.args.first() {
                    return type_name + "<" + &get_type_name(ty) + ">";
                }
            }
            return type_name;
        }
    }
    String::new()
}

/// Returns the type argument if the type is `Wrapper<T>`.
fn unwrap_type<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(ty) = ty else {
        return None;
    };
    let segment = ty.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(ref generics) = segment.arguments else {
        return None;
    };
    if generics.args.len() != 1 {
        return None;
    }
    match generics.args.first() {
        Some(GenericArgument::Type(ty)) => Some(ty),
        _ => None,
    }
}

/// Strips the `Option` and `Box` wrappers from the type.
pub(super) fn strip_indirection(ty: &Type) -> (&Type, Indirection) {
    if let Some(inner) = unwrap_type(ty, "Option") {
        if let Some(inner) = unwrap_type(inner, "Box") {
            (inner, Indirection::OptionBox)
        } else {
            (inner, Indirection::Option)
        }
    } else if let Some(inner) = unwrap_type(ty, "Box") {
        (inner, Indirection::Box)
    } else {
        (ty, Indirection::None)
    }
}

/// Parses an attribute and returns a list of arguments.
pub(super) fn parse_scan_attr(attr: &Attribute) -> syn::Result<Vec<(String, Option<String>)>> {
    let mut arguments = Vec::new();
    if attr.path().is_ident("scan") {
        let nested = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
        for meta in nested {
            let Some(ident) = meta.path().get_ident() else {
                return Err(syn::Error::new_spanned(meta.path(), "expected an identifier"));
            };
            let key = ident.to_string();
            match meta {
                Meta::Path(_) => arguments.push((key, None)),
                Meta::NameValue(name_value) => {
                    let value = if let Expr::Lit(ref expr_lit) = name_value.value {
                        if let Lit::Str(ref lit_str) = expr_lit.lit {
                            Some(lit_str.value())
                        } else {
                            None
                        }
                    } else {
                        None
                    };
                    let Some(value) = value else {
                        return Err(syn::Error::new_spanned(
                            name_value.value,
                            "expected a string literal",
                        ));
                    };
                    arguments.push((key, Some(value)));
                }
                Meta::List(list) => {
                    return Err(syn::Error::new_spanned(list, "unsupported nested arguments"));
                }
            }
        }
    }
    Ok(arguments)
}

/// Parses the struct data and returns a list of fields.
pub(super) fn parse_struct_fields(data: Data) -> Option<Vec<Field>> {
    if let Data::Struct(data) = data {
        if let Fields::Named(fields) = data.fields {
            return Some(fields.named.into_iter().collect());
        }
    }
    None
}
