use super::parser::{self, Indirection};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Visibility};

/// Parses the token stream for the `Scan` trait derivation.
pub(super) fn parse_token_stream(input: DeriveInput) -> TokenStream {
    match expand(input) {
        Ok(output) => output,
        Err(err) => err.to_compile_error(),
    }
}

/// Expands the `Scan` and `ScanStruct` implementations.
fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    let name = input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            input.generics,
            "deriving `Scan` for generic types is not supported",
        ));
    }

    // Parsing struct attributes
    let mut primitive = false;
    for attr in input.attrs.iter() {
        for (key, _value) in parser::parse_scan_attr(attr)? {
            if key == "primitive" {
                primitive = true;
            } else {
                return Err(syn::Error::new_spanned(
                    attr,
                    format!("unsupported container attribute `{key}`"),
                ));
            }
        }
    }
    if primitive {
        return Ok(quote! {
            impl ::rowbind::Scan for #name {
                #[inline]
                fn type_info() -> ::rowbind::TypeInfo {
                    ::rowbind::TypeInfo::primitive::<Self>()
                }

                #[inline]
                fn scan_row(
                    &mut self,
                    row: &mut ::rowbind::RowValues<'_>,
                ) -> ::std::result::Result<(), ::rowbind::Error> {
                    row.scan_primitive(self)
                }
            }
        });
    }

    // Parsing field attributes
    let Some(fields) = parser::parse_struct_fields(input.data) else {
        return Err(syn::Error::new_spanned(
            &name,
            "`Scan` can only be derived for structs with named fields",
        ));
    };
    let mut descriptors = Vec::with_capacity(fields.len());
    let mut field_targets = Vec::with_capacity(fields.len());
    for (index, field) in fields.into_iter().enumerate() {
        let Some(ident) = field.ident else {
            continue;
        };
        let field_name = ident.to_string().trim_start_matches("r#").to_owned();
        let type_name = parser::get_type_name(&field.ty);
        let public = !matches!(field.vis, Visibility::Inherited);

        let mut skip = false;
        let mut flatten = false;
        let mut tags = Vec::new();
        for attr in field.attrs.iter() {
            for (key, value) in parser::parse_scan_attr(attr)? {
                match (key.as_str(), value) {
                    ("skip", None) => skip = true,
                    ("flatten", None) => flatten = true,
                    (_, Some(value)) => tags.push(quote! { (#key, #value) }),
                    (_, None) => {
                        return Err(syn::Error::new_spanned(
                            attr,
                            format!("unsupported field attribute `{key}`"),
                        ));
                    }
                }
            }
        }

        let mut descriptor = quote! {
            ::rowbind::FieldDescriptor::new(#field_name, #index, #public, #type_name)
        };
        if !tags.is_empty() {
            descriptor = quote! { #descriptor.tags(&[#(#tags),*]) };
        }
        if skip {
            descriptor = quote! { #descriptor.skip() };
        }
        if flatten {
            let (inner_type, indirection) = parser::strip_indirection(&field.ty);
            descriptor = quote! {
                #descriptor.flatten(<#inner_type as ::rowbind::ScanStruct>::fields)
            };
            if public && !skip {
                let embedded = match indirection {
                    Indirection::None => quote! { &mut self.#ident },
                    Indirection::Box => quote! { &mut *self.#ident },
                    Indirection::Option => quote! {
                        self.#ident.get_or_insert_with(::std::default::Default::default)
                    },
                    Indirection::OptionBox => quote! {
                        &mut **self.#ident.get_or_insert_with(::std::default::Default::default)
                    },
                };
                field_targets.push(quote! {
                    [#index, rest @ ..] => ::rowbind::ScanStruct::field_mut(#embedded, rest),
                });
            }
        } else if public && !skip {
            field_targets.push(quote! {
                [#index] => ::std::option::Option::Some(&mut self.#ident),
            });
        }
        descriptors.push(descriptor);
    }

    Ok(quote! {
        impl ::rowbind::ScanStruct for #name {
            fn fields() -> &'static [::rowbind::FieldDescriptor] {
                const FIELDS: &[::rowbind::FieldDescriptor] = &[#(#descriptors),*];
                FIELDS
            }

            fn field_mut(
                &mut self,
                path: &[usize],
            ) -> ::std::option::Option<&mut dyn ::rowbind::FieldTarget> {
                match path {
                    #(#field_targets)*
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl ::rowbind::Scan for #name {
            #[inline]
            fn type_info() -> ::rowbind::TypeInfo {
                ::rowbind::TypeInfo::structure::<Self>()
            }

            #[inline]
            fn scan_row(
                &mut self,
                row: &mut ::rowbind::RowValues<'_>,
            ) -> ::std::result::Result<(), ::rowbind::Error> {
                row.scan_struct(self)
            }
        }
    })
}
