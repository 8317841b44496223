//! Implementation of the `#[derive(Record)]` macro.
//!
//! This macro generates an implementation of the `Record` trait and
//! field name constants for type-safe request building.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    spanned::Spanned, Data, DeriveInput, Error, Fields, GenericArgument, PathArguments, Result,
    Type,
};

use super::attrs::{parse_list_attrs, FieldType};

/// Main implementation of the Record derive macro.
pub fn record_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // Ensure we have a struct with named fields
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Record can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Record can only be derived for structs",
            ))
        }
    };

    let mut value_arms: Vec<TokenStream> = Vec::new();
    let mut nested_arms: Vec<TokenStream> = Vec::new();
    let mut field_constants: Vec<TokenStream> = Vec::new();
    let mut field_defs: Vec<TokenStream> = Vec::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let list_attrs = parse_list_attrs(&field.attrs)?;
        if list_attrs.skip {
            continue;
        }
        let field_type = match list_attrs.field_type {
            Some(t) => t,
            None => continue,
        };

        let query_name = list_attrs
            .rename
            .unwrap_or_else(|| syn::ext::IdentExt::unraw(field_name).to_string());
        if query_name.is_empty() || query_name.contains('.') {
            return Err(Error::new(
                list_attrs.span,
                "field names must be non-empty and must not contain '.'",
            ));
        }
        // Paths are normalised to snake_case before lookup
        let lookup_name = to_snake_case(&query_name);

        let const_name = format_ident!("{}", to_screaming_snake_case(&query_name));
        field_constants.push(quote! {
            /// Field name constant for type-safe requests.
            pub const #const_name: &'static str = #query_name;
        });

        let optional = option_inner(&field.ty).is_some();
        let kind = format_ident!("{}", field_type.kind_name());
        field_defs.push(quote! {
            ::listdata::FieldDef::new(#query_name, ::listdata::FieldKind::#kind, #optional),
        });

        if field_type == FieldType::Nested {
            nested_arms.push(quote! {
                #lookup_name => ::core::option::Option::Some(
                    &self.#field_name as &dyn ::listdata::Record
                ),
            });
            continue;
        }

        let value_expr = scalar_value(field_type);
        let arm = if optional {
            quote! {
                #lookup_name => match &self.#field_name {
                    ::core::option::Option::Some(v) => #value_expr,
                    ::core::option::Option::None => ::listdata::Value::Absent,
                },
            }
        } else {
            quote! {
                #lookup_name => {
                    let v = &self.#field_name;
                    #value_expr
                }
            }
        };
        value_arms.push(arm);
    }

    let nested_fn = if nested_arms.is_empty() {
        TokenStream::new()
    } else {
        quote! {
            fn nested(&self, field: &str) -> ::core::option::Option<&dyn ::listdata::Record> {
                match field {
                    #(#nested_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    };

    let expanded = quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#field_constants)*
        }

        impl #impl_generics ::listdata::Record for #struct_name #ty_generics #where_clause {
            fn field_value(&self, field: &str) -> ::listdata::Value<'_> {
                match field {
                    #(#value_arms)*
                    _ => ::listdata::Value::Absent,
                }
            }

            #nested_fn

            fn fields() -> &'static [::listdata::FieldDef] {
                const FIELDS: &[::listdata::FieldDef] = &[
                    #(#field_defs)*
                ];
                FIELDS
            }
        }
    };

    Ok(expanded)
}

/// Builds the `Value` for a field borrowed as `v`.
fn scalar_value(field_type: FieldType) -> TokenStream {
    match field_type {
        FieldType::String => quote! {
            ::listdata::Value::String(::core::convert::AsRef::<str>::as_ref(v))
        },
        FieldType::Number => quote! {
            ::listdata::Value::Number(::listdata::Number::from(*v))
        },
        FieldType::Timestamp => quote! {
            ::listdata::Value::Timestamp(::listdata::RecordTimestamp::timestamp(v))
        },
        FieldType::Enum => quote! {
            ::listdata::Value::Enum(::listdata::RecordEnum::discriminant(v))
        },
        FieldType::Bool => quote! {
            ::listdata::Value::Bool(*v)
        },
        FieldType::Nested => quote! { ::listdata::Value::Absent },
    }
}

/// Returns `T` when `ty` is written as `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

/// Convert a string to snake_case, matching the runtime path normalisation.
fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.trim().chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.extend(c.to_lowercase());
            prev_was_lower = false;
        } else if c == '-' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c);
            prev_was_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }

    result
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = true;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screaming_snake_case() {
        assert_eq!(to_screaming_snake_case("name"), "NAME");
        assert_eq!(to_screaming_snake_case("date_modified"), "DATE_MODIFIED");
        assert_eq!(to_screaming_snake_case("dateModified"), "DATE_MODIFIED");
        assert_eq!(to_screaming_snake_case("my-field"), "MY_FIELD");
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("name"), "name");
        assert_eq!(to_snake_case("dateModified"), "date_modified");
        assert_eq!(to_snake_case("client-name"), "client_name");
        assert_eq!(to_snake_case("seats2Max"), "seats2_max");
    }

    #[test]
    fn test_option_detection() {
        let ty: Type = syn::parse_str("Option<String>").unwrap();
        assert!(option_inner(&ty).is_some());
        let ty: Type = syn::parse_str("std::option::Option<Box<Client>>").unwrap();
        assert!(option_inner(&ty).is_some());
        let ty: Type = syn::parse_str("Vec<String>").unwrap();
        assert!(option_inner(&ty).is_none());
        let ty: Type = syn::parse_str("String").unwrap();
        assert!(option_inner(&ty).is_none());
    }

    #[test]
    fn test_generated_impl_shape() {
        let input: DeriveInput = syn::parse_str(
            r#"
            struct Subscription {
                #[list(String)]
                plan: String,
                #[list(Number, rename = "seatCount")]
                seats: Option<u32>,
                #[list(Nested)]
                client: Client,
                #[list(skip)]
                internal: u8,
            }
            "#,
        )
        .unwrap();
        let tokens = record_derive_impl(input).unwrap().to_string();
        assert!(tokens.contains("SEAT_COUNT"));
        assert!(tokens.contains("\"seat_count\""));
        assert!(tokens.contains("fn nested"));
        assert!(!tokens.contains("INTERNAL"));
    }

    #[test]
    fn test_rejects_enums() {
        let input: DeriveInput = syn::parse_str("enum Status { Active }").unwrap();
        let err = record_derive_impl(input).unwrap_err();
        assert!(err.to_string().contains("only be derived for structs"));
    }

    #[test]
    fn test_rejects_dotted_rename() {
        let input: DeriveInput = syn::parse_str(
            r#"struct Bad { #[list(String, rename = "client.name")] name: String }"#,
        )
        .unwrap();
        assert!(record_derive_impl(input).is_err());
    }
}
