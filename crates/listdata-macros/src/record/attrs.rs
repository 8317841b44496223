//! Attribute parsing for the Record derive macro.
//!
//! This module provides parsers for the `#[list(...)]` field attributes
//! used by the `Record` derive macro.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Ident, Lit, Meta, Result, Token,
};

/// The kind of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// `#[list(String)]`
    String,
    /// `#[list(Number)]`
    Number,
    /// `#[list(Timestamp)]`
    Timestamp,
    /// `#[list(Enum)]`
    Enum,
    /// `#[list(Bool)]`
    Bool,
    /// `#[list(Nested)]`: a field that itself implements `Record`.
    Nested,
}

const EXPECTED: &str = "String, Number, Timestamp, Enum, Bool, Nested";

impl FieldType {
    fn parse_name(name: &str) -> Option<Self> {
        match name {
            "String" | "string" => Some(FieldType::String),
            "Number" | "number" => Some(FieldType::Number),
            "Timestamp" | "timestamp" => Some(FieldType::Timestamp),
            "Enum" | "enum" | "enumeration" => Some(FieldType::Enum),
            "Bool" | "bool" | "boolean" => Some(FieldType::Bool),
            "Nested" | "nested" => Some(FieldType::Nested),
            _ => None,
        }
    }

    /// Parse a field type from an identifier.
    pub fn from_ident(ident: &Ident) -> Result<Self> {
        let name = ident.to_string();
        Self::parse_name(&name).ok_or_else(|| {
            Error::new(
                ident.span(),
                format!("unknown field type: '{}'. Expected one of: {}", name, EXPECTED),
            )
        })
    }

    /// Parse a field type from a string literal.
    pub fn from_str(s: &str, span: Span) -> Result<Self> {
        Self::parse_name(s).ok_or_else(|| {
            Error::new(
                span,
                format!("unknown field type: '{}'. Expected one of: {}", s, EXPECTED),
            )
        })
    }

    /// Name of the matching `listdata::FieldKind` variant.
    pub fn kind_name(self) -> &'static str {
        match self {
            FieldType::String => "String",
            FieldType::Number => "Number",
            FieldType::Timestamp => "Timestamp",
            FieldType::Enum => "Enum",
            FieldType::Bool => "Bool",
            FieldType::Nested => "Nested",
        }
    }
}

/// Field-level attributes from `#[list(...)]`.
#[derive(Debug, Clone)]
pub struct ListAttr {
    pub field_type: Option<FieldType>,
    pub skip: bool,
    /// Custom wire name (default: the field name).
    pub rename: Option<String>,
    pub span: Span,
}

impl Default for ListAttr {
    fn default() -> Self {
        ListAttr {
            field_type: None,
            skip: false,
            rename: None,
            span: Span::call_site(),
        }
    }
}

fn string_literal(expr: &syn::Expr, what: &str) -> Result<syn::LitStr> {
    match expr {
        syn::Expr::Lit(syn::ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.clone()),
        other => Err(Error::new(
            other.span(),
            format!("{} must be a string literal", what),
        )),
    }
}

impl Parse for ListAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = ListAttr::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                Meta::Path(p) => {
                    if p.is_ident("skip") {
                        attr.skip = true;
                    } else if let Some(ident) = p.get_ident() {
                        attr.field_type = Some(FieldType::from_ident(ident)?);
                        attr.span = ident.span();
                    } else {
                        return Err(Error::new(
                            p.span(),
                            format!("expected field type ({}) or skip", EXPECTED),
                        ));
                    }
                }

                // rename = "wire_name" or ty = "enum"
                Meta::NameValue(nv) => {
                    if nv.path.is_ident("rename") {
                        attr.rename = Some(string_literal(&nv.value, "rename")?.value());
                    } else if nv.path.is_ident("ty") {
                        let lit = string_literal(&nv.value, "ty")?;
                        attr.field_type = Some(FieldType::from_str(&lit.value(), lit.span())?);
                        attr.span = lit.span();
                    } else {
                        return Err(Error::new(
                            nv.path.span(),
                            "unknown attribute. Expected: rename or ty",
                        ));
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown list attribute. \
                         Expected a field type, skip, rename = \"...\", or ty = \"...\"",
                    ));
                }
            }
        }

        Ok(attr)
    }
}

/// Extract `#[list(...)]` attributes from a field's attributes.
pub fn parse_list_attrs(attrs: &[Attribute]) -> Result<ListAttr> {
    for attr in attrs {
        if attr.path().is_ident("list") {
            return attr.parse_args::<ListAttr>();
        }
    }
    Ok(ListAttr::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_list(tokens: &str) -> Result<ListAttr> {
        syn::parse_str::<ListAttr>(tokens)
    }

    #[test]
    fn test_field_types() {
        assert_eq!(parse_list("String").unwrap().field_type, Some(FieldType::String));
        assert_eq!(parse_list("number").unwrap().field_type, Some(FieldType::Number));
        assert_eq!(
            parse_list("Timestamp").unwrap().field_type,
            Some(FieldType::Timestamp)
        );
        assert_eq!(parse_list("Enum").unwrap().field_type, Some(FieldType::Enum));
        assert_eq!(parse_list("Bool").unwrap().field_type, Some(FieldType::Bool));
        assert_eq!(parse_list("Nested").unwrap().field_type, Some(FieldType::Nested));
    }

    #[test]
    fn test_keyword_types_via_ty() {
        // `enum` and `bool` are keywords or primitives; ty = "..." covers them
        let attr = parse_list(r#"ty = "enum""#).unwrap();
        assert_eq!(attr.field_type, Some(FieldType::Enum));
        let attr = parse_list(r#"ty = "bool""#).unwrap();
        assert_eq!(attr.field_type, Some(FieldType::Bool));
    }

    #[test]
    fn test_skip() {
        let attr = parse_list("skip").unwrap();
        assert!(attr.skip);
        assert_eq!(attr.field_type, None);
    }

    #[test]
    fn test_rename() {
        let attr = parse_list(r#"String, rename = "client_name""#).unwrap();
        assert_eq!(attr.field_type, Some(FieldType::String));
        assert_eq!(attr.rename, Some("client_name".to_string()));
    }

    #[test]
    fn test_rename_requires_string() {
        let err = parse_list("String, rename = 3").unwrap_err();
        assert!(err.to_string().contains("rename must be a string literal"));
    }

    #[test]
    fn test_invalid_type() {
        let err = parse_list("Float").unwrap_err();
        assert!(err.to_string().contains("unknown field type"));
    }

    #[test]
    fn test_unknown_name_value() {
        let err = parse_list(r#"alias = "x""#).unwrap_err();
        assert!(err.to_string().contains("Expected: rename or ty"));
    }
}
