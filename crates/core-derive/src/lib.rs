//! Proc-macros for stagechain core
//!
//! Provides `#[derive(StageConfig)]`, which turns a plain struct into a stage
//! configuration record:
//!
//! ```ignore
//! #[derive(Debug, Default, StageConfig)]
//! pub struct DistrictStage {
//!     #[config = "district_id,required"]
//!     pub district_id: String,
//!
//!     #[config = "collection"]
//!     pub collection: String,
//!
//!     #[config = "dry_run"]
//!     pub dry_run: bool,
//! }
//! ```
//!
//! The macro only records what was declared:
//! 1. A static `FieldDecl` table (field name, raw tag, declared kind) in
//!    declaration order
//! 2. `field()` / `set_field()` accessors for `String` and `bool` fields
//!
//! Tag semantics (missing key, unknown modifiers, required booleans,
//! unsupported field types) are checked by the schema builder at runtime so
//! they surface as typed `stagechain_core::Error` values.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, Lit, Meta, NestedMeta};

/// Value kind of a struct field as seen by the macro
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotKind {
    String,
    Boolean,
    Unsupported,
}

/// A named field together with its `#[config]` declaration
struct DeclaredField {
    ident: syn::Ident,
    tag: String,
    kind: SlotKind,
    type_name: String,
}

/// Classify a field type by its last path segment.
///
/// Only bare `String` and `bool` are slots; anything with generics,
/// references or tuples is unsupported.
fn classify_type(ty: &syn::Type) -> SlotKind {
    match ty {
        syn::Type::Path(type_path) if type_path.qself.is_none() => {
            match type_path.path.segments.last() {
                Some(seg) if seg.arguments.is_empty() && seg.ident == "String" => SlotKind::String,
                Some(seg) if seg.arguments.is_empty() && seg.ident == "bool" => SlotKind::Boolean,
                _ => SlotKind::Unsupported,
            }
        }
        _ => SlotKind::Unsupported,
    }
}

/// Parse `#[config = "key[,required]"]` or `#[config("key[,required]")]`
fn parse_config_attr(attr: &syn::Attribute) -> Result<String, syn::Error> {
    let meta = attr.parse_meta()?;
    match meta {
        Meta::NameValue(nv) => match &nv.lit {
            Lit::Str(s) => Ok(s.value()),
            other => Err(syn::Error::new_spanned(other, "expected a string literal tag")),
        },
        Meta::List(list) => {
            let mut nested = list.nested.iter();
            match (nested.next(), nested.next()) {
                (Some(NestedMeta::Lit(Lit::Str(s))), None) => Ok(s.value()),
                _ => Err(syn::Error::new_spanned(
                    &list,
                    "expected #[config = \"key\"] or #[config(\"key,required\")]",
                )),
            }
        }
        Meta::Path(path) => Err(syn::Error::new_spanned(
            path,
            "expected #[config = \"key\"] or #[config(\"key,required\")]",
        )),
    }
}

/// Collect the `#[config]` declaration of every named field.
///
/// A field without the attribute gets an empty tag, which the schema builder
/// reports as a missing key.
fn collect_fields(
    fields: &syn::punctuated::Punctuated<syn::Field, syn::token::Comma>,
) -> Result<Vec<DeclaredField>, syn::Error> {
    let mut declared = Vec::new();

    for field in fields {
        let ident = match &field.ident {
            Some(ident) => ident.clone(),
            None => return Err(syn::Error::new_spanned(field, "expected a named field")),
        };

        let mut tag = None;
        for attr in &field.attrs {
            if attr.path.is_ident("config") {
                if tag.is_some() {
                    return Err(syn::Error::new_spanned(
                        attr,
                        format!("field '{}' has more than one #[config] attribute", ident),
                    ));
                }
                tag = Some(parse_config_attr(attr)?);
            }
        }

        let ty = &field.ty;
        declared.push(DeclaredField {
            kind: classify_type(ty),
            type_name: quote!(#ty).to_string().replace(' ', ""),
            tag: tag.unwrap_or_default(),
            ident,
        });
    }

    Ok(declared)
}

fn generate_decl_table(fields: &[DeclaredField]) -> proc_macro2::TokenStream {
    let entries = fields.iter().map(|f| {
        let name = f.ident.to_string();
        let tag = &f.tag;
        let kind = match f.kind {
            SlotKind::String => quote! { ::stagechain_core::DeclaredKind::String },
            SlotKind::Boolean => quote! { ::stagechain_core::DeclaredKind::Boolean },
            SlotKind::Unsupported => {
                let type_name = &f.type_name;
                quote! { ::stagechain_core::DeclaredKind::Unsupported(#type_name) }
            }
        };
        quote! {
            ::stagechain_core::FieldDecl {
                field: #name,
                tag: #tag,
                kind: #kind,
            }
        }
    });

    quote! {
        fn field_decls() -> &'static [::stagechain_core::FieldDecl] {
            const DECLS: &[::stagechain_core::FieldDecl] = &[#(#entries),*];
            DECLS
        }
    }
}

fn generate_accessors(fields: &[DeclaredField]) -> proc_macro2::TokenStream {
    let get_arms = fields.iter().filter_map(|f| {
        let ident = &f.ident;
        let name = ident.to_string();
        match f.kind {
            SlotKind::String => Some(quote! {
                #name => Some(::stagechain_core::FieldValue::String(
                    ::std::clone::Clone::clone(&self.#ident),
                )),
            }),
            SlotKind::Boolean => Some(quote! {
                #name => Some(::stagechain_core::FieldValue::Bool(self.#ident)),
            }),
            SlotKind::Unsupported => None,
        }
    });

    let set_arms = fields.iter().filter_map(|f| {
        let ident = &f.ident;
        let name = ident.to_string();
        match f.kind {
            SlotKind::String => Some(quote! {
                (#name, ::stagechain_core::FieldValue::String(v)) => {
                    self.#ident = v;
                    true
                }
            }),
            SlotKind::Boolean => Some(quote! {
                (#name, ::stagechain_core::FieldValue::Bool(v)) => {
                    self.#ident = v;
                    true
                }
            }),
            SlotKind::Unsupported => None,
        }
    });

    quote! {
        fn field(&self, field: &str) -> Option<::stagechain_core::FieldValue> {
            match field {
                #(#get_arms)*
                _ => None,
            }
        }

        fn set_field(&mut self, field: &str, value: ::stagechain_core::FieldValue) -> bool {
            match (field, value) {
                #(#set_arms)*
                _ => false,
            }
        }
    }
}

/// Derive macro for stage configuration records.
///
/// Every named field may carry `#[config = "key"]` or
/// `#[config = "key,required"]`. Supported field types are `String` and
/// `bool`; other types are recorded as unsupported and rejected when the
/// schema is built.
#[proc_macro_derive(StageConfig, attributes(config))]
pub fn derive_stage_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            syn::Fields::Named(named) => &named.named,
            _ => {
                return syn::Error::new_spanned(&input, "StageConfig only supports structs with named fields")
                    .into_compile_error()
                    .into()
            }
        },
        _ => {
            return syn::Error::new_spanned(&input, "StageConfig only supports structs")
                .into_compile_error()
                .into()
        }
    };

    let declared = match collect_fields(fields) {
        Ok(declared) => declared,
        Err(e) => return e.into_compile_error().into(),
    };

    let decl_table = generate_decl_table(&declared);
    let accessors = generate_accessors(&declared);

    let expanded = quote! {
        impl #impl_generics ::stagechain_core::StageConfig for #struct_name #ty_generics #where_clause {
            #decl_table
            #accessors
        }
    };

    TokenStream::from(expanded)
}
