/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Procedural derive macros for `bytewire`: `#[derive(Record)]` and
//! `#[derive(WireEnum)]`.
//!
//! `#[derive(Record)]` never inspects a field's type for *how* to write or read it -- it
//! only needs enough syntactic information to tell whether a field is `Option<Inner>`
//! (nullable, or -- with `#[bytewire(wire_enum)]` -- an enum ordinal) versus a plain,
//! always-present field. Everything else is delegated to `<FieldType as WireField>::TAG`,
//! `write`, and `read`, resolved by the compiler per concrete field type. This keeps the
//! generated code identical in shape across every record, which is what makes the
//! per-field special-casing below (detecting `Option<...>`, reading an attribute) a small,
//! fixed amount of macro logic rather than something that grows with the number of field
//! types this crate knows about.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, GenericArgument, Ident, PathArguments, Type};

#[proc_macro_derive(Record, attributes(bytewire))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match gen_record_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

#[proc_macro_derive(WireEnum)]
pub fn derive_wire_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match gen_wire_enum_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

/// One struct field, classified into the shape its wire handling takes.
enum FieldKind<'a> {
    /// A plain, always-present field of type `ty`.
    Plain { ty: &'a Type },
    /// `Option<inner>` with no `#[bytewire(wire_enum)]` attribute: nullable via the
    /// record-level `Null` nibble override.
    Nullable { inner: &'a Type },
    /// `Option<inner>` with `#[bytewire(wire_enum)]`: an enum ordinal, self-contained via
    /// its own sentinel.
    WireEnum { inner: &'a Type },
}

fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(p) = ty else { return None };
    let last = p.path.segments.last()?;
    if last.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    args.args.iter().find_map(|a| match a {
        GenericArgument::Type(t) => Some(t),
        _ => None,
    })
}

fn has_wire_enum_attr(attrs: &[syn::Attribute]) -> bool {
    attrs.iter().any(|attr| {
        if !attr.path().is_ident("bytewire") {
            return false;
        }
        let mut found = false;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("wire_enum") {
                found = true;
            }
            Ok(())
        });
        found
    })
}

fn classify_field(field: &syn::Field) -> FieldKind<'_> {
    let ty = &field.ty;
    match option_inner(ty) {
        Some(inner) if has_wire_enum_attr(&field.attrs) => FieldKind::WireEnum { inner },
        Some(inner) => FieldKind::Nullable { inner },
        None => FieldKind::Plain { ty },
    }
}

fn named_fields(input: &DeriveInput) -> syn::Result<&syn::FieldsNamed> {
    match &input.data {
        Data::Struct(s) => match &s.fields {
            Fields::Named(named) => Ok(named),
            _ => Err(syn::Error::new_spanned(
                &input.ident,
                "Record can only be derived for structs with named fields",
            )),
        },
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            "Record can only be derived for structs",
        )),
    }
}

fn gen_record_impl(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let fields = named_fields(input)?;
    let name = &input.ident;
    let field_count = fields.named.len();
    if field_count > 255 {
        return Err(syn::Error::new_spanned(
            name,
            "a record cannot declare more than 255 fields",
        ));
    }
    let field_count_u8 = field_count as u8;

    let names: Vec<&Ident> = fields
        .named
        .iter()
        .map(|f| f.ident.as_ref().expect("named field"))
        .collect();
    let name_strs: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    let kinds: Vec<FieldKind> = fields.named.iter().map(classify_field).collect();

    let tag_exprs: Vec<_> = kinds
        .iter()
        .zip(&names)
        .map(|(kind, field_name)| match kind {
            FieldKind::Plain { ty } => quote! { <#ty as ::bytewire::field::WireField>::TAG },
            FieldKind::Nullable { inner } => quote! {
                if self.#field_name.is_some() {
                    <#inner as ::bytewire::field::WireField>::TAG
                } else {
                    ::bytewire::tag::Tag::Null
                }
            },
            FieldKind::WireEnum { inner } => {
                quote! { <::std::option::Option<#inner> as ::bytewire::field::WireField>::TAG }
            }
        })
        .collect();

    let write_stmts: Vec<_> = kinds
        .iter()
        .zip(&names)
        .map(|(kind, field_name)| match kind {
            FieldKind::Plain { .. } | FieldKind::WireEnum { .. } => quote! {
                ::bytewire::field::WireField::write(&self.#field_name, w)?;
            },
            FieldKind::Nullable { .. } => quote! {
                if let ::std::option::Option::Some(v) = &self.#field_name {
                    ::bytewire::field::WireField::write(v, w)?;
                }
            },
        })
        .collect();

    let read_stmts: Vec<_> = kinds
        .iter()
        .enumerate()
        .zip(&names)
        .map(|((i, kind), field_name)| {
            let name_str = &name_strs[i];
            match kind {
                FieldKind::Plain { ty } => quote! {
                    let #field_name = {
                        if tags[#i] != <#ty as ::bytewire::field::WireField>::TAG {
                            return ::std::result::Result::Err(::bytewire::error::FormatError::UnexpectedTag {
                                pos: r.position(),
                                expected: #name_str,
                                found: tags[#i] as u8,
                            });
                        }
                        <#ty as ::bytewire::field::WireField>::read(r)?
                    };
                },
                FieldKind::Nullable { inner } => quote! {
                    let #field_name = {
                        if tags[#i] == ::bytewire::tag::Tag::Null {
                            ::std::option::Option::None
                        } else if tags[#i] == <#inner as ::bytewire::field::WireField>::TAG {
                            ::std::option::Option::Some(<#inner as ::bytewire::field::WireField>::read(r)?)
                        } else {
                            return ::std::result::Result::Err(::bytewire::error::FormatError::UnexpectedTag {
                                pos: r.position(),
                                expected: #name_str,
                                found: tags[#i] as u8,
                            });
                        }
                    };
                },
                FieldKind::WireEnum { inner } => quote! {
                    let #field_name = {
                        if tags[#i] != <::std::option::Option<#inner> as ::bytewire::field::WireField>::TAG {
                            return ::std::result::Result::Err(::bytewire::error::FormatError::UnexpectedTag {
                                pos: r.position(),
                                expected: #name_str,
                                found: tags[#i] as u8,
                            });
                        }
                        <::std::option::Option<#inner> as ::bytewire::field::WireField>::read(r)?
                    };
                },
            }
        })
        .collect();

    let schema_fields: Vec<_> = kinds
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            let name_str = &name_strs[i];
            match kind {
                FieldKind::Plain { ty } => quote! {
                    ::bytewire::schema::FieldDescriptor {
                        name: #name_str,
                        tag: <#ty as ::bytewire::field::WireField>::TAG,
                        nullable: false,
                        element_tag: <#ty as ::bytewire::field::WireField>::ELEMENT_TAG,
                        key_tag: <#ty as ::bytewire::field::WireField>::KEY_TAG,
                        nested_schema: <#ty as ::bytewire::field::WireField>::nested_schema(),
                        key_nested_schema: <#ty as ::bytewire::field::WireField>::key_nested_schema(),
                    }
                },
                FieldKind::Nullable { inner } => quote! {
                    ::bytewire::schema::FieldDescriptor {
                        name: #name_str,
                        tag: <#inner as ::bytewire::field::WireField>::TAG,
                        nullable: true,
                        element_tag: <#inner as ::bytewire::field::WireField>::ELEMENT_TAG,
                        key_tag: <#inner as ::bytewire::field::WireField>::KEY_TAG,
                        nested_schema: <#inner as ::bytewire::field::WireField>::nested_schema(),
                        key_nested_schema: <#inner as ::bytewire::field::WireField>::key_nested_schema(),
                    }
                },
                FieldKind::WireEnum { .. } => quote! {
                    ::bytewire::schema::FieldDescriptor {
                        name: #name_str,
                        tag: ::bytewire::tag::Tag::I32,
                        nullable: false,
                        element_tag: ::std::option::Option::None,
                        key_tag: ::std::option::Option::None,
                        nested_schema: ::std::option::Option::None,
                        key_nested_schema: ::std::option::Option::None,
                    }
                },
            }
        })
        .collect();

    let type_name_str = name.to_string();

    Ok(quote! {
        impl ::bytewire::record::Record for #name {
            fn schema() -> ::std::result::Result<::std::sync::Arc<::bytewire::schema::Schema>, ::bytewire::error::SchemaError> {
                ::bytewire::schema::schema_for::<#name>(|| {
                    ::std::result::Result::Ok(::bytewire::schema::Schema {
                        type_name: #type_name_str,
                        fields: ::std::vec![ #(#schema_fields),* ],
                    })
                })
            }

            fn write_record(&self, w: &mut ::bytewire::writer::ByteWriter) -> ::std::result::Result<(), ::bytewire::error::WriteError> {
                w.write_u8(::bytewire::tag::Tag::Record as u8);
                w.write_u8(#field_count_u8);
                let tags: [::bytewire::tag::Tag; #field_count] = [ #(#tag_exprs),* ];
                ::bytewire::wire::write_nibbles(w, &tags);
                #(#write_stmts)*
                ::std::result::Result::Ok(())
            }

            fn read_record(r: &mut ::bytewire::reader::ByteReader) -> ::std::result::Result<Self, ::bytewire::error::FormatError> {
                let tag = r.read_u8()?;
                if tag != ::bytewire::tag::Tag::Record as u8 {
                    return ::std::result::Result::Err(::bytewire::error::FormatError::UnexpectedTag {
                        pos: r.position() - 1,
                        expected: "Record",
                        found: tag,
                    });
                }
                let count = r.read_u8()? as usize;
                if count != #field_count {
                    return ::std::result::Result::Err(::bytewire::error::FormatError::FieldCountMismatch {
                        type_name: #type_name_str,
                        expected: #field_count,
                        found: count,
                    });
                }
                let tags = ::bytewire::wire::read_nibbles(r, count)?;
                #(#read_stmts)*
                ::std::result::Result::Ok(#name { #(#names),* })
            }
        }
    })
}

fn gen_wire_enum_impl(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            name,
            "WireEnum can only be derived for enums",
        ));
    };
    let mut to_arms = Vec::new();
    let mut from_arms = Vec::new();
    for (i, variant) in data.variants.iter().enumerate() {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "WireEnum only supports unit variants",
            ));
        }
        let vname = &variant.ident;
        let ordinal = i as i32;
        to_arms.push(quote! { #name::#vname => #ordinal, });
        from_arms.push(quote! { #ordinal => ::std::option::Option::Some(#name::#vname), });
    }

    Ok(quote! {
        impl ::bytewire::wire_enum::WireEnum for #name {
            fn to_ordinal(&self) -> i32 {
                match self { #(#to_arms)* }
            }

            fn from_ordinal(ordinal: i32) -> ::std::option::Option<Self> {
                match ordinal {
                    #(#from_arms)*
                    _ => ::std::option::Option::None,
                }
            }
        }
    })
}
