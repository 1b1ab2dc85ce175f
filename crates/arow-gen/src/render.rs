// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rust renderer for write steps and read arms.
//!
//! Each record becomes a unit struct `<Name>ArowCore` with one `KEY_<MEMBER>` constant
//! per wire field and an `arow_wire::TypeSerializationCore` impl. Generated code names
//! everything through absolute `::arow_wire` paths and the configured type root, so it
//! can be included anywhere in the consuming crate.

use std::collections::BTreeSet;

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{Ident, LitInt, Path, Type};

use arow_wire::DataTypeTag;

use crate::classify::{Shape, TypePath};
use crate::deserializer::{self, ReadArm};
use crate::error::GenError;
use crate::plan::RecordPlan;
use crate::schema::Namespace;
use crate::serializer::{self, Presence, WriteOp, WriteStep};

/// Rendered code for one record, tagged for the assembler.
#[derive(Debug, Clone)]
pub struct GeneratedUnit {
    /// Namespace of the record; decides the module the code lands in.
    pub namespace: Namespace,
    /// Record name.
    pub name: String,
    /// Items to place in the namespace module.
    pub tokens: TokenStream,
}

/// Renders plans against a type root.
#[derive(Debug, Clone)]
pub struct Renderer {
    type_root: Path,
}

impl Renderer {
    /// `type_root` is the Rust path the namespace modules of record and enum types hang
    /// off, for example `crate` or `crate::model`.
    pub fn new(type_root: &str) -> Result<Self, GenError> {
        let type_root = syn::parse_str::<Path>(type_root.trim()).map_err(|_| {
            GenError::Argument(format!("type root `{type_root}` is not a Rust path"))
        })?;
        Ok(Self { type_root })
    }

    fn type_path(&self, path: &TypePath) -> Result<Path, GenError> {
        let mut out = self.type_root.clone();
        let segments = path.namespace.segments().iter().map(String::as_str);
        for segment in segments.chain(std::iter::once(path.name.as_str())) {
            out.segments.push(ident(segment)?.into());
        }
        Ok(out)
    }

    /// Render one record.
    pub fn render(&self, plan: &RecordPlan) -> Result<GeneratedUnit, GenError> {
        let core = format_ident!("{}ArowCore", ident(&plan.path.name)?);
        let row_ty = self.type_path(&plan.path)?;
        let consts = key_consts(plan)?;

        let key_items = plan
            .fields()
            .iter()
            .zip(&consts)
            .map(|(field, name)| {
                let doc = format!(
                    " Wire key of `{}`: backend name `{}`.",
                    field.member, field.backend
                );
                let value = LitInt::new(&format!("0x{:x}", field.key.0), Span::call_site());
                quote! {
                    #[doc = #doc]
                    pub const #name: ::arow_wire::WireKey = ::arow_wire::WireKey(#value);
                }
            })
            .collect::<Vec<_>>();

        let write_ops = serializer::synthesize(plan);
        let writes = write_ops
            .iter()
            .zip(consts.iter().map(Some).chain(std::iter::once(None)))
            .map(|(op, key)| match (op, key) {
                (WriteOp::Field(step), Some(key)) => self.write_step(step, key),
                _ => Ok(quote! { w.write_end(); }),
            })
            .collect::<Result<Vec<_>, GenError>>()?;

        let read_loop = deserializer::synthesize(plan);
        let arms = read_loop
            .arms
            .iter()
            .zip(&consts)
            .map(|(arm, key)| self.read_arm(arm, key))
            .collect::<Result<Vec<_>, GenError>>()?;

        let uses_registry = plan.fields().iter().any(|f| f.kind.record().is_some());
        let registry = if uses_registry {
            quote!(registry)
        } else {
            quote!(_registry)
        };
        let row_param = if arms.is_empty() { quote!(_row) } else { quote!(row) };
        let inner_decl = if read_loop.reads_elements() {
            quote! { let mut inner = None; }
        } else {
            TokenStream::new()
        };
        let inner_arg = if read_loop.reads_elements() {
            quote!(inner)
        } else {
            quote!(None)
        };
        let dispatch = if arms.is_empty() {
            TokenStream::new()
        } else {
            quote! {
                match key {
                    #(#arms)*
                    _ => {}
                }
            }
        };

        let doc = format!(" Arow serializer core for `{}`.", plan.path);
        let consts_block = if key_items.is_empty() {
            TokenStream::new()
        } else {
            quote! {
                impl #core {
                    #(#key_items)*
                }
            }
        };

        let tokens = quote! {
            #[doc = #doc]
            #[derive(Debug, Clone, Copy, Default)]
            pub struct #core;

            #consts_block

            impl ::arow_wire::TypeSerializationCore for #core {
                type Row = #row_ty;

                fn register(registry: &mut ::arow_wire::Registry) {
                    registry.register::<Self::Row>(Self::serialize, Self::deserialize);
                }

                fn serialize(
                    #row_param: &Self::Row,
                    w: &mut ::arow_wire::Writer,
                    #registry: &::arow_wire::Registry,
                ) -> ::core::result::Result<(), ::arow_wire::CodecError> {
                    #(#writes)*
                    Ok(())
                }

                fn deserialize(
                    #row_param: &mut Self::Row,
                    r: &mut ::arow_wire::Reader<'_>,
                    #registry: &::arow_wire::Registry,
                ) -> ::core::result::Result<(), ::arow_wire::CodecError> {
                    loop {
                        let key = r.read_name()?;
                        if key.is_end() {
                            return Ok(());
                        }
                        let tag = r.read_tag()?;
                        #inner_decl
                        #dispatch
                        r.consume_unmatched(key, tag, #inner_arg)?;
                    }
                }
            }
        };

        Ok(GeneratedUnit {
            namespace: plan.path.namespace.clone(),
            name: plan.path.name.clone(),
            tokens,
        })
    }

    fn write_step(&self, step: &WriteStep<'_>, key: &Ident) -> Result<TokenStream, GenError> {
        let member = ident(step.member)?;
        let key = quote!(Self::#key);
        let write = |value: TokenStream| -> Result<TokenStream, GenError> {
            Ok(match step.shape {
                Shape::Scalar(m) => {
                    let writer = ident(m.writer)?;
                    quote! { w.#writer(#key, #value)? }
                }
                Shape::Enum(_) => quote! { w.write_enum(#key, #value)? },
                Shape::Row(p) => {
                    let ty = self.type_path(p)?;
                    quote! { registry.write_row::<#ty>(w, #key, #value)? }
                }
                Shape::RowSeq { element, .. } => {
                    let ty = self.type_path(element)?;
                    quote! { registry.write_row_array::<#ty>(w, #key, #value)? }
                }
                Shape::ScalarSeq { mapping, .. } => {
                    let ty = rust_type(mapping.rust_type)?;
                    quote! { w.write_array::<#ty>(#key, #value)? }
                }
            })
        };

        let copy = matches!(step.shape, Shape::Scalar(m) if !m.by_ref);
        Ok(match step.presence {
            Presence::Always if copy => {
                let call = write(quote!(row.#member))?;
                quote! { #call; }
            }
            Presence::Always => {
                let call = write(quote!(&row.#member))?;
                quote! { #call; }
            }
            Presence::IfPresent => {
                let call = write(quote!(v))?;
                let scrutinee = if copy {
                    quote!(row.#member)
                } else {
                    quote!(&row.#member)
                };
                quote! {
                    match #scrutinee {
                        Some(v) => #call,
                        None => w.write_null(#key),
                    }
                }
            }
        })
    }

    fn read_arm(&self, arm: &ReadArm<'_>, key: &Ident) -> Result<TokenStream, GenError> {
        let member = ident(arm.member)?;
        let read = match arm.shape {
            Shape::Scalar(m) => {
                let reader = ident(m.reader)?;
                quote!(r.#reader()?)
            }
            Shape::Enum(p) => {
                let ty = self.type_path(p)?;
                quote!(r.read_enum::<#ty>()?)
            }
            Shape::Row(p) => {
                let ty = self.type_path(p)?;
                quote!(::std::boxed::Box::new(registry.read_row::<#ty>(r)?))
            }
            Shape::RowSeq { element, list } => {
                let ty = self.type_path(element)?;
                if list {
                    quote!(registry.read_row_vec::<#ty>(r)?)
                } else {
                    quote!(registry.read_row_vec::<#ty>(r)?.into_boxed_slice())
                }
            }
            Shape::ScalarSeq { mapping, list } => {
                let ty = rust_type(mapping.rust_type)?;
                if list {
                    quote!(r.read_array_values::<#ty>()?)
                } else {
                    quote!(r.read_array_values::<#ty>()?.into_boxed_slice())
                }
            }
        };
        let assign = match arm.shape {
            Shape::Enum(_) => {
                let value = if arm.optional {
                    quote!(Some(v))
                } else {
                    quote!(v)
                };
                quote! {
                    if let Some(v) = #read {
                        row.#member = #value;
                    }
                }
            }
            _ if arm.optional => quote! { row.#member = Some(#read); },
            _ => quote! { row.#member = #read; },
        };

        let clear = if arm.accepts_null {
            quote! {
                if tag == ::arow_wire::DataTypeTag::Null {
                    row.#member = None;
                    continue;
                }
            }
        } else {
            TokenStream::new()
        };
        let expect = tag_path(arm.expect);
        let body = match arm.element {
            Some(element) => {
                let element = tag_path(element);
                quote! {
                    if tag == #expect {
                        let element = r.read_tag()?;
                        if element == #element {
                            #assign
                            continue;
                        }
                        inner = Some(element);
                    }
                }
            }
            None => quote! {
                if tag == #expect {
                    #assign
                    continue;
                }
            },
        };
        Ok(quote! {
            Self::#key => {
                #clear
                #body
            }
        })
    }
}

fn ident(text: &str) -> Result<Ident, GenError> {
    syn::parse_str::<Ident>(text).map_err(|_| GenError::InvalidIdentifier(text.to_owned()))
}

fn rust_type(text: &str) -> Result<Type, GenError> {
    Ok(syn::parse_str::<Type>(text)?)
}

fn tag_path(tag: DataTypeTag) -> TokenStream {
    let variant = format_ident!("{tag:?}");
    quote!(::arow_wire::DataTypeTag::#variant)
}

/// `KEY_<MEMBER>` for every wire field, with camelCase split on case changes.
fn key_consts(plan: &RecordPlan) -> Result<Vec<Ident>, GenError> {
    let mut seen = BTreeSet::new();
    plan.fields()
        .iter()
        .map(|f| {
            let name = format!("KEY_{}", screaming(&f.member));
            if !seen.insert(name.clone()) {
                return Err(GenError::Argument(format!(
                    "{}: members map to the same constant `{name}`",
                    plan.path
                )));
            }
            ident(&name)
        })
        .collect()
}

fn screaming(member: &str) -> String {
    let mut out = String::with_capacity(member.len() + 4);
    let mut prev_lower = false;
    for ch in member.chars() {
        if ch.is_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        out.extend(ch.to_uppercase());
    }
    out
}
