// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Output assembler: groups generated units into files per segregation policy and hands
//! each finished file to an [`OutputSink`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GenError;
use crate::render::GeneratedUnit;
use crate::schema::Namespace;

/// File name used when one file holds several record types.
pub const SHARED_FILE_STEM: &str = "arow_types";

/// How generated units are split into files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Segregation {
    /// One file per namespace, flushed whenever the namespace changes.
    #[default]
    FilePerNamespace,
    /// One file per record type.
    FilePerType,
    /// Everything in a single file.
    AllInOne,
}

impl Segregation {
    /// Relative path of the file a record of `name` in `namespace` lands in.
    pub fn file_path(self, namespace: &Namespace, name: &str) -> PathBuf {
        match self {
            Self::FilePerType => namespace_dir(namespace).join(format!("{}.rs", snake_case(name))),
            Self::FilePerNamespace => {
                namespace_dir(namespace).join(format!("{SHARED_FILE_STEM}.rs"))
            }
            Self::AllInOne => PathBuf::from(format!("{SHARED_FILE_STEM}.rs")),
        }
    }
}

/// Fail if two records with different names would be written to the same file-per-type
/// path, for example `FooBar` and `Foo_Bar`.
pub fn check_file_names<'a>(
    policy: Segregation,
    units: impl IntoIterator<Item = &'a GeneratedUnit>,
) -> Result<(), GenError> {
    if policy != Segregation::FilePerType {
        return Ok(());
    }
    let mut owners: BTreeMap<PathBuf, String> = BTreeMap::new();
    for unit in units {
        let qualified = unit.namespace.qualify(&unit.name);
        let path = policy.file_path(&unit.namespace, &unit.name);
        if let Some(first) = owners.get(&path) {
            return Err(GenError::Argument(format!(
                "`{first}` and `{qualified}` both map to {}",
                path.display()
            )));
        }
        owners.insert(path, qualified);
    }
    Ok(())
}

/// A finished output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit {
    /// Namespace of the first record in the file.
    pub namespace: Namespace,
    /// Record name for file-per-type output, otherwise the shared stem.
    pub name: String,
    /// Path relative to the output root.
    pub path: PathBuf,
    /// Complete file text.
    pub content: String,
}

/// Destination for finished files.
pub trait OutputSink {
    /// Persist one file. Any error aborts the run.
    fn store(&mut self, unit: &OutputUnit) -> Result<(), GenError>;
}

/// Writes files under a root directory, creating namespace directories as needed.
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    /// Sink rooted at `root`, which must already exist.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl OutputSink for FsSink {
    fn store(&mut self, unit: &OutputUnit) -> Result<(), GenError> {
        let path = self.root.join(&unit.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| GenError::Storage {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, &unit.content).map_err(|source| GenError::Storage {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), bytes = unit.content.len(), "wrote output unit");
        Ok(())
    }
}

/// Keeps files in memory, in flush order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Stored files.
    pub units: Vec<OutputUnit>,
}

impl OutputSink for MemorySink {
    fn store(&mut self, unit: &OutputUnit) -> Result<(), GenError> {
        self.units.push(unit.clone());
        Ok(())
    }
}

#[derive(Default)]
struct ModTree {
    items: Vec<TokenStream>,
    children: BTreeMap<String, ModTree>,
}

impl ModTree {
    fn insert(&mut self, segments: &[String], items: TokenStream) {
        match segments.split_first() {
            None => self.items.push(items),
            Some((head, rest)) => self
                .children
                .entry(head.clone())
                .or_default()
                .insert(rest, items),
        }
    }

    fn tokens(&self) -> TokenStream {
        let items = &self.items;
        let children = self.children.iter().map(|(name, child)| {
            let name = format_ident!("{name}");
            let body = child.tokens();
            quote! {
                pub mod #name {
                    #body
                }
            }
        });
        quote! {
            #(#items)*
            #(#children)*
        }
    }
}

fn header() -> String {
    format!(
        "// Do not modify by hand.\n\
         // This file is auto-generated by arow-gen {}.\n\
         // Regenerate it with `arow-gen generate` after changing the schema.\n\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Directory path of a namespace, one directory per segment.
pub fn namespace_dir(namespace: &Namespace) -> PathBuf {
    namespace.segments().iter().collect()
}

/// `PersonV2` → `person_v2`.
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        out.extend(ch.to_lowercase());
    }
    out
}

/// Buffers generated units and flushes them to a sink according to a policy.
pub struct Assembler<'s, S: OutputSink + ?Sized> {
    policy: Segregation,
    sink: &'s mut S,
    buffer: Vec<GeneratedUnit>,
    flushed: Vec<PathBuf>,
}

impl<'s, S: OutputSink + ?Sized> Assembler<'s, S> {
    /// Empty assembler writing to `sink`.
    pub fn new(policy: Segregation, sink: &'s mut S) -> Self {
        Self {
            policy,
            sink,
            buffer: Vec::new(),
            flushed: Vec::new(),
        }
    }

    /// Add the next unit, flushing first or after as the policy requires.
    pub fn push(&mut self, unit: GeneratedUnit) -> Result<(), GenError> {
        match self.policy {
            Segregation::FilePerType => {
                self.buffer.push(unit);
                self.flush()
            }
            Segregation::FilePerNamespace => {
                let changed = self
                    .buffer
                    .last()
                    .is_some_and(|last| last.namespace != unit.namespace);
                if changed {
                    self.flush()?;
                }
                self.buffer.push(unit);
                Ok(())
            }
            Segregation::AllInOne => {
                self.buffer.push(unit);
                Ok(())
            }
        }
    }

    /// Flush anything still buffered and return the relative paths written, in order.
    pub fn finish(mut self) -> Result<Vec<PathBuf>, GenError> {
        self.flush()?;
        Ok(self.flushed)
    }

    fn flush(&mut self) -> Result<(), GenError> {
        let Some(first) = self.buffer.first() else {
            return Ok(());
        };
        let namespace = first.namespace.clone();
        let name = match self.policy {
            Segregation::FilePerType => first.name.clone(),
            Segregation::FilePerNamespace | Segregation::AllInOne => SHARED_FILE_STEM.to_owned(),
        };
        let path = self.policy.file_path(&namespace, &first.name);
        if self.flushed.contains(&path) {
            return Err(GenError::Argument(format!(
                "`{}` would overwrite {}",
                namespace.qualify(&first.name),
                path.display()
            )));
        }

        let mut tree = ModTree::default();
        let count = self.buffer.len();
        for unit in self.buffer.drain(..) {
            tree.insert(unit.namespace.segments(), unit.tokens);
        }
        let file = syn::parse2::<syn::File>(tree.tokens())?;
        let body = prettyplease::unparse(&file);
        let content = format!("{}{}\n// EOF\n", header(), body.trim_end());

        let unit = OutputUnit {
            namespace,
            name,
            path,
            content,
        };
        debug!(path = %unit.path.display(), records = count, "flushing output unit");
        self.sink.store(&unit)?;
        self.flushed.push(unit.path);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn unit(ns: &str, name: &str) -> GeneratedUnit {
        let ident = format_ident!("{name}ArowCore");
        GeneratedUnit {
            namespace: Namespace::parse(ns).unwrap(),
            name: name.into(),
            tokens: quote! { pub struct #ident; },
        }
    }

    fn run(policy: Segregation, units: &[(&str, &str)]) -> MemorySink {
        let mut sink = MemorySink::default();
        let mut asm = Assembler::new(policy, &mut sink);
        for (ns, name) in units {
            asm.push(unit(ns, name)).unwrap();
        }
        asm.finish().unwrap();
        sink
    }

    const UNITS: &[(&str, &str)] = &[("a", "X"), ("a", "Y"), ("b.c", "Z")];

    #[test]
    fn flush_counts_follow_policy() {
        assert_eq!(run(Segregation::FilePerType, UNITS).units.len(), 3);
        assert_eq!(run(Segregation::FilePerNamespace, UNITS).units.len(), 2);
        assert_eq!(run(Segregation::AllInOne, UNITS).units.len(), 1);
        for policy in [
            Segregation::FilePerType,
            Segregation::FilePerNamespace,
            Segregation::AllInOne,
        ] {
            assert!(run(policy, &[]).units.is_empty());
        }
    }

    #[test]
    fn paths_mirror_namespaces() {
        let per_type: Vec<_> = run(Segregation::FilePerType, &[("a", "PersonV2"), ("", "Root")])
            .units
            .into_iter()
            .map(|u| u.path)
            .collect();
        assert_eq!(
            per_type,
            [PathBuf::from("a/person_v2.rs"), PathBuf::from("root.rs")]
        );

        let per_ns = run(Segregation::FilePerNamespace, UNITS);
        assert_eq!(per_ns.units[1].path, PathBuf::from("b/c/arow_types.rs"));
        assert_eq!(
            run(Segregation::AllInOne, UNITS).units[0].path,
            PathBuf::from("arow_types.rs")
        );
    }

    #[test]
    fn files_are_wrapped_and_marked() {
        let sink = run(Segregation::AllInOne, &[("a", "X"), ("a.b", "Y"), ("", "Z")]);
        let text = &sink.units[0].content;
        assert!(text.starts_with("// Do not modify by hand."));
        assert!(text.ends_with("// EOF\n"));
        let file = syn::parse_file(text).unwrap();
        // `Z` at the root, then a single `a` module holding `X` and `b`.
        assert_eq!(file.items.len(), 2);
        assert!(text.contains("pub mod a {"));
        assert_eq!(text.matches("pub mod a").count(), 1);
        assert!(text.contains("pub mod b {"));
    }

    #[test]
    fn colliding_file_names_are_rejected() {
        let units = [unit("a", "FooBar"), unit("a", "Foo_Bar"), unit("b", "FooBar")];
        let err = check_file_names(Segregation::FilePerType, &units[..2]).unwrap_err();
        let GenError::Argument(message) = err else {
            panic!("unexpected {err:?}");
        };
        assert!(message.contains("a::FooBar"), "{message}");
        assert!(message.contains("a::Foo_Bar"), "{message}");
        check_file_names(Segregation::FilePerType, [&units[0], &units[2]]).unwrap();
        check_file_names(Segregation::FilePerNamespace, &units).unwrap();
    }

    #[test]
    fn assembler_refuses_to_overwrite_a_flushed_file() {
        let mut sink = MemorySink::default();
        {
            let mut asm = Assembler::new(Segregation::FilePerType, &mut sink);
            asm.push(unit("a", "FooBar")).unwrap();
            assert!(matches!(
                asm.push(unit("a", "Foo_Bar")),
                Err(GenError::Argument(_))
            ));
        }
        assert_eq!(sink.units.len(), 1);
    }

    #[test]
    fn output_is_deterministic() {
        let a = run(Segregation::FilePerNamespace, UNITS);
        let b = run(Segregation::FilePerNamespace, UNITS);
        assert_eq!(a.units, b.units);
    }

    #[test]
    fn fs_sink_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FsSink::new(dir.path());
        let mut asm = Assembler::new(Segregation::FilePerType, &mut sink);
        asm.push(unit("x.y", "Deep")).unwrap();
        let written = asm.finish().unwrap();
        assert_eq!(written, [PathBuf::from("x/y/deep.rs")]);
        let text = std::fs::read_to_string(dir.path().join("x/y/deep.rs")).unwrap();
        assert!(text.contains("pub struct DeepArowCore;"));
    }

    #[test]
    fn segregation_names_are_kebab_case() {
        let parsed: Segregation = serde_json::from_str("\"all-in-one\"").unwrap();
        assert_eq!(parsed, Segregation::AllInOne);
        assert_eq!(
            serde_json::to_string(&Segregation::FilePerType).unwrap(),
            "\"file-per-type\""
        );
    }
}
