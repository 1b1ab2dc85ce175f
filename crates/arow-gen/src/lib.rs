// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Arow serializer code generator.
//!
//! Reads record schemas (usually from the JSON IR in [`ir`]), classifies every field,
//! builds one plan per record, and renders a `TypeSerializationCore` implementation per
//! record that links against `arow-wire`. Output is grouped into files by a
//! [`Segregation`] policy and written through an [`OutputSink`].
//!
//! ```no_run
//! use arow_gen::{generate, ir, GeneratorConfig, Segregation};
//!
//! # fn main() -> Result<(), arow_gen::GenError> {
//! let schema = ir::load_schema(&std::fs::read_to_string("schema.json").unwrap_or_default())?;
//! let config = GeneratorConfig::new("src/generated").with_segregation(Segregation::AllInOne);
//! let report = generate(&schema, &config)?;
//! assert_eq!(report.records, schema.records().len());
//! # Ok(())
//! # }
//! ```

pub mod assemble;
pub mod classify;
pub mod config;
pub mod deserializer;
pub mod dynamic;
pub mod error;
pub mod ir;
pub mod plan;
pub mod render;
pub mod schema;
pub mod serializer;
pub mod types;

use std::path::PathBuf;

use tracing::{debug, info};

pub use assemble::{Assembler, FsSink, MemorySink, OutputSink, OutputUnit, Segregation};
pub use classify::{FieldKind, TypePath, WireField};
pub use config::GeneratorConfig;
pub use dynamic::{DynamicCodec, DynamicRow, DynamicValue};
pub use error::GenError;
pub use plan::{PlanSet, RecordPlan};
pub use render::{GeneratedUnit, Renderer};
pub use schema::{EnumSchema, FieldDef, Namespace, RecordSchema, SchemaSet};

/// Summary of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Records rendered.
    pub records: usize,
    /// Files written, relative to the output root, in flush order.
    pub files: Vec<PathBuf>,
}

/// Generate into `config.root_path`, which must already exist.
pub fn generate(
    schema: &SchemaSet,
    config: &GeneratorConfig,
) -> Result<GenerationReport, GenError> {
    if !config.root_path.is_dir() {
        return Err(GenError::PathNotFound(config.root_path.clone()));
    }
    let mut sink = FsSink::new(&config.root_path);
    generate_to(schema, config, &mut sink)
}

/// Generate into any sink. `config.root_path` is not consulted.
///
/// Every record is planned and rendered before the first file is flushed, so an invalid
/// schema never leaves partial output behind.
pub fn generate_to<S: OutputSink + ?Sized>(
    schema: &SchemaSet,
    config: &GeneratorConfig,
    sink: &mut S,
) -> Result<GenerationReport, GenError> {
    let renderer = Renderer::new(&config.type_root)?;
    let plans = PlanSet::build(schema)?;

    let mut ordered: Vec<&RecordPlan> = plans.plans().iter().collect();
    ordered.sort_by(|a, b| a.path.namespace.cmp(&b.path.namespace));
    let units = ordered
        .into_iter()
        .map(|plan| renderer.render(plan))
        .collect::<Result<Vec<_>, GenError>>()?;
    debug!(records = units.len(), policy = ?config.segregation, "rendered records");

    assemble::check_file_names(config.segregation, &units)?;

    let records = units.len();
    let mut assembler = Assembler::new(config.segregation, sink);
    for unit in units {
        assembler.push(unit)?;
    }
    let files = assembler.finish()?;
    info!(records, files = files.len(), "generation complete");
    Ok(GenerationReport { records, files })
}
