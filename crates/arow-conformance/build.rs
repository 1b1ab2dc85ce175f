// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Renders serializer cores for `schema/model.json` into `OUT_DIR/arow_types.rs`.

#![allow(clippy::print_stdout)]

use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use arow_gen::{generate, ir, GeneratorConfig, Segregation};

const SCHEMA: &str = "schema/model.json";

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed={SCHEMA}");
    let out_dir = PathBuf::from(env::var("OUT_DIR").context("OUT_DIR not set")?);
    let text = fs::read_to_string(SCHEMA).with_context(|| format!("read {SCHEMA}"))?;
    let schema = ir::load_schema(&text)?;
    let config = GeneratorConfig::new(out_dir)
        .with_segregation(Segregation::AllInOne)
        .with_type_root("crate::model");
    generate(&schema, &config)?;
    Ok(())
}
