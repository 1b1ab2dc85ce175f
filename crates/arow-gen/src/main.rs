// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `arow-gen` command line: generate serializer cores, decode payloads, list wire keys.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use arow_gen::{generate, ir, DynamicCodec, GeneratorConfig, PlanSet, SchemaSet, Segregation};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "arow-gen", author, version, about = "Arow serializer code generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render serializer cores for every record in a schema
    Generate {
        /// Schema IR (JSON)
        #[arg(long)]
        schema: PathBuf,
        /// Existing output directory; overrides `root_path` from the config file
        #[arg(long)]
        root: Option<PathBuf>,
        /// File grouping policy; overrides the config file
        #[arg(long, value_enum)]
        segregation: Option<Segregation>,
        /// Rust path record types live under (e.g. `crate::model`); overrides the config file
        #[arg(long)]
        type_root: Option<String>,
        /// Generator config (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Decode a serialized record and print it as JSON
    Decode {
        /// Schema IR (JSON)
        #[arg(long)]
        schema: PathBuf,
        /// Qualified record name, e.g. `shop::Order`
        #[arg(long)]
        record: String,
        /// File holding one serialized record
        file: PathBuf,
    },
    /// List the wire key of every participating field
    Keys {
        /// Schema IR (JSON)
        #[arg(long)]
        schema: PathBuf,
    },
}

fn load_schema(path: &Path) -> Result<SchemaSet> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    ir::load_schema(&text).with_context(|| format!("invalid schema {}", path.display()))
}

fn resolve_config(
    config: Option<&Path>,
    root: Option<PathBuf>,
    segregation: Option<Segregation>,
    type_root: Option<String>,
) -> Result<GeneratorConfig> {
    let base = match config {
        Some(path) => Some(
            GeneratorConfig::load(path)?
                .with_context(|| format!("config file {} is missing or empty", path.display()))?,
        ),
        None => None,
    };
    let mut resolved = match (base, root) {
        (Some(mut cfg), Some(root)) => {
            cfg.root_path = root;
            cfg
        }
        (Some(cfg), None) => cfg,
        (None, Some(root)) => GeneratorConfig::new(root),
        (None, None) => bail!("no output root: pass --root or a config with root_path"),
    };
    if let Some(segregation) = segregation {
        resolved.segregation = segregation;
    }
    if let Some(type_root) = type_root {
        resolved.type_root = type_root;
    }
    Ok(resolved)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut out = io::stdout().lock();
    match cli.command {
        Commands::Generate {
            schema,
            root,
            segregation,
            type_root,
            config,
        } => {
            let set = load_schema(&schema)?;
            let config = resolve_config(config.as_deref(), root, segregation, type_root)?;
            let report = generate(&set, &config).context("generation failed")?;
            for file in &report.files {
                writeln!(out, "{}", config.root_path.join(file).display())?;
            }
        }
        Commands::Decode {
            schema,
            record,
            file,
        } => {
            let set = load_schema(&schema)?;
            let plans = PlanSet::build(&set)?;
            let Some(plan) = plans.by_name(&record) else {
                bail!("record `{record}` is not in {}", schema.display());
            };
            let bytes =
                fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
            let row = DynamicCodec::new(&plans)
                .decode(plan, &bytes)
                .with_context(|| format!("failed to decode {} as {record}", file.display()))?;
            serde_json::to_writer_pretty(&mut out, &row.to_json())?;
            writeln!(out)?;
        }
        Commands::Keys { schema } => {
            let set = load_schema(&schema)?;
            let plans = PlanSet::build(&set)?;
            for plan in plans.plans() {
                for field in plan.fields() {
                    writeln!(
                        out,
                        "{}.{}\t{}\t{:#018x}",
                        plan.path, field.member, field.backend, field.key.0
                    )?;
                }
            }
        }
    }
    out.flush()?;
    Ok(())
}
