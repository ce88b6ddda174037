//! CLI tool for struct declaration files.
//!
//! Provides commands for:
//! - Checking that every declared struct compiles
//! - Inspecting compiled schemas (field order, shapes, packed offsets)
//! - Running generated constructors on JSON arguments

mod cli;

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context};
use clap::Parser;
use cstruct_core::compiler::SchemaSummary;
use cstruct_core::declaration::load_declarations_file;
use cstruct_core::types::{BaseKind, FieldType, Value};
use cstruct_core::SchemaRegistry;
use tracing::Level;

use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let output = run(cli.command)?;
    print!("{}", output);
    Ok(())
}

fn run(command: Commands) -> anyhow::Result<String> {
    match command {
        Commands::Check { file } => check(&file),
        Commands::Inspect {
            file,
            structure,
            json,
        } => inspect(&file, structure.as_deref(), json),
        Commands::Construct {
            file,
            structure,
            args,
        } => construct(&file, &structure, &args),
    }
}

fn load(file: &Path) -> anyhow::Result<SchemaRegistry> {
    let registry = load_declarations_file(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    tracing::debug!("Loaded {} structs from {}", registry.len(), file.display());
    Ok(registry)
}

fn check(file: &Path) -> anyhow::Result<String> {
    let registry = load(file)?;
    let schemas = registry.compile_all()?;
    Ok(format!("ok: {} structs\n", schemas.len()))
}

fn inspect(file: &Path, structure: Option<&str>, json: bool) -> anyhow::Result<String> {
    let registry = load(file)?;
    let names = match structure {
        Some(name) => {
            if !registry.contains(name) {
                bail!("Struct '{}' not found in {}", name, file.display());
            }
            vec![name.to_string()]
        }
        None => registry.names(),
    };

    let summaries = names
        .iter()
        .map(|name| registry.compile(name).map(|schema| schema.summary()))
        .collect::<Result<Vec<_>, _>>()?;

    if json {
        let mut text = serde_json::to_string_pretty(&summaries)?;
        text.push('\n');
        return Ok(text);
    }

    let mut text = String::new();
    for summary in &summaries {
        render_summary(&mut text, summary)?;
    }
    Ok(text)
}

fn render_summary(out: &mut String, summary: &SchemaSummary) -> std::fmt::Result {
    let layout = &summary.layout;
    writeln!(out, "struct {} (fingerprint {})", summary.name, summary.fingerprint)?;
    writeln!(
        out,
        "  layout: endianness={} alignment={} packed={} serialize={} deserialize={}",
        layout.endianness, layout.alignment, layout.packed, layout.serialize, layout.deserialize
    )?;
    for field in &summary.fields {
        writeln!(
            out,
            "  {:>6}  {}: {}{}",
            optional(field.packed_offset),
            field.name,
            field.type_name,
            if field.is_const { " (const)" } else { "" }
        )?;
    }
    writeln!(out, "  packed size: {}", optional(summary.packed_size))
}

fn optional(value: Option<usize>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

fn construct(file: &Path, structure: &str, args: &str) -> anyhow::Result<String> {
    let registry = load(file)?;
    registry.compile(structure)?;
    let handle = registry
        .get(structure)
        .with_context(|| format!("Struct '{}' not found", structure))?;

    let args: serde_json::Value =
        serde_json::from_str(args).context("Arguments must be a JSON array")?;
    if !args.is_array() {
        bail!("Arguments must be a JSON array, got {}", args);
    }

    let value = Value::from_json(&FieldType::Base(BaseKind::Struct(handle)), &args)?;
    Ok(format!("{}\n", value))
}
