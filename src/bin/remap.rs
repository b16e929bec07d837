//! Schema Remap CLI
//!
//! Inspects schemas in a catalog, previews field mappings and converts records
//! from one schema to another.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use schema_remap::{
    Catalog, ConversionReport, ConversionSession, FieldDescriptor, MappingState, RecordStore,
    RemapConfig, SchemaId, SchemaIntrospector, SchemaMapping, SchemaRegistry,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-remap")]
#[command(about = "Map fields between schemas and convert records")]
struct Cli {
    /// Config file to load (optional)
    #[arg(short, long)]
    config: Option<String>,

    /// Catalog file (overrides the configured path)
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every schema in the catalog
    Schemas,

    /// Show the fields a schema declares
    Describe {
        schema: String,
    },

    /// List records bound to a schema
    Records {
        schema: String,
    },

    /// Preview the field mapping between two schemas
    Plan {
        #[command(flatten)]
        mapping: MappingArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert every record bound to the source schema
    Convert {
        #[command(flatten)]
        mapping: MappingArgs,

        /// Write the converted catalog here instead of in place
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show what would be converted without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(clap::Args)]
struct MappingArgs {
    /// Source schema
    source: String,

    /// Target schema
    target: String,

    /// Override a field mapping (source_field=target_field)
    #[arg(long = "map", value_name = "SRC=DST")]
    overrides: Vec<String>,

    /// Leave a source field unmapped
    #[arg(long = "unmap", value_name = "SRC")]
    unmapped: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    let config = match RemapConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(cli, config) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: RemapConfig) -> anyhow::Result<()> {
    let catalog_path = cli.catalog.clone().unwrap_or_else(|| config.catalog_path());
    let catalog = Catalog::load(&catalog_path)
        .with_context(|| format!("loading catalog {}", catalog_path.display()))?;
    let (registry, mut store) = catalog.into_parts()?;
    let introspector = SchemaIntrospector::new(&*registry);

    match cli.command {
        Commands::Schemas => {
            for id in registry.list_all_schema_ids() {
                let records = store.find_by_bound_schema(&id).len();
                println!("{} ({} records)", id, records);
            }
        }

        Commands::Describe { schema } => {
            let schema = SchemaId::from(schema);
            println!("📋 {}", schema);
            for field in introspector.describe(&schema)? {
                println!("  {:<24} {}", field.name, field.field_type);
            }
            println!("  fingerprint: {}", introspector.fingerprint(&schema)?.short());
        }

        Commands::Records { schema } => {
            let records = store.find_by_bound_schema(&SchemaId::from(schema.as_str()));
            println!("{} records bound to {}", records.len(), schema);
            for record in records {
                println!("  {}", record);
            }
        }

        Commands::Plan { mapping, json } => {
            let plan = build_mapping(&introspector, &mapping)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan.entries())?);
            } else {
                print_mapping(&plan);
            }
        }

        Commands::Convert {
            mapping,
            output,
            dry_run,
        } => {
            let source = SchemaId::from(mapping.source.as_str());
            let mut session =
                ConversionSession::open(&introspector, [source.clone()], config.executor())?;
            *session.mapping_mut(&source)? = build_mapping(&introspector, &mapping)?;

            let plan = session.mapping(&source)?;
            print_mapping(plan);
            if plan.is_identity() {
                println!("⚠️  Target is the source schema, nothing to convert");
                return Ok(());
            }

            let affected = session.affected_records(&source, &store)?;
            if dry_run {
                println!("\n🔍 Dry run: {} records would be converted", affected.len());
                for record in &affected {
                    println!("  {}", record);
                }
                return Ok(());
            }

            let report = session.convert(&source, &introspector, &mut store)?;
            print_report(&report);

            let path = output.unwrap_or(catalog_path);
            Catalog::from_store(&store).save(&path, config.catalog.pretty)?;
            println!("✅ Catalog written to {}", path.display());

            if !report.is_clean() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Assign the target and apply command-line overrides
fn build_mapping(
    introspector: &SchemaIntrospector<'_>,
    args: &MappingArgs,
) -> anyhow::Result<SchemaMapping> {
    let mut mapping = SchemaMapping::new(introspector, SchemaId::from(args.source.as_str()))?;
    mapping.assign_target(introspector, SchemaId::from(args.target.as_str()))?;

    for name in &args.unmapped {
        let source = source_field(&mapping, name)?;
        mapping.set_override(&source, None)?;
    }

    for spec in &args.overrides {
        let (src, dst) = spec
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid override '{}', expected SRC=DST", spec))?;
        let source = source_field(&mapping, src)?;
        let target = mapping
            .candidates(&source)
            .iter()
            .find(|f| f.name == dst)
            .cloned()
            .ok_or_else(|| anyhow!("no {} field '{}' in {}", source.field_type, dst, args.target))?;
        mapping.set_override(&source, Some(&target))?;
    }

    Ok(mapping)
}

fn source_field(mapping: &SchemaMapping, name: &str) -> anyhow::Result<FieldDescriptor> {
    match mapping.source_fields().iter().find(|f| f.name == name) {
        Some(field) => Ok(field.clone()),
        None => bail!("no field '{}' in {}", name, mapping.source_schema()),
    }
}

fn print_mapping(mapping: &SchemaMapping) {
    let target = match (mapping.state(), mapping.target_schema()) {
        (MappingState::TargetAssigned, Some(t)) => t.to_string(),
        _ => "(none)".to_string(),
    };
    println!("🔀 {} -> {}", mapping.source_schema(), target);
    for entry in mapping.entries() {
        let arrow = match (&entry.target, entry.candidates) {
            (Some(t), _) => t.name.clone(),
            (None, 0) => format!("no {} fields", entry.source.value_kind()),
            (None, _) => "None".to_string(),
        };
        println!("  {:<24} -> {}", entry.source.name, arrow);
    }
}

fn print_report(report: &ConversionReport) {
    println!();
    println!(
        "✅ Converted {}/{} records ({} -> {})",
        report.converted.len(),
        report.total(),
        report.source_schema,
        report.target_schema
    );
    for failure in &report.failures {
        println!("  ❌ {} [{:?}] {}", failure.record, failure.phase, failure.error);
    }
    if report.aborted {
        println!("  ⚠️  Aborted, {} records not attempted", report.not_attempted.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_remap::{FieldType, InMemoryRegistry, SchemaDefinition};

    fn registry() -> InMemoryRegistry {
        InMemoryRegistry::from_definitions([
            SchemaDefinition::new("A")
                .field("color", FieldType::Color)
                .field("gloss", FieldType::Range),
            SchemaDefinition::new("B")
                .field("color", FieldType::Color)
                .field("tint", FieldType::Color)
                .field("gloss", FieldType::Scalar),
        ])
        .unwrap()
    }

    fn args(overrides: &[&str], unmapped: &[&str]) -> MappingArgs {
        MappingArgs {
            source: "A".to_string(),
            target: "B".to_string(),
            overrides: overrides.iter().map(|s| s.to_string()).collect(),
            unmapped: unmapped.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_build_mapping_applies_overrides() {
        let registry = registry();
        let introspector = SchemaIntrospector::new(&registry);
        let mapping = build_mapping(&introspector, &args(&["color=tint"], &["gloss"])).unwrap();

        let color = FieldDescriptor::new("color", FieldType::Color);
        let gloss = FieldDescriptor::new("gloss", FieldType::Range);
        assert_eq!(
            mapping.mapped(&color),
            Some(&FieldDescriptor::new("tint", FieldType::Color))
        );
        assert!(mapping.mapped(&gloss).is_none());
    }

    #[test]
    fn test_build_mapping_without_edits_auto_matches() {
        let registry = registry();
        let introspector = SchemaIntrospector::new(&registry);
        let mapping = build_mapping(&introspector, &args(&[], &[])).unwrap();

        assert_eq!(mapping.mapped_count(), 2);
        assert!(mapping.unmapped_fields().is_empty());
    }

    #[test]
    fn test_build_mapping_rejects_bad_edits() {
        let registry = registry();
        let introspector = SchemaIntrospector::new(&registry);

        // Missing separator
        assert!(build_mapping(&introspector, &args(&["color"], &[])).is_err());
        // Unknown source field
        assert!(build_mapping(&introspector, &args(&["shine=tint"], &[])).is_err());
        assert!(build_mapping(&introspector, &args(&[], &["shine"])).is_err());
        // Target field of another kind
        assert!(build_mapping(&introspector, &args(&["color=gloss"], &[])).is_err());
        // Unknown target schema
        let mut unknown = args(&[], &[]);
        unknown.target = "C".to_string();
        assert!(build_mapping(&introspector, &unknown).is_err());
    }
}
