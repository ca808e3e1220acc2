//! Schema Catalog CLI
//!
//! Lists, validates, composes and exports schemas from a catalog root.

use std::fs;
use std::path::PathBuf;
use std::process::exit;

use clap::{Parser, Subcommand};
use rsfulmen::config::FulmenConfig;
use rsfulmen::schema::{
    self, discover_root, export, validate_exported_schema, validate_schema_bytes, ExportContext, ExportFormat,
    ExportOptions, Identity, ProvenanceStyle, SchemaCatalog,
};
use rsfulmen::Diagnostic;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-catalog")]
#[command(about = "Inspect, validate and export schemas from a Fulmen catalog")]
struct Cli {
    /// Catalog root (defaults to configuration, then ancestor search)
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Explicit configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List schema identifiers
    List {
        /// Only identifiers starting with this prefix
        #[arg(default_value = "")]
        prefix: String,
        /// Print descriptors as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a schema's descriptor and canonical document
    Show {
        id: String,
    },

    /// Validate a data file against a catalog schema
    Validate {
        id: String,
        file: PathBuf,
    },

    /// Check schema documents against their metaschema
    Check {
        /// Catalog identifiers; all schemas when omitted
        ids: Vec<String>,
        /// Check a schema file outside the catalog instead
        #[arg(long, conflicts_with = "ids")]
        file: Option<PathBuf>,
    },

    /// Structural diff between two schema files
    Diff {
        left: PathBuf,
        right: PathBuf,
    },

    /// Deep-merge overlays onto a base document
    Merge {
        base: PathBuf,
        overlays: Vec<PathBuf>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export a schema with provenance
    Export {
        id: String,
        out: PathBuf,
        #[arg(long)]
        format: Option<ExportFormat>,
        #[arg(long)]
        provenance_style: Option<ProvenanceStyle>,
        /// Omit provenance entirely
        #[arg(long)]
        no_provenance: bool,
        #[arg(long)]
        overwrite: bool,
        /// Skip metaschema validation before writing
        #[arg(long)]
        no_validate: bool,
        /// Consumer identity as VENDOR/BINARY
        #[arg(long)]
        identity: Option<String>,
    },

    /// Confirm an exported file still matches its catalog source
    VerifyExport {
        id: String,
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            exit(2);
        }
    }
}

/// Returns `Ok(false)` when the command ran but found problems
fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let config = FulmenConfig::load_from(cli.config.as_deref())?;
    let root = cli.root.clone().unwrap_or_else(|| discover_root(&config));
    let catalog = SchemaCatalog::new(root).with_vendor_domain(config.schemas.vendor_domain.clone());

    match cli.command {
        Commands::List { prefix, json } => {
            let schemas = catalog.list_schemas(&prefix)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&schemas)?);
            } else {
                for d in &schemas {
                    println!("{}  {}", d.id, d.title.as_deref().unwrap_or("-"));
                }
                println!();
                println!("{} schema(s) under {}", schemas.len(), catalog.root().display());
            }
            Ok(true)
        }

        Commands::Show { id } => {
            let descriptor = catalog.get_schema(&id)?;
            println!("id:        {}", descriptor.id);
            println!("path:      {}", descriptor.path.display());
            println!("draft:     {}", descriptor.draft.as_deref().unwrap_or("(default)"));
            println!("format:    {:?}", descriptor.format);
            println!("checksum:  {}", descriptor.checksum);
            println!();
            let value = catalog.schema_value(&id)?;
            println!("{}", serde_json::to_string_pretty(value.as_ref())?);
            Ok(true)
        }

        Commands::Validate { id, file } => {
            let diagnostics = catalog.validate_file_by_id(&id, &file)?;
            Ok(report(&format!("{} against {}", file.display(), id), &diagnostics))
        }

        Commands::Check { ids, file } => {
            if let Some(file) = file {
                let bytes = fs::read(&file)?;
                let diagnostics = validate_schema_bytes(&bytes)?;
                return Ok(report(&file.display().to_string(), &diagnostics));
            }

            let ids: Vec<String> = if ids.is_empty() {
                catalog.list_schemas("")?.into_iter().map(|d| d.id.clone()).collect()
            } else {
                ids
            };
            let mut clean = true;
            for id in &ids {
                let diagnostics = catalog.validate_schema_by_id(id)?;
                clean &= report(id, &diagnostics);
            }
            Ok(clean)
        }

        Commands::Diff { left, right } => {
            let entries = schema::diff(&fs::read(&left)?, &fs::read(&right)?)?;
            if entries.is_empty() {
                println!("✅ No differences");
                return Ok(true);
            }
            for entry in &entries {
                println!("{}", entry);
            }
            Ok(false)
        }

        Commands::Merge { base, overlays, output } => {
            let base = fs::read(&base)?;
            let overlays = overlays.iter().map(fs::read).collect::<Result<Vec<_>, _>>()?;
            let refs: Vec<&[u8]> = overlays.iter().map(Vec::as_slice).collect();
            let merged = schema::merge(&base, &refs)?;
            let value: serde_json::Value = serde_json::from_slice(&merged)?;
            let pretty = serde_json::to_string_pretty(&value)? + "\n";
            match output {
                Some(path) => {
                    fs::write(&path, pretty)?;
                    println!("✅ Wrote {}", path.display());
                }
                None => print!("{}", pretty),
            }
            Ok(true)
        }

        Commands::Export {
            id,
            out,
            format,
            provenance_style,
            no_provenance,
            overwrite,
            no_validate,
            identity,
        } => {
            let mut options = ExportOptions::new(id, out);
            options.format = format.unwrap_or(config.export.format);
            options.provenance_style = provenance_style.unwrap_or(config.export.provenance_style);
            options.include_provenance = !no_provenance;
            options.overwrite = overwrite || config.export.overwrite;
            options.validate_schema = !no_validate && config.export.validate_schema;
            if let Some(identity) = identity {
                let (vendor, binary) = identity
                    .split_once('/')
                    .ok_or("identity must be VENDOR/BINARY")?;
                options.identity_provider = Some(std::sync::Arc::new(Identity {
                    vendor: vendor.to_string(),
                    binary: binary.to_string(),
                }));
            }

            let result = export(&catalog, &ExportContext::new(), &options)?;
            println!("✅ Exported {} to {} ({:?})", options.schema_id, result.path.display(), result.format);
            Ok(true)
        }

        Commands::VerifyExport { id, file } => {
            validate_exported_schema(&catalog, &id, &file)?;
            println!("✅ {} matches {}", file.display(), id);
            Ok(true)
        }
    }
}

fn report(subject: &str, diagnostics: &[Diagnostic]) -> bool {
    if diagnostics.is_empty() {
        println!("✅ {} - valid", subject);
        return true;
    }
    let errors = schema::has_errors(diagnostics);
    println!("{} {} - {} finding(s)", if errors { "❌" } else { "⚠️ " }, subject, diagnostics.len());
    for d in diagnostics {
        println!("   └─ {}", d);
    }
    !errors
}
