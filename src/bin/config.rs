//! Remap Config CLI
//!
//! View and manage schema remapping configuration.

use clap::{Parser, Subcommand};
use schema_remap::RemapConfig;

#[derive(Parser)]
#[command(name = "remap-config")]
#[command(about = "View and manage schema remapping configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current configuration
    Show {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new config file
    Init {
        /// Output path (default: remap.toml)
        #[arg(short, long, default_value = "remap.toml")]
        output: String,
    },

    /// Validate configuration
    Validate {
        /// Config file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Show { config, toml, json } => {
            let cfg = RemapConfig::load_from(config.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else if toml {
                println!("{}", ::toml::to_string_pretty(&cfg)?);
            } else {
                println!("📋 Schema Remap Configuration\n");
                println!("Catalog:");
                println!("  Path: {:?}", cfg.catalog.path);
                println!("  Pretty: {}", cfg.catalog.pretty);

                println!("\nConversion:");
                println!("  On record error: {:?}", cfg.conversion.on_record_error);

                println!("\nLogging:");
                println!("  Filter: {}", cfg.logging.filter);
            }
        }

        Commands::Init { output } => {
            let cfg = RemapConfig::default();
            cfg.save(&output)?;
            println!("✅ Created config file: {}", output);
        }

        Commands::Validate { config } => match RemapConfig::load_from(config.as_deref()) {
            Ok(cfg) => {
                println!("✅ Configuration is valid");
                println!("   Catalog: {:?}", cfg.catalog_path());
                println!("   On record error: {:?}", cfg.conversion.on_record_error);
            }
            Err(e) => {
                eprintln!("❌ Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
