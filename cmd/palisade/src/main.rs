//! Palisade CLI - network ACL policy compiler.
//!
//! Commands:
//! - `palisade lint` - Check objects, policies, and devices for problems
//! - `palisade render` - Render device configurations in vendor syntax
//! - `palisade dot` - Print one device's reference graph
//! - `palisade export` - Print the compiled tree as JSON or YAML

use anyhow::Result;
use clap::{Parser, Subcommand};
use palisade_store::SourceConfig;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "palisade")]
#[command(about = "Compiles network access policies into device configurations")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory of host and port object files
    #[arg(long, global = true, default_value = "objects")]
    objects_dir: String,

    /// Directory of policy files
    #[arg(long, global = true, default_value = "policy")]
    policies_dir: String,

    /// Directory of device descriptors
    #[arg(long, global = true, default_value = "devices")]
    devices_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the configuration for problems without writing anything
    Lint {
        /// Report format (text or json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Render device configurations in their vendor's syntax
    Render {
        /// Devices to render, or "all"
        #[arg(default_value = "all")]
        devices: Vec<String>,

        /// Directory for rendered configurations
        #[arg(short, long, default_value = "renders")]
        output_dir: String,
    },

    /// Print one device's reference graph in Graphviz format
    Dot {
        /// Device to graph
        device: String,
    },

    /// Print the compiled tree
    Export {
        /// Output format (json or yaml)
        #[arg(short, long, default_value = "json")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout stays reserved for dot/export payloads
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let sources = SourceConfig::new(&cli.objects_dir, &cli.policies_dir, &cli.devices_dir);

    match cli.command {
        Commands::Lint { format } => commands::lint::run(&sources, &format),
        Commands::Render {
            devices,
            output_dir,
        } => commands::render::run(&sources, &devices, &output_dir),
        Commands::Dot { device } => commands::dot::run(&sources, &device),
        Commands::Export { format } => commands::export::run(&sources, &format),
    }
}
