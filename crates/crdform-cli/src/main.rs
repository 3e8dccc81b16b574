//! crdform CLI - Render Kubernetes custom resources from typed configurations

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod display;
mod error;
mod exit_codes;

use config::{CliConfig, Settings};
use error::Result;

#[derive(Parser)]
#[command(name = "crdform")]
#[command(author = "crdform Contributors")]
#[command(version)]
#[command(about = "Render Kubernetes custom resources from typed configurations", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Configuration file (default: ./crdform.yaml, then the user config dir)
    #[arg(long, global = true, env = "CRDFORM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Register resource types from CRD files or directories
    #[arg(long, global = true, value_name = "PATH")]
    pub crd: Vec<PathBuf>,

    /// Prefix of resource type names
    #[arg(long, global = true, env = "CRDFORM_TYPE_PREFIX")]
    pub type_prefix: Option<String>,

    /// State file
    #[arg(long, global = true, env = "CRDFORM_STATE")]
    pub state: Option<PathBuf>,

    /// Number ids 1, 2, 3... instead of using the clock
    #[arg(long, global = true, env = "CRDFORM_SEQUENTIAL_IDS")]
    pub sequential_ids: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one resource configuration to a manifest
    Render {
        /// Resource type name
        #[arg(value_name = "TYPE")]
        type_name: String,

        /// Configuration file (YAML)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,

        /// Write the manifest to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render every declared resource and record it in the state
    Apply {
        /// Resources file (YAML)
        #[arg(short = 'f', long = "file")]
        file: PathBuf,

        /// Write each manifest to this directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Show the plan without changing the state
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete every resource recorded in the state
    Destroy {
        /// Show what would be deleted without changing the state
        #[arg(long)]
        dry_run: bool,
    },

    /// List registered resource types
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the attribute tree of a resource type
    Schema {
        /// Resource type name
        #[arg(value_name = "TYPE")]
        type_name: String,
    },

    /// Show the resource types generated from CRD files
    ImportCrd {
        /// CRD files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.global.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Log to stderr, filtered by `CRDFORM_LOG` (default `warn`); `--debug` forces `debug`
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("CRDFORM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = CliConfig::load(cli.global.config.as_deref())?;
    let settings = Settings::resolve(config, &cli.global);
    tracing::debug!(?settings, "resolved settings");

    match cli.command {
        Commands::Render {
            type_name,
            file,
            output,
        } => commands::render::run(&settings, &type_name, &file, output.as_deref()),

        Commands::Apply {
            file,
            output_dir,
            dry_run,
        } => commands::apply::run(&settings, &file, output_dir.as_deref(), dry_run),

        Commands::Destroy { dry_run } => commands::destroy::run(&settings, dry_run),

        Commands::List { json } => commands::list::run(&settings, json),

        Commands::Schema { type_name } => commands::schema::run(&settings, &type_name),

        Commands::ImportCrd { paths } => commands::import_crd::run(&settings, &paths),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "crdform",
            "render",
            "k8s_example_com_widget_v1",
            "-f",
            "widget.yaml",
            "--crd",
            "crds",
            "--crd",
            "more.yaml",
            "--sequential-ids",
        ])
        .unwrap();

        assert_eq!(cli.global.crd, [PathBuf::from("crds"), PathBuf::from("more.yaml")]);
        assert!(cli.global.sequential_ids);
        assert!(matches!(cli.command, Commands::Render { .. }));
    }
}
