use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use h5_audit::cmd;

/// Static auditor for HTML5 ad creatives
///
/// h5-audit checks an unpacked creative against vendor delivery and
/// industry weight specifications: entry document, declared size, asset
/// references, load-phase weight budgets and packaging rules.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Disable emoji output (useful for CI/CD or accessibility)
    #[arg(long, global = true)]
    no_emoji: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit unpacked creative directories
    Audit {
        /// Creative directories
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<PathBuf>,

        /// Profile to check against (repeatable): vendor, iab
        #[arg(short, long = "profile", value_name = "PROFILE")]
        profiles: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Config file (default: .h5-audit.toml in the current directory)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// JSON runtime measurements to merge into the results
        #[arg(long, value_name = "FILE")]
        runtime: Option<PathBuf>,

        /// Show details of passing checks
        #[arg(short, long)]
        verbose: bool,
    },

    /// List registered checks
    Checks {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a default .h5-audit.toml
    Init,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    // Initialize logger (use RUST_LOG env var to control verbosity)
    env_logger::init();

    let cli = Cli::parse();

    // Set console emoji mode based on CLI flag
    if cli.no_emoji {
        std::env::set_var("NO_EMOJI", "1");
    }

    let result = match cli.command {
        Some(Commands::Audit {
            paths,
            profiles,
            json,
            config,
            runtime,
            verbose,
        }) => cmd::cmd_audit(&cmd::AuditOptions {
            paths,
            profiles,
            json,
            config,
            runtime,
            verbose,
        }),
        Some(Commands::Checks { json }) => cmd::audit::load_settings(None, &[])
            .and_then(|settings| cmd::cmd_checks(&settings, json))
            .map(|()| 0),
        Some(Commands::Init) => cmd::cmd_init().map(|()| 0),
        Some(Commands::Completions { shell }) => {
            cmd::cmd_completions(shell);
            Ok(0)
        }
        None => {
            // No subcommand provided, show help
            println!("h5-audit v{}", env!("CARGO_PKG_VERSION"));
            println!("Static auditor for HTML5 ad creatives\n");
            println!("Usage: h5-audit <COMMAND>\n");
            println!("Commands:");
            println!("  audit        Audit unpacked creative directories");
            println!("  checks       List registered checks");
            println!("  init         Write a default .h5-audit.toml");
            println!("  completions  Generate shell completions");
            println!("\nRun 'h5-audit <COMMAND> --help' for more information on a command.");
            Ok(0)
        }
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            use h5_audit::error::ErrorFormatter;
            eprintln!("{}", ErrorFormatter::format(&e));
            process::exit(ErrorFormatter::exit_code(&e));
        }
    }
}
