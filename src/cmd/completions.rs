//! Completions command implementation
//!
//! Handles `h5-audit completions`, which prints a shell completion script.

use std::io::Write;

use clap::{Arg, ArgAction, Command};
use clap_complete::{generate, Shell};

/// Command tree used for completion generation
///
/// Mirrors the CLI definition in the binary.
pub fn command() -> Command {
    Command::new("h5-audit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Static auditor for HTML5 ad creatives")
        .arg(
            Arg::new("no-emoji")
                .long("no-emoji")
                .help("Disable emoji output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("audit")
                .about("Audit unpacked creative directories")
                .arg(Arg::new("paths").num_args(1..).required(true))
                .arg(
                    Arg::new("profile")
                        .long("profile")
                        .short('p')
                        .value_parser(["vendor", "iab"])
                        .action(ArgAction::Append),
                )
                .arg(Arg::new("json").long("json").action(ArgAction::SetTrue))
                .arg(Arg::new("config").long("config").short('c'))
                .arg(Arg::new("runtime").long("runtime"))
                .arg(
                    Arg::new("verbose")
                        .long("verbose")
                        .short('v')
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("checks")
                .about("List registered checks")
                .arg(Arg::new("json").long("json").action(ArgAction::SetTrue)),
        )
        .subcommand(Command::new("init").about("Write a default .h5-audit.toml"))
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(Arg::new("shell").required(true)),
        )
}

/// Print the completion script for `shell` to stdout
///
/// # Examples
///
/// ```bash
/// h5-audit completions bash > /etc/bash_completion.d/h5-audit
/// h5-audit completions zsh > ~/.zfunc/_h5-audit
/// ```
pub fn cmd_completions(shell: Shell) {
    write_completions(shell, &mut std::io::stdout());
}

/// Write the completion script for `shell` into `out`
pub fn write_completions(shell: Shell, out: &mut dyn Write) {
    let mut cmd = command();
    generate(shell, &mut cmd, "h5-audit", out);
}
