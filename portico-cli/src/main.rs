//! Portico — nginx reverse-proxy configuration from endpoint definitions.
//!
//! # Usage
//!
//! ```text
//! portico                      supervise nginx: clean, start, configure, renew
//! portico build                render vhosts and the certificate script
//! portico reload               build, run the certificate script, reload nginx
//! portico dry-run              build, then log the reload commands without running them
//! portico clean                remove every managed vhost file
//! portico wait-port            wait until the HTTP port accepts connections
//! portico get <domain|email>…  request a certificate right away
//! portico diff                 show what `build` would change
//! portico list [--json]        show the loaded endpoints
//! ```

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    build::BuildArgs, clean::CleanArgs, diff::DiffArgs, get::GetArgs, list::ListArgs,
    reload::ReloadArgs, wait_port::WaitPortArgs,
};
use config::ConfigArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "portico",
    version,
    about = "Generate nginx reverse-proxy configs from endpoint definitions and keep them live",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Omit to run nginx under supervision.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render managed vhosts and the certificate script.
    Build(BuildArgs),

    /// Wait until the HTTP port accepts connections.
    WaitPort(WaitPortArgs),

    /// Remove every managed vhost file.
    Clean(CleanArgs),

    /// Request a certificate for the given domains (arguments with `@` are emails).
    Get(GetArgs),

    /// Build, run the certificate script, then validate and reload nginx.
    Reload(ReloadArgs),

    /// Build, then log the reload sequence without running any command.
    DryRun(ReloadArgs),

    /// Show a unified diff of what `build` would write.
    Diff(DiffArgs),

    /// List the loaded endpoint definitions.
    List(ListArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    portico_supervisor::init_tracing();

    let settings = cli.config.settings();
    match cli.command {
        None => commands::supervise::run(settings),
        Some(Commands::Build(args)) => args.run(&settings),
        Some(Commands::WaitPort(args)) => args.run(&settings),
        Some(Commands::Clean(args)) => args.run(&settings),
        Some(Commands::Get(args)) => args.run(&settings),
        Some(Commands::Reload(args)) => args.run(&settings, false),
        Some(Commands::DryRun(args)) => args.run(&settings, true),
        Some(Commands::Diff(args)) => args.run(&settings),
        Some(Commands::List(args)) => args.run(&settings),
    }
}
