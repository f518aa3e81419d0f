//! Portal CLI - sign in and call the Portal API from the terminal.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use portal_config_and_utils::{init_logging_for_service, Paths};
use tracing::debug;

#[derive(Parser)]
#[command(name = "portal")]
#[command(author, version, about = "Portal command-line client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Override the API base URL from the config file
    #[arg(long, global = true)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        /// Account email; prompted for when omitted
        #[arg(long)]
        email: Option<String>,
    },

    /// Create an account and sign in
    Register {
        /// Display name; prompted for when omitted
        #[arg(long)]
        name: Option<String>,
        /// Account email; prompted for when omitted
        #[arg(long)]
        email: Option<String>,
    },

    /// Sign out and clear the stored session
    Logout,

    /// Show the stored session
    Status,

    /// Send an authenticated GET request to an API path
    Get {
        /// Path relative to the API base URL, e.g. /projects
        path: String,
    },
}

async fn run(cli: Cli, paths: Paths) -> anyhow::Result<()> {
    let ctx = commands::Context::build(&paths, cli.api_url, cli.format)?;

    match cli.command {
        Commands::Login { email } => commands::login(&ctx, email).await,
        Commands::Register { name, email } => commands::register(&ctx, name, email).await,
        Commands::Logout => commands::logout(&ctx).await,
        Commands::Status => commands::status(&ctx).await,
        Commands::Get { path } => commands::get(&ctx, &path).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let paths = match Paths::new() {
        Ok(paths) => paths,
        Err(e) => {
            output::print_error(&e.to_string(), cli.format);
            std::process::exit(1);
        }
    };

    init_logging_for_service("portal-cli", &cli.log_level, &paths);
    debug!(base_dir = %paths.base_dir().display(), "Starting portal CLI");

    let format = cli.format;
    if let Err(e) = run(cli, paths).await {
        output::print_error(&e.to_string(), format);
        std::process::exit(1);
    }
}
