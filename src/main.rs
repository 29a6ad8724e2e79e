//! # swapi-explorer CLI (`swx`)
//!
//! Browse Star Wars characters from the terminal.
//!
//! ## Usage
//!
//! ```bash
//! swx --config ./config/swx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `swx login <user> <password>` | Start a session (any non-empty pair) |
//! | `swx logout` | End the session |
//! | `swx whoami` | Show the current user and token expiry |
//! | `swx list` | List a page of characters, optionally searched/filtered |
//! | `swx filters` | List the homeworld, species and film filter options |
//! | `swx show <url>` | Character detail with homeworld |
//! | `swx serve` | Start the JSON HTTP shell |
//!
//! ## Examples
//!
//! ```bash
//! swx login luke secret
//! swx list --page 2
//! swx list --search sky
//! swx list --homeworld https://swapi.dev/api/planets/1/
//! swx show https://swapi.dev/api/people/1/
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use swapi_explorer::commands::{self, ListArgs};
use swapi_explorer::{config, logging, server};

/// swx: browse the Star Wars API character collection.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. A missing file falls back to the built-in defaults. See
/// `config/swx.example.toml` for every setting.
#[derive(Parser)]
#[command(
    name = "swx",
    about = "Browse, search and filter Star Wars characters",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/swx.toml")]
    config: PathBuf,

    /// Log progress to stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a session. Any non-empty username and password is accepted.
    Login { username: String, password: String },

    /// End the session and delete the stored token.
    Logout,

    /// Show the logged-in user and when the token expires.
    Whoami,

    /// List characters.
    ///
    /// Without `--search` or a filter this shows one page of the collection.
    /// With them, the whole collection is fetched and narrowed, and paging
    /// no longer applies.
    List {
        /// 1-based page number.
        #[arg(long, default_value_t = 1)]
        page: u64,

        /// Case-insensitive substring of the character name.
        #[arg(long)]
        search: Option<String>,

        /// Homeworld resource URL.
        #[arg(long)]
        homeworld: Option<String>,

        /// Species resource URL.
        #[arg(long)]
        species: Option<String>,

        /// Film resource URL.
        #[arg(long)]
        film: Option<String>,

        /// Print the browser view as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the filter options derived from the full collection.
    Filters {
        #[arg(long)]
        json: bool,
    },

    /// Show one character by resource URL.
    Show {
        url: String,

        #[arg(long)]
        json: bool,
    },

    /// Start the JSON HTTP shell on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::run_login(&cfg, &username, &password)?;
        }
        Commands::Logout => {
            commands::run_logout(&cfg)?;
        }
        Commands::Whoami => {
            commands::run_whoami(&cfg)?;
        }
        Commands::List {
            page,
            search,
            homeworld,
            species,
            film,
            json,
        } => {
            let args = ListArgs {
                page,
                search,
                selection: commands::selection_from_flags(homeworld, species, film),
                json,
            };
            commands::run_list(&cfg, args).await?;
        }
        Commands::Filters { json } => {
            commands::run_filters(&cfg, json).await?;
        }
        Commands::Show { url, json } => {
            commands::run_show(&cfg, &url, json).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
