use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use locality_cascade::config::Config;
use locality_cascade::location::{Directory, LocationError, LocationOption};
use locality_cascade::selector::pick;

/// Locality — province / municipality / barangay lookups for address forms.
///
/// Examples:
///   locality provinces
///   locality municipalities 072200000
///   locality pick --province Cebu --municipality "City of Cebu" --barangay Lahug
///   locality --offline pick --province Benguet --municipality "La Trinidad"
///   locality serve --port 8080
#[derive(Parser)]
#[command(name = "locality", version, about, long_about = None)]
struct Cli {
    /// Offline mode: only use cache and built-in data.
    #[arg(long, global = true)]
    offline: bool,

    /// Base URL of the PSGC directory (overrides LOCALITY_DIRECTORY_URL).
    #[arg(long, global = true)]
    directory_url: Option<String>,

    /// Cache file (overrides LOCALITY_CACHE_PATH).
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all provinces.
    Provinces,

    /// List the cities and municipalities of a province.
    Municipalities {
        /// Province code.
        code: String,
    },

    /// List the barangays of a city or municipality.
    Barangays {
        /// City/municipality code.
        code: String,
    },

    /// Walk the cascade and print the resulting address.
    /// Each level accepts a code or a (fuzzy) name.
    Pick {
        #[arg(long)]
        province: Option<String>,

        #[arg(long)]
        municipality: Option<String>,

        #[arg(long)]
        barangay: Option<String>,
    },

    /// Serve the option lists as JSON over HTTP.
    Serve {
        /// Bind address (overrides LOCALITY_HOST).
        #[arg(long)]
        host: Option<String>,

        /// Port (overrides LOCALITY_PORT).
        #[arg(long, short = 'p')]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if matches!(cli.command, Command::Serve { .. }) { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Configuration ───────────────────────────────────────────

    let mut config = Config::load();
    if cli.offline {
        config.offline = true;
    }
    if let Some(url) = cli.directory_url.clone() {
        config.directory_url = url;
    }
    if let Some(path) = cli.cache.clone() {
        config.cache_path = path;
    }

    let resolver = config.resolver();

    // ── Dispatch ────────────────────────────────────────────────

    match cli.command {
        Command::Provinces => print_options(resolver.provinces().await),
        Command::Municipalities { code } => print_options(resolver.municipalities(&code).await),
        Command::Barangays { code } => print_options(resolver.barangays(&code).await),
        Command::Pick {
            province,
            municipality,
            barangay,
        } => {
            let queries = [province, municipality, barangay];
            let output = pick(resolver, &queries).await.unwrap_or_else(|e| fail(&e.to_string()));
            print_json(&output);
        }
        Command::Serve { host, port } => {
            let host = host.unwrap_or(config.host);
            let port = port.unwrap_or(config.port);
            eprintln!("  Locality server on http://{}:{}  (Ctrl+C to stop)", host, port);
            if let Err(e) = locality_cascade::server::start(Box::new(resolver), &host, port).await {
                fail(&format!("Server error on {}:{}: {}", host, port, e));
            }
        }
    }
}

fn print_options(result: Result<Vec<LocationOption>, LocationError>) {
    match result {
        Ok(options) => print_json(&options),
        Err(e) => fail(&e.to_string()),
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(&format!("cannot serialize output: {}", e)),
    }
}

fn fail(msg: &str) -> ! {
    eprintln!("Error: {}", msg);
    std::process::exit(1);
}
