mod keygen;
mod logging;
mod serve;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

/// LILIT astrological API server.
#[derive(Parser)]
#[command(name = "lilit", version, about = "LILIT astrological API server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Path to TLS certificate PEM file (requires --tls-key)
        #[arg(long)]
        tls_cert: Option<PathBuf>,
        /// Path to TLS private key PEM file (requires --tls-cert)
        #[arg(long)]
        tls_key: Option<PathBuf>,
    },

    /// Print a freshly generated API key
    Keygen {
        /// Number of characters in the key
        #[arg(long, default_value = "50", value_parser = clap::value_parser!(u16).range(1..))]
        length: u16,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            host,
            tls_cert,
            tls_key,
        } => {
            logging::init();
            // Validate TLS flags: both must be provided or neither
            if tls_cert.is_some() != tls_key.is_some() {
                tracing::error!("--tls-cert and --tls-key must both be provided");
                process::exit(1);
            }
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!(error = %e, "failed to create tokio runtime");
                    process::exit(1);
                }
            };
            let options = serve::ServeOptions {
                host,
                port,
                tls_cert,
                tls_key,
            };
            if let Err(e) = rt.block_on(serve::start_server(options)) {
                tracing::error!(error = %e, "server error");
                process::exit(1);
            }
        }
        Commands::Keygen { length } => {
            println!("{}", keygen::generate_key(usize::from(length)));
        }
    }
}
