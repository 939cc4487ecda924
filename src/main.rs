use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use toolmark_rs::api::router;
use toolmark_rs::config::{load_config, AppConfig, ExtractionConfig};
use toolmark_rs::fc::Extractor;
use toolmark_rs::observability::init_tracing;
use toolmark_rs::state::AppState;

/// CLI arguments for toolmark
#[derive(Parser)]
#[command(name = "toolmark")]
#[command(about = "Extract and validate MCP tool-call markup from LLM output")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tool requests found in FILE (or stdin) as JSON
    Extract {
        /// Input file; `-` or omitted reads stdin
        file: Option<PathBuf>,
    },
    /// Run the HTTP service
    Serve {
        /// YAML configuration file
        #[arg(default_value = "config.yaml")]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Extract { file } => run_extract(file.as_deref()),
        Commands::Serve { config } => run_serve(&config),
    }
}

fn run_extract(path: Option<&Path>) {
    init_tracing("WARNING");

    let text = read_input(path).unwrap_or_else(|e| {
        eprintln!("Failed to read input: {e}");
        std::process::exit(1);
    });

    let extractor = Extractor::new(&ExtractionConfig::default().options());
    let requests = extractor.extract(&text).unwrap_or_else(|e| {
        eprintln!("Extraction failed: {e}");
        std::process::exit(1);
    });

    match serde_json::to_string_pretty(&requests) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to encode requests: {e}");
            std::process::exit(1);
        }
    }
}

fn read_input(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path),
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn run_serve(config_path: &Path) {
    let config = load_config(&config_path.to_string_lossy()).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {e}");
        eprintln!("Please copy 'config.example.yaml' to 'config.yaml' and modify as needed.");
        std::process::exit(1);
    });

    init_tracing(&config.features.log_level);
    let runtime = build_runtime();

    runtime.block_on(async move {
        serve(config).await;
    });
}

fn build_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_io()
        .enable_time()
        .build()
        .unwrap_or_else(|e| {
            eprintln!("Failed to initialize Tokio runtime: {e}");
            std::process::exit(1);
        })
}

async fn serve(config: AppConfig) {
    let host = config.server.host.clone();
    let port = config.server.port;
    let state = Arc::new(AppState::new(config));

    tracing::info!(
        "toolmark-rs starting on {}:{} (block tag <{}>)",
        host,
        port,
        state.extractor.markers().tag()
    );

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .unwrap_or_else(|err| {
            eprintln!("Failed to bind to {host}:{port}: {err}");
            std::process::exit(1);
        });

    tracing::info!("toolmark-rs is ready to accept connections");
    if let Err(err) = axum::serve(listener, router(state)).await {
        eprintln!("Server error: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_extract_file_is_optional() {
        let cli = Cli::try_parse_from(["toolmark", "extract"]).unwrap();
        assert!(matches!(cli.command, Commands::Extract { file: None }));

        let cli = Cli::try_parse_from(["toolmark", "extract", "out.txt"]).unwrap();
        let Commands::Extract { file: Some(file) } = cli.command else {
            panic!("expected extract with file");
        };
        assert_eq!(file, PathBuf::from("out.txt"));
    }

    #[test]
    fn test_serve_defaults_config_path() {
        let cli = Cli::try_parse_from(["toolmark", "serve"]).unwrap();
        let Commands::Serve { config } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(config, PathBuf::from("config.yaml"));
    }

    #[test]
    fn test_missing_or_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["toolmark"]).is_err());
        assert!(Cli::try_parse_from(["toolmark", "run"]).is_err());
    }
}
