//! mermaid-render-mcp: MCP server that renders Mermaid diagrams to PNG.
//!
//! Speaks MCP over stdio and shells out to mermaid-cli for the actual
//! rendering. Requires `PUPPETEER_EXECUTABLE_PATH` to point at the browser
//! binary mermaid-cli should drive; the server refuses to start without it.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use mermaid_render_mcp::config;
use mermaid_render_mcp::mcp::server::McpServer;
use mermaid_render_mcp::render::Renderer;

/// MCP server that renders Mermaid diagram text to PNG images.
///
/// Exposes a single `generate_image` tool backed by mermaid-cli (`mmdc`).
#[derive(Parser, Debug)]
#[command(name = "mermaid-render-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
///
/// Logs go to stderr; stdout belongs to the MCP transport.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the mermaid-render-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let cfg = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Startup precondition: the browser binary for mermaid-cli must be
    // known before the transport opens. Checked once, never re-read.
    let browser_path = match config::browser_path_from_env() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Startup error: {e}");
            eprintln!(
                "Set {} to the absolute path of the browser binary mermaid-cli should use.",
                config::BROWSER_ENV_VAR
            );
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        renderer = %cfg.renderer.command,
        browser = %browser_path.display(),
        "Starting mermaid-render-mcp server"
    );

    let renderer = Renderer::new(
        cfg.renderer.command,
        browser_path,
        cfg.renderer.default_output_dir,
    );

    let mut server = McpServer::new(renderer);

    info!("MCP server ready, waiting for client connection...");

    // Run the server
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    let result = runtime.block_on(server.run());

    match result {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn quiet_wins_over_config_level() {
        assert_eq!(get_log_level(0, true, "trace"), Level::ERROR);
    }

    #[test]
    fn verbosity_overrides_config_level() {
        assert_eq!(get_log_level(1, false, "error"), Level::INFO);
        assert_eq!(get_log_level(2, false, "error"), Level::DEBUG);
        assert_eq!(get_log_level(3, false, "error"), Level::TRACE);
    }

    #[test]
    fn config_level_applies_without_flags() {
        assert_eq!(get_log_level(0, false, "debug"), Level::DEBUG);
        assert_eq!(get_log_level(0, false, "bogus"), Level::WARN);
    }
}
