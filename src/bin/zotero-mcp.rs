//! MCP server binary for a Zotero library.
//!
//! Usage: ZOTERO_API_KEY=... ZOTERO_USER_ID=... zotero-mcp -v

#[cfg(feature = "cli")]
mod cli {
    use clap::Parser;
    use tracing::{error, info, Level};
    use tracing_subscriber::EnvFilter;
    use zotero_mcp::{BackendHandle, Dispatcher, ServerSettings, ZoteroClient, ZoteroConfig};

    #[derive(Parser, Debug)]
    #[command(name = "zotero-mcp", about = "MCP server for a Zotero library (stdio)", version)]
    struct Cli {
        /// Zotero API key
        #[arg(long, env = "ZOTERO_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Zotero user library id (takes priority over --group-id)
        #[arg(long, env = "ZOTERO_USER_ID")]
        user_id: Option<String>,

        /// Zotero group library id
        #[arg(long, env = "ZOTERO_GROUP_ID")]
        group_id: Option<String>,

        /// Zotero API base URL
        #[arg(long, env = "ZOTERO_API_URL")]
        api_url: Option<String>,

        /// Scheme used for resource URIs
        #[arg(long, default_value = "zotero")]
        uri_scheme: String,

        /// Number of items in the top-items resource
        #[arg(long, default_value = "50")]
        top_limit: u32,

        /// Number of items in the recent-items resource
        #[arg(long, default_value = "20")]
        recent_limit: u32,

        /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Only log errors
        #[arg(short, long)]
        quiet: bool,
    }

    fn log_level(verbose: u8, quiet: bool) -> Level {
        if quiet {
            return Level::ERROR;
        }
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// Logs go to stderr; stdout carries protocol messages only.
    fn init_tracing(level: Level) {
        let filter = EnvFilter::from_default_env().add_directive(level.into());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    /// Build the backend, falling back to an unavailable handle on bad config.
    fn make_backend(cli: &Cli) -> BackendHandle {
        let client = ZoteroConfig::new(
            cli.api_key.clone(),
            cli.user_id.clone(),
            cli.group_id.clone(),
            cli.api_url.clone(),
        )
        .and_then(ZoteroClient::new);

        match client {
            Ok(client) => {
                info!(library = ?client.library(), "Zotero client initialised");
                BackendHandle::ready(client)
            }
            Err(e) => {
                error!(error = %e, "Zotero client unavailable; resource reads and tool calls will fail");
                BackendHandle::unavailable(e.to_string())
            }
        }
    }

    pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
        let cli = Cli::parse();
        init_tracing(log_level(cli.verbose, cli.quiet));

        info!(version = env!("CARGO_PKG_VERSION"), "Starting zotero-mcp server");

        let settings = ServerSettings {
            uri_scheme: cli.uri_scheme.clone(),
            top_items_limit: cli.top_limit,
            recent_items_limit: cli.recent_limit,
        };
        let dispatcher = Dispatcher::new(make_backend(&cli), &settings)?;

        zotero_mcp::mcp::run_server(dispatcher).await?;
        info!("Server shut down");
        Ok(())
    }

}

#[cfg(feature = "cli")]
#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("This binary requires the 'cli' feature. Build with: cargo build --features cli");
    std::process::exit(1);
}
