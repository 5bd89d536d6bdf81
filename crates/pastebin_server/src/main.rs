//! Pastebin server entrypoint.

use clap::Parser;
use pastebin_core::config::ConfigOverrides;
use pastebin_server::{serve_router, AppState, Config, Database, ExpirySweeper};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "pastebin", version, about = "Pastebin server with accounts and API keys")]
struct Cli {
    /// Address to listen on (host:port)
    #[arg(short, long)]
    bind: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Database file path
    #[arg(short, long)]
    database: Option<String>,

    /// URL prefix pastes are served under
    #[arg(short, long)]
    serve_path: Option<String>,

    /// Verbose logging
    #[arg(long)]
    debug: bool,

    /// Grant admin to an existing user and exit
    #[arg(long, value_name = "USERNAME")]
    make_admin: Option<String>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind: self.bind.clone(),
            database_path: self.database.clone(),
            serve_path: self.serve_path.clone(),
            debug: self.debug,
        }
    }
}

fn default_log_filter(debug: bool) -> &'static str {
    if debug {
        "pastebin=debug,pastebin_server=debug,pastebin_core=debug,tower_http=debug"
    } else {
        "pastebin=info,pastebin_server=info,pastebin_core=info,tower_http=warn"
    }
}

fn make_admin(db: Database, username: &str) -> anyhow::Result<()> {
    let user = db
        .users
        .get_by_username(username)?
        .ok_or_else(|| anyhow::anyhow!("User '{}' not found", username))?;
    let state = AppState::new(Config::default(), db);
    state.services.admin.promote(user.id)?;
    println!("Granted admin to {} (id {})", user.username, user.id);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref(), &cli.overrides())?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter(config.debug).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database = Database::new(&config.database_path)?;

    if let Some(username) = cli.make_admin.as_deref() {
        return make_admin(database, username);
    }

    let bind_addr = pastebin_server::resolve_bind_address(&config)?;
    if !bind_addr.ip().is_loopback() {
        tracing::warn!(
            "Binding to non-localhost address: {} - ensure proper security measures are in place",
            bind_addr
        );
    }

    let sweep_interval = config.sweep_interval();
    let state = AppState::new(config, database);
    let sweeper = ExpirySweeper::spawn(
        state.services.pastes.clone(),
        state.services.auth.clone(),
        sweep_interval,
    );

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr().unwrap_or(bind_addr);
    tracing::info!(
        database = %state.config.database_path,
        serve_path = %state.config.serve_path,
        "Pastebin running at http://{}",
        actual_addr
    );

    let serve_result = serve_router(listener, state, shutdown_signal()).await;
    sweeper.shutdown().await;
    tracing::info!("Server stopped");

    serve_result?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
