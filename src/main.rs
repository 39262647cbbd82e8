use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use accountd::cli::{Cli, Commands};
use accountd::config::ServerConfig;
use accountd::routes::router;
use accountd::state::AppState;
use accountd::storage::PostgresUserStore;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "accountd=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Connect to database
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    // Initialize storage
    let user_store = PostgresUserStore::new(pool.clone());
    user_store.initialize().await?;

    // Handle CLI commands
    match cli.command {
        Some(Commands::User(cmd)) => {
            return cmd.execute(pool).await;
        }
        Some(Commands::Serve) | None => {
            // Continue to run server
        }
    }

    info!("Starting accountd v{}", VERSION);
    info!("   Bind address: {}", config.bind_address());
    info!("   Production mode: {}", config.production);
    info!("Database connected and schema initialized");

    let state = Arc::new(AppState::new(config.clone(), Arc::new(user_store)));
    let app = router(state);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
