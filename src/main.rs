use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dnskeeper::api;
use dnskeeper::config::Settings;
use dnskeeper::database::{self, PgRoster, RosterStore};
use dnskeeper::dns::{ChangeApplier, DnsProvider, HttpDnsProvider, PublishedState, ReconciliationEngine};

#[derive(Parser, Debug)]
#[command(name = "dnskeeper")]
#[command(about = "Keeps a DNS zone's address records in step with a fleet roster", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/dnskeeper.toml")]
    config: String,

    /// Override the console listening port
    #[arg(short, long)]
    port: Option<u16>,

    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut settings = Settings::load(&args.config)?;
    if let Some(port) = args.port {
        settings.api.port = port;
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("dnskeeper={},actix_web=info", settings.server.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting dnskeeper");

    settings.validate().context("Check configuration")?;
    let settings = Arc::new(settings);

    // Initialize database
    let db_pool = database::init_pool(&settings.database)
        .await
        .context("DATABASE_URL invalid or database unreachable")?;

    // Run migrations if requested
    if args.migrate {
        info!("Running database migrations...");
        database::run_migrations(&db_pool).await?;
        info!("Migrations completed successfully");
        return Ok(());
    }

    let roster: Arc<dyn RosterStore> = Arc::new(PgRoster::new(db_pool));
    roster.ping().await.context("Database connection test failed")?;
    info!("Database connection succeeded");

    // Resolve the hosted zone once for the life of the process
    let provider: Arc<dyn DnsProvider> = Arc::new(HttpDnsProvider::new(&settings.dns)?);
    let published = match PublishedState::connect(provider, &settings.dns.zone).await {
        Ok(published) => Arc::new(published),
        Err(e) => {
            error!("Hosted zone lookup failed: {}", e);
            return Err(e.into());
        }
    };

    let applier = ChangeApplier::new(
        Arc::clone(&published),
        settings.propagation_policy(),
        settings.dns.ttl_default,
    );
    let engine = Arc::new(ReconciliationEngine::new(Arc::clone(&roster), published, applier));

    api::server::start(settings, engine, roster).await
}
