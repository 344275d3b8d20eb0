use std::net::SocketAddr;
use std::sync::Arc;
use vaultboost::collaborators::{HttpSupplyOracle, InMemoryBank, MemorySink, MemoryTwab, SupplyOracle};
use vaultboost::domain::{Address, Amount};
use vaultboost::{api, config::Config, BoostLedger, SingleOwner};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Wire collaborators
    let custody = Arc::new(InMemoryBank::new(Address::new(
        config.booster_address.clone(),
    )));
    let sink = Arc::new(MemorySink::new());
    let oracle: Arc<dyn SupplyOracle> = match &config.twab_oracle_url {
        Some(url) => Arc::new(HttpSupplyOracle::new(url.clone())),
        None => Arc::new(MemoryTwab::new(
            Amount::new(config.twab_average_supply),
            config.twab_period_seconds,
        )),
    };
    let auth = Arc::new(SingleOwner::new(Address::new(config.owner.clone())));
    let ledger = Arc::new(BoostLedger::new(custody, sink, oracle, auth, &config));

    // Create router
    let app = api::create_router(api::AppState { ledger });

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
