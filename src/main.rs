use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snail::{create_router, AppState, Config};
use snail_core::TableStore;
use snail_db::{init_database, RedbDocumentStore, RedbTableStore};
use snail_model::{Product, Schema};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Required: SNAIL_DB_NAME");
            eprintln!("Optional: SNAIL_DB_PATH (default: ./snail.redb)");
            eprintln!("Optional: SNAIL_LISTEN_ADDR (default: 0.0.0.0:3000)");
            std::process::exit(1);
        }
    };

    tracing::info!("Starting Snail server");
    tracing::info!("Listen address: {}", config.listen_addr);
    tracing::info!("Database: {} ({})", config.db_path.display(), config.db_name);

    let db = match init_database(&config.db_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Database error: {}", e);
            std::process::exit(1);
        }
    };

    let documents = Arc::new(RedbDocumentStore::new(db.clone(), config.db_name.clone()));
    let tables = Arc::new(RedbTableStore::new(db, config.db_name.clone()));

    // Tables must exist before the first write
    if let Err(e) = tables.create_table(Product::COLLECTION) {
        eprintln!("Table setup error: {}", e);
        std::process::exit(1);
    }

    let state = AppState::new(documents, tables);
    let app = create_router(state);

    let listener = match tokio::net::TcpListener::bind(config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", config.listen_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server running at http://{}", config.listen_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
