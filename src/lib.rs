pub mod config;
pub mod routes;
pub mod state;

pub use config::{Config, ConfigError};
pub use routes::{create_router, Reply};
pub use state::AppState;
