pub mod auth;
pub mod cli;
pub mod config;
pub mod envelope;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod storage;

pub use config::ServerConfig;
pub use routes::router;
pub use state::AppState;
