//! Article Aggregator Control API
//! Health, run history, stats and manual dispatch

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use types::*;
