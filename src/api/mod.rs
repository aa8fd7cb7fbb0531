pub mod handlers;
pub mod server;

pub use handlers::{ApiError, AppState};
pub use server::{build_router, cors_layer, run_server, ServerConfig, DEFAULT_CORS_ORIGIN};
