pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod routes;
pub mod state;
pub mod upload;

pub use config::{ErrorFormat, GatewayConfig};
pub use error::{ApiError, ApiResult};
pub use routes::{router, run_server};
pub use state::AppState;
