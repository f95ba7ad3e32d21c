pub mod health;
pub mod logging;
pub mod metrics;
pub mod metrics_handler;
pub mod server;

pub use health::{health_check_response, live_check_response, ready_check_response};
pub use logging::init_tracing;
pub use metrics::{init_metrics, Metrics};
pub use metrics_handler::handle_metrics;
pub use server::start_observability_server;
