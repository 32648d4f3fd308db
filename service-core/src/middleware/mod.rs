pub mod metrics;
pub mod tracing;

pub use metrics::{init_metrics, metrics_middleware, render_metrics};
pub use tracing::{REQUEST_ID_HEADER, request_id_middleware};
