pub mod flow;
pub mod metrics;

pub use flow::CombinerFlow;
pub use metrics::{Metrics, MetricsSnapshot};
