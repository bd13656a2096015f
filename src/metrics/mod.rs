pub mod counters;
pub mod report;

pub use counters::RegistryMetrics;
pub use report::MetricsReport;
