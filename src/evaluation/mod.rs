//! 分類結果の評価。
pub mod metrics;

pub use self::metrics::{CategoryMetrics, ClassificationMetrics, MetricsCalculator};
