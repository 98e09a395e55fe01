//! Report windows, aggregation, and narrative insights.

pub mod aggregator;
pub mod generator;
pub mod insights;
pub mod period;
pub mod prompt;

pub use aggregator::{ReportAggregator, ReportBudget, ReportExpense};
pub use generator::{extract_insights, InsightGenerator};
pub use insights::InsightsEnhancer;
pub use period::{CustomPeriod, ReportPeriodResolver};
pub use prompt::build_prompt;
