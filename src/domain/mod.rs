pub mod analysis;
pub mod budget;
pub mod category;
pub mod common;
pub mod expense;
pub mod insights;
pub mod report;

pub use analysis::{
    AnalysisSummary, BudgetAnalysis, BudgetHealth, BudgetPerformance, CategoryBreakdown,
    DayOfWeekAnalysis, FinancialHealth, PaymentBreakdown, PeakDay, SpendingPatterns,
    StructuredAnalysis, TopCategory, WeekdaySpending,
};
pub use budget::{Budget, BudgetPeriodKind};
pub use category::{Category, CategoryChanges, NewCategory};
pub use common::{Identifiable, Owned, PeriodWindow};
pub use expense::{
    BudgetContext, Expense, ExpenseChanges, ExpenseLocation, ExpenseStatus, NewExpense,
    PaymentMethod,
};
pub use insights::{Recommendations, ValidatedInsights};
pub use report::{Report, ReportPeriodKind, ReportStatus};

// Re-export common dependencies so consumers can rely on this module as a façade.
pub use chrono;
pub use rust_decimal;
pub use uuid;
