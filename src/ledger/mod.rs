//! Budget periods, budget matching, and spend bookkeeping.

pub mod budget_ledger;
pub mod matcher;
pub mod period;
pub mod reconciler;

pub use budget_ledger::BudgetLedger;
pub use matcher::BudgetMatcher;
pub use period::{end_of_day, start_of_day, PeriodCalculator};
pub use reconciler::ExpenseReconciler;
