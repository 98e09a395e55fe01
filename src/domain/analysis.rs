//! Value types produced by the report aggregator.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{common::PeriodWindow, expense::PaymentMethod};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructuredAnalysis {
    pub period: PeriodWindow,
    pub summary: AnalysisSummary,
    pub category_breakdown: BTreeMap<String, CategoryBreakdown>,
    pub payment_method_breakdown: BTreeMap<PaymentMethod, PaymentBreakdown>,
    pub daily_spending: BTreeMap<NaiveDate, Decimal>,
    pub budget_analysis: Vec<BudgetAnalysis>,
    pub financial_health: FinancialHealth,
    pub spending_patterns: SpendingPatterns,
    pub top_spending_categories: Vec<TopCategory>,
}

impl StructuredAnalysis {
    pub fn budgets_with(&self, status: BudgetHealth) -> impl Iterator<Item = &BudgetAnalysis> {
        self.budget_analysis
            .iter()
            .filter(move |entry| entry.status == status)
    }

    pub fn top_category(&self) -> Option<&TopCategory> {
        self.top_spending_categories.first()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSummary {
    pub total_expenses: Decimal,
    pub total_transactions: usize,
    /// Calendar days covered by the report window.
    pub period_days: i64,
    /// Distinct days with at least one expense.
    pub active_days: usize,
    pub average_daily_spending: Decimal,
    pub average_transaction_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryBreakdown {
    pub total: Decimal,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentBreakdown {
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetHealth {
    Good,
    Warning,
    OverBudget,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetAnalysis {
    pub budget_id: Uuid,
    pub budget_name: String,
    pub category_id: Option<Uuid>,
    pub category_name: String,
    pub limit: Decimal,
    pub spent: Decimal,
    /// Negative once the budget is exceeded.
    pub remaining: Decimal,
    pub percentage: f64,
    pub status: BudgetHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialHealth {
    pub score: u8,
    pub budget_performance: BudgetPerformance,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BudgetPerformance {
    pub total_budgets: usize,
    pub over_budget_count: usize,
    pub warning_budget_count: usize,
    pub good_budget_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpendingPatterns {
    pub peak_spending_days: Vec<PeakDay>,
    pub day_of_week: DayOfWeekAnalysis,
    pub total_spending_days: usize,
    pub average_spending_per_day: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeakDay {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub day_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayOfWeekAnalysis {
    pub top_spending_day: Option<String>,
    pub top_spending_amount: Decimal,
    /// Sunday first, only weekdays that saw spending.
    pub breakdown: Vec<WeekdaySpending>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekdaySpending {
    pub day: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopCategory {
    pub name: String,
    pub total: Decimal,
    pub percentage: f64,
    pub count: usize,
}
