//! Turns the expenses and budgets of a report window into a
//! [`StructuredAnalysis`].
//!
//! Everything here is pure: callers fetch the data, the aggregator only
//! counts. Every ratio over an empty set is zero.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::domain::{
    AnalysisSummary, Budget, BudgetAnalysis, BudgetHealth, BudgetPerformance, CategoryBreakdown,
    DayOfWeekAnalysis, Expense, FinancialHealth, PaymentBreakdown, PaymentMethod, PeakDay,
    PeriodWindow, SpendingPatterns, StructuredAnalysis, TopCategory, WeekdaySpending,
};
use crate::errors::{ExpenseError, Result};
use crate::utils::money::{average, checked_sum, percentage, to_f64};

pub const UNCATEGORIZED: &str = "Uncategorized";
/// Label of a budget without a category. Such a budget counts every expense
/// in the window toward its spend.
pub const ALL_CATEGORIES: &str = "All Categories";
pub const DEFAULT_WARNING_PERCENT: i64 = 80;

const PEAK_DAYS: usize = 3;
const TOP_CATEGORIES: usize = 5;
const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// An expense joined with the name of its category.
#[derive(Debug, Clone)]
pub struct ReportExpense {
    pub expense: Expense,
    pub category_name: Option<String>,
}

impl ReportExpense {
    pub fn new(expense: Expense, category_name: Option<String>) -> Self {
        Self {
            expense,
            category_name,
        }
    }

    fn category_label(&self) -> &str {
        self.category_name.as_deref().unwrap_or(UNCATEGORIZED)
    }
}

/// A budget joined with the name of its category; `None` for wildcard budgets.
#[derive(Debug, Clone)]
pub struct ReportBudget {
    pub budget: Budget,
    pub category_name: Option<String>,
}

impl ReportBudget {
    pub fn new(budget: Budget, category_name: Option<String>) -> Self {
        Self {
            budget,
            category_name,
        }
    }
}

pub struct ReportAggregator;

impl ReportAggregator {
    pub fn aggregate(
        expenses: &[ReportExpense],
        budgets: &[ReportBudget],
        period: PeriodWindow,
    ) -> Result<StructuredAnalysis> {
        Self::aggregate_with(
            expenses,
            budgets,
            period,
            Decimal::from(DEFAULT_WARNING_PERCENT),
        )
    }

    /// Same as [`ReportAggregator::aggregate`] with a custom warning threshold
    /// (percent of the limit above which a budget is flagged).
    ///
    /// Fails only when the window's amounts do not fit the decimal range.
    pub fn aggregate_with(
        expenses: &[ReportExpense],
        budgets: &[ReportBudget],
        period: PeriodWindow,
        warning_percent: Decimal,
    ) -> Result<StructuredAnalysis> {
        let total = checked_sum(expenses.iter().map(|item| item.expense.amount))
            .ok_or_else(|| ExpenseError::overflow("totalling report expenses"))?;
        let count = expenses.len();

        // Amounts are positive, so every partial sum below is bounded by `total`.

        let category_breakdown = category_breakdown(expenses, total);
        let payment_method_breakdown = payment_breakdown(expenses);
        let daily_spending = daily_series(expenses);
        let budget_analysis: Vec<BudgetAnalysis> = budgets
            .iter()
            .map(|entry| analyse_budget(entry, expenses, warning_percent))
            .collect::<Result<_>>()?;

        let financial_health = FinancialHealth {
            score: health_score(total, count, &category_breakdown, &budget_analysis),
            budget_performance: performance(&budget_analysis),
        };
        let spending_patterns = spending_patterns(&daily_spending, total);
        let top_spending_categories = top_categories(&category_breakdown);

        let summary = AnalysisSummary {
            total_expenses: total,
            total_transactions: count,
            period_days: period.calendar_days(),
            active_days: daily_spending.len(),
            average_daily_spending: average(total, daily_spending.len()),
            average_transaction_amount: average(total, count),
        };

        Ok(StructuredAnalysis {
            period,
            summary,
            category_breakdown,
            payment_method_breakdown,
            daily_spending,
            budget_analysis,
            financial_health,
            spending_patterns,
            top_spending_categories,
        })
    }
}

fn category_breakdown(
    expenses: &[ReportExpense],
    total: Decimal,
) -> BTreeMap<String, CategoryBreakdown> {
    let mut breakdown: BTreeMap<String, CategoryBreakdown> = BTreeMap::new();
    for item in expenses {
        let entry = breakdown
            .entry(item.category_label().to_string())
            .or_insert(CategoryBreakdown {
                total: Decimal::ZERO,
                count: 0,
                percentage: 0.0,
            });
        entry.total += item.expense.amount;
        entry.count += 1;
    }
    for entry in breakdown.values_mut() {
        entry.percentage = percentage(entry.total, total);
    }
    breakdown
}

fn payment_breakdown(expenses: &[ReportExpense]) -> BTreeMap<PaymentMethod, PaymentBreakdown> {
    let mut breakdown = BTreeMap::new();
    for item in expenses {
        let entry = breakdown
            .entry(item.expense.payment_method)
            .or_insert(PaymentBreakdown {
                total: Decimal::ZERO,
                count: 0,
            });
        entry.total += item.expense.amount;
        entry.count += 1;
    }
    breakdown
}

fn daily_series(expenses: &[ReportExpense]) -> BTreeMap<NaiveDate, Decimal> {
    let mut series = BTreeMap::new();
    for item in expenses {
        *series
            .entry(item.expense.expense_date.date())
            .or_insert(Decimal::ZERO) += item.expense.amount;
    }
    series
}

fn analyse_budget(
    entry: &ReportBudget,
    expenses: &[ReportExpense],
    warning_percent: Decimal,
) -> Result<BudgetAnalysis> {
    let budget = &entry.budget;
    let spent = checked_sum(
        expenses
            .iter()
            .filter(|item| budget.covers_category(item.expense.category_id))
            .map(|item| item.expense.amount),
    )
    .ok_or_else(|| ExpenseError::overflow("totalling budget spend"))?;
    let used = if budget.amount_limit > Decimal::ZERO {
        spent
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|scaled| scaled.checked_div(budget.amount_limit))
            .ok_or_else(|| ExpenseError::overflow("computing budget usage"))?
    } else {
        Decimal::ZERO
    };
    let remaining = budget
        .amount_limit
        .checked_sub(spent)
        .ok_or_else(|| ExpenseError::overflow("computing budget remainder"))?;
    let status = if used > Decimal::ONE_HUNDRED {
        BudgetHealth::OverBudget
    } else if used > warning_percent {
        BudgetHealth::Warning
    } else {
        BudgetHealth::Good
    };
    let category_name = match &entry.category_name {
        Some(name) => name.clone(),
        None if budget.is_wildcard() => ALL_CATEGORIES.to_string(),
        None => UNCATEGORIZED.to_string(),
    };
    Ok(BudgetAnalysis {
        budget_id: budget.id,
        budget_name: budget.name.clone(),
        category_id: budget.category_id,
        category_name,
        limit: budget.amount_limit,
        spent,
        remaining,
        percentage: to_f64(used),
        status,
    })
}

fn performance(analysis: &[BudgetAnalysis]) -> BudgetPerformance {
    let count = |status| analysis.iter().filter(|b| b.status == status).count();
    BudgetPerformance {
        total_budgets: analysis.len(),
        over_budget_count: count(BudgetHealth::OverBudget),
        warning_budget_count: count(BudgetHealth::Warning),
        good_budget_count: count(BudgetHealth::Good),
    }
}

/// Score in `1..=100`, starting from 70.
fn health_score(
    total: Decimal,
    count: usize,
    categories: &BTreeMap<String, CategoryBreakdown>,
    budgets: &[BudgetAnalysis],
) -> u8 {
    let mut score = 70.0_f64;

    if !budgets.is_empty() {
        let over = budgets
            .iter()
            .filter(|b| b.status == BudgetHealth::OverBudget)
            .count();
        let adherence = 1.0 - over as f64 / budgets.len() as f64;
        score += adherence * 30.0 - 15.0;
    }

    let max_share = categories.values().map(|entry| entry.percentage).reduce(f64::max);
    if let Some(max_share) = max_share {
        if max_share > 70.0 {
            score -= 15.0;
        } else if max_share < 40.0 {
            score += 10.0;
        }
    }

    let avg_transaction = to_f64(total) / count.max(1) as f64;
    if avg_transaction < 500.0 {
        score += 5.0;
    } else if avg_transaction > 2000.0 {
        score -= 5.0;
    }

    score.round().clamp(1.0, 100.0) as u8
}

fn spending_patterns(daily: &BTreeMap<NaiveDate, Decimal>, total: Decimal) -> SpendingPatterns {
    let mut by_amount: Vec<(NaiveDate, Decimal)> =
        daily.iter().map(|(date, amount)| (*date, *amount)).collect();
    // Stable sort keeps date order among equal amounts.
    by_amount.sort_by(|a, b| b.1.cmp(&a.1));
    let peak_spending_days = by_amount
        .into_iter()
        .take(PEAK_DAYS)
        .map(|(date, amount)| PeakDay {
            date,
            amount,
            day_name: day_name(date).to_string(),
        })
        .collect();

    let mut per_weekday: [Option<Decimal>; 7] = [None; 7];
    for (date, amount) in daily {
        let slot = &mut per_weekday[date.weekday().num_days_from_sunday() as usize];
        *slot = Some(slot.unwrap_or(Decimal::ZERO) + *amount);
    }
    let breakdown: Vec<WeekdaySpending> = per_weekday
        .iter()
        .enumerate()
        .filter_map(|(index, amount)| {
            amount.map(|amount| WeekdaySpending {
                day: DAY_NAMES[index].to_string(),
                amount,
            })
        })
        .collect();
    let top = breakdown.iter().fold(None, |best: Option<&WeekdaySpending>, day| {
        match best {
            Some(current) if current.amount >= day.amount => Some(current),
            _ => Some(day),
        }
    });

    SpendingPatterns {
        peak_spending_days,
        day_of_week: DayOfWeekAnalysis {
            top_spending_day: top.map(|day| day.day.clone()),
            top_spending_amount: top.map_or(Decimal::ZERO, |day| day.amount),
            breakdown,
        },
        total_spending_days: daily.len(),
        average_spending_per_day: average(total, daily.len()),
    }
}

fn top_categories(categories: &BTreeMap<String, CategoryBreakdown>) -> Vec<TopCategory> {
    let mut ranked: Vec<TopCategory> = categories
        .iter()
        .map(|(name, entry)| TopCategory {
            name: name.clone(),
            total: entry.total,
            percentage: entry.percentage,
            count: entry.count,
        })
        .collect();
    ranked.sort_by(|a, b| b.total.cmp(&a.total));
    ranked.truncate(TOP_CATEGORIES);
    ranked
}

fn day_name(date: NaiveDate) -> &'static str {
    DAY_NAMES[date.weekday().num_days_from_sunday() as usize]
}
