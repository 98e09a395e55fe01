//! Prompt text handed to an [`InsightGenerator`](super::generator::InsightGenerator).

use std::fmt;

use rust_decimal::Decimal;

use crate::domain::{BudgetHealth, ReportPeriodKind, StructuredAnalysis};
use crate::utils::money::format_amount;

const DATE_FORMAT: &str = "%a %b %d %Y";

pub fn build_prompt(analysis: &StructuredAnalysis, kind: ReportPeriodKind, symbol: &str) -> String {
    Prompt {
        analysis,
        kind,
        symbol,
    }
    .to_string()
}

struct Prompt<'a> {
    analysis: &'a StructuredAnalysis,
    kind: ReportPeriodKind,
    symbol: &'a str,
}

impl fmt::Display for Prompt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_summary(f)?;
        self.write_breakdown(f)?;
        self.write_budgets(f)?;
        self.write_patterns(f)?;
        f.write_str(RESPONSE_FORMAT)
    }
}

impl Prompt<'_> {
    fn money(&self, amount: Decimal) -> String {
        format_amount(self.symbol, amount)
    }

    fn write_summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analysis = self.analysis;
        let summary = &analysis.summary;
        writeln!(
            f,
            "You are an expert financial advisor analyzing expense data. Provide specific, actionable insights based on the actual data provided.\n"
        )?;
        writeln!(f, "FINANCIAL DATA ANALYSIS:")?;
        writeln!(
            f,
            "Period: {} report ({} to {})",
            self.kind,
            analysis.period.start.format(DATE_FORMAT),
            analysis.period.end.format(DATE_FORMAT)
        )?;
        writeln!(f, "Total Expenses: {}", self.money(summary.total_expenses))?;
        writeln!(f, "Total Transactions: {}", summary.total_transactions)?;
        writeln!(
            f,
            "Average Daily Spending: {}",
            self.money(summary.average_daily_spending)
        )?;
        writeln!(
            f,
            "Average Transaction Size: {}",
            self.money(summary.average_transaction_amount)
        )?;
        writeln!(
            f,
            "Financial Health Score: {}/100\n",
            analysis.financial_health.score
        )
    }

    fn write_breakdown(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SPENDING BREAKDOWN:")?;
        for (index, category) in self.analysis.top_spending_categories.iter().enumerate() {
            writeln!(
                f,
                "{}. {}: {} ({:.1}%) - {} transactions",
                index + 1,
                category.name,
                self.money(category.total),
                category.percentage,
                category.count
            )?;
        }
        Ok(())
    }

    fn write_budgets(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analysis = self.analysis;
        writeln!(f, "\nBUDGET PERFORMANCE:")?;
        if analysis.budget_analysis.is_empty() {
            return writeln!(f, "No active budgets set");
        }
        let names = |status| {
            analysis
                .budgets_with(status)
                .map(|b| b.category_name.as_str())
                .collect::<Vec<_>>()
        };
        let over = names(BudgetHealth::OverBudget);
        let warning = names(BudgetHealth::Warning);
        writeln!(f, "Total Budgets: {}", analysis.budget_analysis.len())?;
        writeln!(f, "Over Budget: {}{}", over.len(), listed(&over))?;
        writeln!(f, "Warning Status: {}{}", warning.len(), listed(&warning))?;
        writeln!(
            f,
            "Within Budget: {}",
            analysis.budgets_with(BudgetHealth::Good).count()
        )
    }

    fn write_patterns(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let patterns = &self.analysis.spending_patterns;
        let peak = patterns.peak_spending_days.first();
        writeln!(f, "\nSPENDING PATTERNS:")?;
        writeln!(
            f,
            "Most expensive day: {} - {}",
            peak.map_or("N/A", |day| day.day_name.as_str()),
            self.money(peak.map_or(Decimal::ZERO, |day| day.amount))
        )?;
        writeln!(
            f,
            "Top spending day of week: {}",
            patterns.day_of_week.top_spending_day.as_deref().unwrap_or("N/A")
        )?;
        writeln!(
            f,
            "Active spending days: {} out of {}\n",
            patterns.total_spending_days, self.analysis.summary.period_days
        )
    }
}

fn listed(names: &[&str]) -> String {
    if names.is_empty() {
        String::new()
    } else {
        format!(" ({})", names.join(", "))
    }
}

const RESPONSE_FORMAT: &str = r#"Based on this specific data, provide a JSON response with your analysis. Focus on the actual numbers and patterns shown above.

Required JSON format:
{
  "keyInsights": [3-4 specific insights based on the actual data],
  "spendingBehavior": "description based on actual spending patterns and amounts",
  "recommendations": {
    "immediate": [2-3 specific actions based on the data],
    "longTerm": [2-3 strategic recommendations]
  },
  "strengths": [2-3 positive financial behaviors identified],
  "improvements": [2-3 specific areas for improvement],
  "budgetAlert": "specific alert message if budget issues exist, otherwise null"
}

Analyze the specific data provided and give actionable insights. Do not use generic responses."#;
