//! Validation of generated insight text, with deterministic fallbacks.
//!
//! External insights are best effort. Each field is kept only when it has the
//! expected shape and clears a minimum quality bar; anything else is replaced
//! by text derived from the analysis itself. The budget alert is always
//! computed locally.

use rust_decimal::Decimal;
use serde_json::Value;

use crate::config::Config;
use crate::domain::{BudgetHealth, Recommendations, StructuredAnalysis, ValidatedInsights};
use crate::utils::money::format_amount;

const MAX_KEY_INSIGHTS: usize = 4;
const MAX_ITEMS: usize = 3;

/// Minimum length and rejected template fragments for one text field.
struct Rule {
    min_chars: usize,
    placeholders: &'static [&'static str],
}

const KEY_INSIGHT: Rule = Rule {
    min_chars: 10,
    placeholders: &["insight about", "Quick action"],
};
const SPENDING_BEHAVIOR: Rule = Rule {
    min_chars: 20,
    placeholders: &["Brief description"],
};
const IMMEDIATE: Rule = Rule {
    min_chars: 15,
    placeholders: &["Quick action"],
};
const LONG_TERM: Rule = Rule {
    min_chars: 15,
    placeholders: &["Strategy"],
};
const STRENGTH: Rule = Rule {
    min_chars: 10,
    placeholders: &["Financial strength"],
};
const IMPROVEMENT: Rule = Rule {
    min_chars: 10,
    placeholders: &["Area to improve"],
};

impl Rule {
    fn accepts(&self, text: &str) -> bool {
        text.chars().count() > self.min_chars
            && !self.placeholders.iter().any(|marker| text.contains(marker))
    }

    fn accept_list(&self, value: Option<&Value>) -> Vec<String> {
        value
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|text| self.accepts(text))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn accept_text(&self, value: Option<&Value>) -> Option<String> {
        value
            .and_then(Value::as_str)
            .filter(|text| self.accepts(text))
            .map(str::to_string)
    }
}

#[derive(Debug, Clone)]
pub struct InsightsEnhancer {
    currency_symbol: String,
    warning_percent: Decimal,
}

impl Default for InsightsEnhancer {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl InsightsEnhancer {
    pub fn new(currency_symbol: impl Into<String>, warning_percent: Decimal) -> Self {
        Self {
            currency_symbol: currency_symbol.into(),
            warning_percent,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.currency_symbol.clone(), config.warning_threshold_percent)
    }

    /// Never fails; a field that is missing or falls short is replaced by
    /// generated text.
    pub fn enhance(&self, raw: Option<&Value>, analysis: &StructuredAnalysis) -> ValidatedInsights {
        let field = |name: &str| raw.and_then(|value| value.get(name));
        let recommendation = |name: &str| {
            field("recommendations").and_then(|value| value.get(name))
        };

        type Generator = fn(&InsightsEnhancer, &StructuredAnalysis) -> Vec<String>;
        let or_fallback = |accepted: Vec<String>, fallback: Generator| {
            if accepted.is_empty() {
                fallback(self, analysis)
            } else {
                accepted
            }
        };

        ValidatedInsights {
            key_insights: or_fallback(
                KEY_INSIGHT.accept_list(field("keyInsights")),
                Self::key_insights,
            ),
            spending_behavior: SPENDING_BEHAVIOR
                .accept_text(field("spendingBehavior"))
                .unwrap_or_else(|| self.spending_behavior(analysis)),
            recommendations: Recommendations {
                immediate: or_fallback(
                    IMMEDIATE.accept_list(recommendation("immediate")),
                    Self::immediate_recommendations,
                ),
                long_term: or_fallback(
                    LONG_TERM.accept_list(recommendation("longTerm")),
                    Self::long_term_recommendations,
                ),
            },
            strengths: or_fallback(STRENGTH.accept_list(field("strengths")), Self::strengths),
            improvements: or_fallback(
                IMPROVEMENT.accept_list(field("improvements")),
                Self::improvements,
            ),
            budget_alert: self.budget_alert(analysis),
        }
    }

    /// Insights built entirely from the analysis.
    pub fn fallback(&self, analysis: &StructuredAnalysis) -> ValidatedInsights {
        ValidatedInsights {
            key_insights: self.key_insights(analysis),
            spending_behavior: self.spending_behavior(analysis),
            recommendations: Recommendations {
                immediate: self.immediate_recommendations(analysis),
                long_term: self.long_term_recommendations(analysis),
            },
            strengths: self.strengths(analysis),
            improvements: self.improvements(analysis),
            budget_alert: self.budget_alert(analysis),
        }
    }

    fn money(&self, amount: Decimal) -> String {
        format_amount(&self.currency_symbol, amount)
    }

    pub fn key_insights(&self, analysis: &StructuredAnalysis) -> Vec<String> {
        let summary = &analysis.summary;
        let mut insights = vec![format!(
            "You spent {} across {} transactions this period",
            self.money(summary.total_expenses),
            summary.total_transactions
        )];

        if let Some(top) = analysis.top_category() {
            insights.push(format!(
                "{} was your largest expense category at {} ({:.1}% of total spending)",
                top.name,
                self.money(top.total),
                top.percentage
            ));
        }

        let budgets = analysis.budget_analysis.len();
        if budgets > 0 {
            let over = analysis.budgets_with(BudgetHealth::OverBudget).count();
            if over > 0 {
                insights.push(format!(
                    "{} of your {} budgets exceeded their limits",
                    over, budgets
                ));
            } else {
                insights.push(format!(
                    "All {} budgets are within their limits - excellent budget discipline",
                    budgets
                ));
            }
        }

        let score = analysis.financial_health.score;
        let verdict = match score {
            80..=100 => "indicates strong expense management",
            60..=79 => "shows room for improvement in expense control",
            _ => "suggests significant opportunities for better expense management",
        };
        insights.push(format!(
            "Your financial health score of {}/100 {}",
            score, verdict
        ));

        insights.truncate(MAX_KEY_INSIGHTS);
        insights
    }

    pub fn spending_behavior(&self, analysis: &StructuredAnalysis) -> String {
        let average = analysis.summary.average_transaction_amount;
        let active_days = analysis.spending_patterns.total_spending_days;
        let top_share = analysis.top_category().map_or(0.0, |top| top.percentage);

        if average > Decimal::from(2000) {
            format!(
                "You tend to make larger, less frequent purchases with an average transaction of {}. \
                 Your spending is active on {} days during this period.",
                self.money(average),
                active_days
            )
        } else if average < Decimal::from(500) {
            format!(
                "You frequently make smaller purchases with an average transaction of {}. \
                 This suggests regular, day-to-day expense patterns across {} active days.",
                self.money(average),
                active_days
            )
        } else {
            let spread = if top_share > 50.0 {
                "Your expenses are concentrated in fewer categories."
            } else {
                "Your expenses are well-distributed across categories."
            };
            format!(
                "Your spending shows moderate transaction sizes averaging {} spread across {} days. {}",
                self.money(average),
                active_days,
                spread
            )
        }
    }

    pub fn immediate_recommendations(&self, analysis: &StructuredAnalysis) -> Vec<String> {
        let mut recommendations = Vec::new();

        if let Some(over) = analysis.budgets_with(BudgetHealth::OverBudget).next() {
            recommendations.push(format!(
                "Review and adjust spending in {} - currently over budget by {}",
                over.category_name,
                self.money(over.remaining.abs())
            ));
        }

        if let Some(top) = analysis.top_category().filter(|top| top.percentage > 40.0) {
            recommendations.push(format!(
                "Consider ways to reduce {} expenses, which represent {:.1}% of your total spending",
                top.name, top.percentage
            ));
        }

        if analysis.financial_health.score < 70 {
            recommendations.push(
                "Set up spending alerts for your top 3 expense categories to improve awareness"
                    .to_string(),
            );
        }

        if recommendations.is_empty() {
            recommendations.push(
                "Track your daily expenses more consistently to identify spending patterns"
                    .to_string(),
            );
            recommendations.push(
                "Review your largest expense category for potential cost reductions".to_string(),
            );
        }

        recommendations.truncate(MAX_ITEMS);
        recommendations
    }

    pub fn long_term_recommendations(&self, analysis: &StructuredAnalysis) -> Vec<String> {
        let mut recommendations = Vec::new();

        match analysis.budget_analysis.len() {
            0 => recommendations.push(
                "Create budgets for your top 3 spending categories to improve financial control"
                    .to_string(),
            ),
            1 | 2 => recommendations.push(
                "Expand your budgeting to cover more expense categories for comprehensive financial planning"
                    .to_string(),
            ),
            _ => {}
        }

        if analysis.financial_health.score < 80 {
            recommendations.push(
                "Develop a monthly spending plan to optimize your expense allocation across categories"
                    .to_string(),
            );
        }

        recommendations.push(
            "Build an emergency fund equivalent to 3-6 months of your average monthly expenses"
                .to_string(),
        );

        if analysis.summary.average_transaction_amount > Decimal::from(1500) {
            recommendations.push(
                "Consider planning larger purchases in advance to avoid impulsive spending decisions"
                    .to_string(),
            );
        }

        recommendations.truncate(MAX_ITEMS);
        recommendations
    }

    pub fn strengths(&self, analysis: &StructuredAnalysis) -> Vec<String> {
        let mut strengths = Vec::new();

        if analysis.summary.total_transactions > 0 {
            strengths.push("Consistent expense tracking and financial awareness".to_string());
        }

        let good = analysis.budgets_with(BudgetHealth::Good).count();
        if good > 0 {
            strengths.push(format!(
                "Successfully maintaining {} budget{} within limits",
                good,
                plural(good)
            ));
        }

        if analysis.financial_health.score >= 70 {
            strengths.push("Good overall financial health and expense management".to_string());
        }

        let categories = &analysis.top_spending_categories;
        if categories.len() >= 3 && categories[0].percentage < 60.0 {
            strengths.push("Well-diversified spending across multiple categories".to_string());
        }

        if strengths.is_empty() {
            strengths.push("Active engagement in expense monitoring".to_string());
            strengths.push("Willingness to analyze and improve financial habits".to_string());
        }

        strengths.truncate(MAX_ITEMS);
        strengths
    }

    pub fn improvements(&self, analysis: &StructuredAnalysis) -> Vec<String> {
        let mut improvements = Vec::new();

        if analysis.budgets_with(BudgetHealth::OverBudget).next().is_some() {
            improvements
                .push("Better adherence to budget limits in overspending categories".to_string());
        }

        if analysis.financial_health.score < 70 {
            improvements.push("Overall expense optimization and financial planning".to_string());
        }

        if let Some(top) = analysis.top_category().filter(|top| top.percentage > 50.0) {
            improvements.push(format!(
                "Diversify spending to reduce dependency on {} category",
                top.name
            ));
        }

        if analysis.budget_analysis.is_empty() {
            improvements.push("Implement budgeting system for better expense control".to_string());
        }

        if improvements.is_empty() {
            improvements.push("Fine-tune expense categorization for better insights".to_string());
            improvements.push("Develop more proactive spending strategies".to_string());
        }

        improvements.truncate(MAX_ITEMS);
        improvements
    }

    /// Over-budget overage first, then the count of budgets past the warning line.
    pub fn budget_alert(&self, analysis: &StructuredAnalysis) -> Option<String> {
        let over: Vec<_> = analysis.budgets_with(BudgetHealth::OverBudget).collect();
        if !over.is_empty() {
            let overage: Decimal = over.iter().map(|b| b.remaining.abs()).sum();
            return Some(format!(
                "{} budget{} exceeded by total of {}",
                over.len(),
                plural(over.len()),
                self.money(overage)
            ));
        }

        let warnings = analysis.budgets_with(BudgetHealth::Warning).count();
        if warnings > 0 {
            return Some(format!(
                "{} budget{} approaching limit (over {}% spent)",
                warnings,
                plural(warnings),
                self.warning_percent.normalize()
            ));
        }

        None
    }
}

fn plural(count: usize) -> &'static str {
    if count > 1 {
        "s"
    } else {
        ""
    }
}
