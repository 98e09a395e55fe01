//! Generated expense reports and their lifecycle.

use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    analysis::StructuredAnalysis, common::*, insights::ValidatedInsights,
};
use crate::errors::{ExpenseError, Result};

/// Window kinds a report can summarize. Differs from budget kinds: reports
/// support quarters and caller-supplied ranges.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportPeriodKind {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    Custom,
}

impl ReportPeriodKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportPeriodKind::Weekly => "WEEKLY",
            ReportPeriodKind::Monthly => "MONTHLY",
            ReportPeriodKind::Quarterly => "QUARTERLY",
            ReportPeriodKind::Yearly => "YEARLY",
            ReportPeriodKind::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for ReportPeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportPeriodKind {
    type Err = ExpenseError;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "WEEKLY" => Ok(ReportPeriodKind::Weekly),
            "MONTHLY" => Ok(ReportPeriodKind::Monthly),
            "QUARTERLY" => Ok(ReportPeriodKind::Quarterly),
            "YEARLY" => Ok(ReportPeriodKind::Yearly),
            "CUSTOM" => Ok(ReportPeriodKind::Custom),
            _ => Err(ExpenseError::InvalidPeriodKind(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Generating,
    Completed,
    Failed,
}

impl ReportStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ReportStatus::Generating)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub id: Uuid,
    pub user_id: Uuid,
    pub report_type: ReportPeriodKind,
    pub title: String,
    pub period_start: NaiveDateTime,
    pub period_end: NaiveDateTime,
    pub total_expenses: Decimal,
    pub total_transactions: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_analysis: Option<StructuredAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_insights: Option<ValidatedInsights>,
    pub status: ReportStatus,
    pub email_sent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_sent_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Report {
    pub fn generating(
        user_id: Uuid,
        report_type: ReportPeriodKind,
        period: PeriodWindow,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            report_type,
            title: format!("{} Expense Report", report_type),
            period_start: period.start,
            period_end: period.end,
            total_expenses: Decimal::ZERO,
            total_transactions: 0,
            structured_analysis: None,
            ai_insights: None,
            status: ReportStatus::Generating,
            email_sent: false,
            email_sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn period(&self) -> PeriodWindow {
        PeriodWindow {
            start: self.period_start,
            end: self.period_end,
        }
    }

    pub fn complete(
        &mut self,
        analysis: StructuredAnalysis,
        insights: ValidatedInsights,
        now: NaiveDateTime,
    ) -> Result<()> {
        self.ensure_generating()?;
        self.total_expenses = analysis.summary.total_expenses;
        self.total_transactions = analysis.summary.total_transactions;
        self.structured_analysis = Some(analysis);
        self.ai_insights = Some(insights);
        self.status = ReportStatus::Completed;
        self.updated_at = now;
        Ok(())
    }

    pub fn fail(&mut self, now: NaiveDateTime) -> Result<()> {
        self.ensure_generating()?;
        self.status = ReportStatus::Failed;
        self.updated_at = now;
        Ok(())
    }

    pub fn record_email_sent(&mut self, at: NaiveDateTime) -> Result<()> {
        if self.status != ReportStatus::Completed {
            return Err(ExpenseError::Conflict(format!(
                "report {} is not completed",
                self.id
            )));
        }
        self.email_sent = true;
        self.email_sent_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    fn ensure_generating(&self) -> Result<()> {
        if self.status.is_terminal() {
            return Err(ExpenseError::Conflict(format!(
                "report {} is already {:?}",
                self.id, self.status
            )));
        }
        Ok(())
    }
}

impl Identifiable for Report {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for Report {
    fn owner(&self) -> Uuid {
        self.user_id
    }
}
