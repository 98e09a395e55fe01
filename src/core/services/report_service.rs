//! Report generation pipeline and report bookkeeping.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{
    PeriodWindow, Report, ReportPeriodKind, StructuredAnalysis, ValidatedInsights,
};
use crate::errors::ExpenseError;
use crate::reports::{
    build_prompt, extract_insights, CustomPeriod, InsightGenerator, InsightsEnhancer,
    ReportAggregator, ReportBudget, ReportExpense, ReportPeriodResolver,
};
use crate::storage::{in_transaction, read_only, Repository, StorageBackend};

use super::ServiceResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportRequest {
    pub report_type: ReportPeriodKind,
    #[serde(default)]
    pub custom_period: Option<CustomPeriod>,
}

impl ReportRequest {
    pub fn new(report_type: ReportPeriodKind) -> Self {
        Self {
            report_type,
            custom_period: None,
        }
    }

    pub fn custom(period: CustomPeriod) -> Self {
        Self {
            report_type: ReportPeriodKind::Custom,
            custom_period: Some(period),
        }
    }
}

pub struct ReportService;

impl ReportService {
    /// Resolves the window, records a `GENERATING` report, then analyses the
    /// window and completes it. Once the report exists, any failure marks it
    /// `FAILED` before the error is returned.
    pub fn generate(
        storage: &dyn StorageBackend,
        generator: Option<&dyn InsightGenerator>,
        config: &Config,
        user_id: Uuid,
        request: ReportRequest,
        now: NaiveDateTime,
    ) -> ServiceResult<Report> {
        let window = ReportPeriodResolver::resolve(
            request.report_type,
            request.custom_period.as_ref(),
            now,
        )?;
        let report = Report::generating(user_id, request.report_type, window, now);
        in_transaction(storage, |tx| tx.insert_report(report.clone()))?;
        tracing::debug!(report_id = %report.id, user_id = %user_id, "report generation started");

        match Self::complete(storage, generator, config, report.clone(), now) {
            Ok(completed) => {
                tracing::info!(
                    report_id = %completed.id,
                    user_id = %user_id,
                    total = %completed.total_expenses,
                    transactions = completed.total_transactions,
                    "report completed"
                );
                Ok(completed)
            }
            Err(err) => {
                tracing::error!(report_id = %report.id, error = %err, "report generation failed");
                if let Err(mark_err) = Self::mark_failed(storage, user_id, report.id, now) {
                    tracing::warn!(
                        report_id = %report.id,
                        error = %mark_err,
                        "could not mark report as failed"
                    );
                }
                Err(err)
            }
        }
    }

    pub fn get(storage: &dyn StorageBackend, user_id: Uuid, report_id: Uuid) -> ServiceResult<Report> {
        read_only(storage, |tx| fetch(tx, user_id, report_id))
    }

    /// The user's reports, newest first, optionally of one type.
    pub fn list(
        storage: &dyn StorageBackend,
        user_id: Uuid,
        report_type: Option<ReportPeriodKind>,
    ) -> ServiceResult<Vec<Report>> {
        let mut reports = read_only(storage, |tx| tx.reports_for_user(user_id))?;
        reports.retain(|report| report_type.map_or(true, |kind| report.report_type == kind));
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    pub fn mark_email_sent(
        storage: &dyn StorageBackend,
        user_id: Uuid,
        report_id: Uuid,
        at: NaiveDateTime,
    ) -> ServiceResult<Report> {
        in_transaction(storage, |tx| {
            let mut report = fetch(&*tx, user_id, report_id)?;
            report.record_email_sent(at)?;
            tx.update_report(&report)?;
            Ok(report)
        })
    }

    fn complete(
        storage: &dyn StorageBackend,
        generator: Option<&dyn InsightGenerator>,
        config: &Config,
        mut report: Report,
        now: NaiveDateTime,
    ) -> ServiceResult<Report> {
        let window = report.period();
        let (expenses, budgets) =
            read_only(storage, |tx| gather(tx, report.user_id, &window))?;
        let analysis = ReportAggregator::aggregate_with(
            &expenses,
            &budgets,
            window,
            config.warning_threshold_percent,
        )?;
        let insights = Self::insights(generator, config, report.report_type, &analysis);
        report.complete(analysis, insights, now)?;
        in_transaction(storage, |tx| tx.update_report(&report))?;
        Ok(report)
    }

    fn insights(
        generator: Option<&dyn InsightGenerator>,
        config: &Config,
        kind: ReportPeriodKind,
        analysis: &StructuredAnalysis,
    ) -> ValidatedInsights {
        let enhancer = InsightsEnhancer::from_config(config);
        let raw = generator.and_then(|generator| {
            let prompt = build_prompt(analysis, kind, &config.currency_symbol);
            match generator.try_generate(&prompt) {
                Ok(text) => extract_insights(&text),
                Err(err) => {
                    tracing::warn!(error = %err, "insight generation failed; using fallback");
                    None
                }
            }
        });
        enhancer.enhance(raw.as_ref(), analysis)
    }

    fn mark_failed(
        storage: &dyn StorageBackend,
        user_id: Uuid,
        report_id: Uuid,
        now: NaiveDateTime,
    ) -> ServiceResult<()> {
        in_transaction(storage, |tx| {
            let mut report = fetch(&*tx, user_id, report_id)?;
            report.fail(now)?;
            tx.update_report(&report)
        })
    }
}

fn fetch<R>(repo: &R, user_id: Uuid, report_id: Uuid) -> ServiceResult<Report>
where
    R: Repository + ?Sized,
{
    repo.report(user_id, report_id)?
        .ok_or_else(|| ExpenseError::not_found("Report", report_id))
}

/// Expenses dated inside the window and active budgets overlapping it, each
/// joined with its category name.
fn gather<R>(
    repo: &R,
    user_id: Uuid,
    window: &PeriodWindow,
) -> ServiceResult<(Vec<ReportExpense>, Vec<ReportBudget>)>
where
    R: Repository + ?Sized,
{
    let mut names: HashMap<Uuid, Option<String>> = HashMap::new();
    let mut name_of = |id: Uuid| -> ServiceResult<Option<String>> {
        if let Some(name) = names.get(&id) {
            return Ok(name.clone());
        }
        let name = repo.category(id)?.map(|category| category.name);
        names.insert(id, name.clone());
        Ok(name)
    };

    let mut expenses = Vec::new();
    for expense in repo.expenses_between(user_id, window)? {
        let name = name_of(expense.category_id)?;
        expenses.push(ReportExpense::new(expense, name));
    }
    let mut budgets = Vec::new();
    for budget in repo.budgets_overlapping(user_id, window)? {
        let name = match budget.category_id {
            Some(id) => name_of(id)?,
            None => None,
        };
        budgets.push(ReportBudget::new(budget, name));
    }
    Ok((expenses, budgets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, ReportStatus};
    use crate::errors::Result;
    use crate::storage::JsonStorage;
    use chrono::NaiveDate;

    struct Canned(&'static str);

    impl InsightGenerator for Canned {
        fn try_generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Offline;

    impl InsightGenerator for Offline {
        fn try_generate(&self, _prompt: &str) -> Result<String> {
            Err(ExpenseError::Upstream("generator offline".into()))
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn empty_month_completes_with_fallback_text() {
        let storage = JsonStorage::in_memory();
        let user = Uuid::new_v4();
        let report = ReportService::generate(
            &storage,
            None,
            &Config::default(),
            user,
            ReportRequest::new(ReportPeriodKind::Monthly),
            now(),
        )
        .unwrap();
        assert_eq!(report.status, ReportStatus::Completed);
        assert_eq!(report.title, "MONTHLY Expense Report");
        assert_eq!(report.total_transactions, 0);
        let insights = report.ai_insights.as_ref().unwrap();
        assert!(!insights.key_insights.is_empty());
        assert_eq!(ReportService::get(&storage, user, report.id).unwrap(), report);
    }

    #[test]
    fn generator_failure_falls_back() {
        let storage = JsonStorage::in_memory();
        let report = ReportService::generate(
            &storage,
            Some(&Offline),
            &Config::default(),
            Uuid::new_v4(),
            ReportRequest::new(ReportPeriodKind::Weekly),
            now(),
        )
        .unwrap();
        assert_eq!(report.status, ReportStatus::Completed);
        let analysis = report.structured_analysis.as_ref().unwrap();
        assert_eq!(
            report.ai_insights.as_ref().unwrap(),
            &InsightsEnhancer::default().fallback(analysis)
        );
    }

    #[test]
    fn generator_text_is_used_when_it_passes_checks() {
        let storage = JsonStorage::in_memory();
        let canned = Canned(
            "Sure! {\"keyInsights\": [\"You kept every purchase modest this week\"], \"budgetAlert\": \"ignored\"}",
        );
        let report = ReportService::generate(
            &storage,
            Some(&canned),
            &Config::default(),
            Uuid::new_v4(),
            ReportRequest::new(ReportPeriodKind::Weekly),
            now(),
        )
        .unwrap();
        let insights = report.ai_insights.unwrap();
        assert_eq!(
            insights.key_insights,
            vec!["You kept every purchase modest this week".to_string()]
        );
        assert_eq!(insights.budget_alert, None);
    }

    #[test]
    fn custom_without_bounds_creates_nothing() {
        let storage = JsonStorage::in_memory();
        let user = Uuid::new_v4();
        let err = ReportService::generate(
            &storage,
            None,
            &Config::default(),
            user,
            ReportRequest::new(ReportPeriodKind::Custom),
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, ExpenseError::MissingCustomPeriod));
        assert!(ReportService::list(&storage, user, None).unwrap().is_empty());
    }

    #[test]
    fn list_filters_by_type_and_email_needs_completion() {
        let storage = JsonStorage::in_memory();
        let user = Uuid::new_v4();
        in_transaction(&storage, |tx| {
            tx.insert_category(Category::system("Food", "utensils", now()))
        })
        .unwrap();
        let monthly = ReportService::generate(
            &storage,
            None,
            &Config::default(),
            user,
            ReportRequest::new(ReportPeriodKind::Monthly),
            now(),
        )
        .unwrap();
        ReportService::generate(
            &storage,
            None,
            &Config::default(),
            user,
            ReportRequest::custom(CustomPeriod::new("2024-01-01", "2024-01-31")),
            now(),
        )
        .unwrap();

        let only_monthly = ReportService::list(&storage, user, Some(ReportPeriodKind::Monthly)).unwrap();
        assert_eq!(only_monthly.len(), 1);
        assert_eq!(ReportService::list(&storage, user, None).unwrap().len(), 2);

        let sent = ReportService::mark_email_sent(&storage, user, monthly.id, now()).unwrap();
        assert!(sent.email_sent);
        assert_eq!(sent.email_sent_at, Some(now()));

        let stuck = Report::generating(
            user,
            ReportPeriodKind::Weekly,
            PeriodWindow::new(now(), now()).unwrap(),
            now(),
        );
        let stuck_id = stuck.id;
        in_transaction(&storage, |tx| tx.insert_report(stuck)).unwrap();
        let err = ReportService::mark_email_sent(&storage, user, stuck_id, now()).unwrap_err();
        assert!(matches!(err, ExpenseError::Conflict(_)));
    }
}
