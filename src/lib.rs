#![doc(test(attr(deny(warnings))))]

//! Expense Core keeps budget spend reconciled with recorded expenses and turns
//! a window of expenses into structured reports with narrative insights.

pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod reports;
pub mod storage;
pub mod utils;

use std::sync::Once;

pub use crate::core::services::{
    BudgetChanges, BudgetOverview, BudgetService, CategoryService, ExpenseService, NewBudget,
    ReportRequest, ReportService, ServiceResult,
};
pub use errors::{ErrorKind, ExpenseError, Result};

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Expense Core tracing initialized.");
    });
}
