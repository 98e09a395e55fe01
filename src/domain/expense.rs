//! Expense records and their editable fields.

use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::*;

pub const DEFAULT_CURRENCY: &str = "INR";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    BankTransfer,
    Upi,
    Cheque,
    Wallet,
    Other,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::DebitCard => "DEBIT_CARD",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::Cheque => "CHEQUE",
            PaymentMethod::Wallet => "WALLET",
            PaymentMethod::Other => "OTHER",
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Other
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseStatus {
    Pending,
    Approved,
    Rejected,
}

impl Default for ExpenseStatus {
    fn default() -> Self {
        ExpenseStatus::Pending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    pub expense_date: NaiveDateTime,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<ExpenseLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub is_verified: bool,
    pub status: ExpenseStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// The fields that decide which budgets an expense contributes to, and by how much.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetContext {
    pub amount: Decimal,
    pub category_id: Uuid,
    pub expense_date: NaiveDateTime,
}

impl Expense {
    pub fn from_new(user_id: Uuid, input: NewExpense, now: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            category_id: input.category_id,
            amount: input.amount,
            currency: input
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            description: input.description,
            merchant_name: input.merchant_name,
            expense_date: input.expense_date,
            payment_method: input.payment_method.unwrap_or_default(),
            location: input.location,
            notes: input.notes,
            is_verified: input.is_verified,
            status: input.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn budget_context(&self) -> BudgetContext {
        BudgetContext {
            amount: self.amount,
            category_id: self.category_id,
            expense_date: self.expense_date,
        }
    }

    /// Applies every populated field of `changes` in place.
    pub fn apply(&mut self, changes: ExpenseChanges, now: NaiveDateTime) {
        if let Some(category_id) = changes.category_id {
            self.category_id = category_id;
        }
        if let Some(amount) = changes.amount {
            self.amount = amount;
        }
        if let Some(currency) = changes.currency {
            self.currency = currency;
        }
        if let Some(description) = changes.description {
            self.description = Some(description);
        }
        if let Some(merchant_name) = changes.merchant_name {
            self.merchant_name = Some(merchant_name);
        }
        if let Some(expense_date) = changes.expense_date {
            self.expense_date = expense_date;
        }
        if let Some(payment_method) = changes.payment_method {
            self.payment_method = payment_method;
        }
        if let Some(location) = changes.location {
            self.location = Some(location);
        }
        if let Some(notes) = changes.notes {
            self.notes = Some(notes);
        }
        if let Some(is_verified) = changes.is_verified {
            self.is_verified = is_verified;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        self.updated_at = now;
    }
}

impl Identifiable for Expense {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Owned for Expense {
    fn owner(&self) -> Uuid {
        self.user_id
    }
}

/// Input for recording a new expense.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewExpense {
    pub category_id: Uuid,
    pub amount: Decimal,
    pub expense_date: NaiveDateTime,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub location: Option<ExpenseLocation>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub status: Option<ExpenseStatus>,
}

impl NewExpense {
    pub fn new(category_id: Uuid, amount: Decimal, expense_date: NaiveDateTime) -> Self {
        Self {
            category_id,
            amount,
            expense_date,
            currency: None,
            description: None,
            merchant_name: None,
            payment_method: None,
            location: None,
            notes: None,
            is_verified: false,
            status: None,
        }
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update for an existing expense; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExpenseChanges {
    pub category_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub merchant_name: Option<String>,
    pub expense_date: Option<NaiveDateTime>,
    pub payment_method: Option<PaymentMethod>,
    pub location: Option<ExpenseLocation>,
    pub notes: Option<String>,
    pub is_verified: Option<bool>,
    pub status: Option<ExpenseStatus>,
}
