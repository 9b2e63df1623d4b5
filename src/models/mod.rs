use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::error::{Result, SaverlyError};
use crate::utils::{parse_amount, parse_date};

pub const PIN_LENGTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Unpaid,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "Unpaid",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Overdue => "Overdue",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "Unpaid" => Ok(InvoiceStatus::Unpaid),
            "Paid" => Ok(InvoiceStatus::Paid),
            "Overdue" => Ok(InvoiceStatus::Overdue),
            other => Err(SaverlyError::Parse(format!("invoice status `{}`", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// quantity * unit_price, recomputed on every write.
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub client_name: String,
    pub client_email: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub items: Vec<InvoiceLineItem>,
    pub tax_rate_percent: Decimal,
    pub sub_total: Decimal,
    pub tax_amount: Decimal,
    pub grand_total: Decimal,
    pub status: InvoiceStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub sub_total: Decimal,
    pub tax_amount: Decimal,
    pub grand_total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLineItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvoice {
    pub client_name: String,
    pub client_email: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub items: Vec<NewLineItem>,
    pub tax_rate_percent: Decimal,
    pub status: InvoiceStatus,
}

impl NewInvoice {
    pub fn validate(&self) -> Result<()> {
        if self.client_name.trim().is_empty() {
            return Err(SaverlyError::validation("client_name", "must not be empty"));
        }
        if !self.client_email.validate_email() {
            return Err(SaverlyError::validation("client_email", "invalid email address"));
        }
        if self.due_date < self.issue_date {
            return Err(SaverlyError::validation(
                "due_date",
                "must be on or after the issue date",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(SaverlyError::Parse(format!("transaction kind `{}`", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub kind: TransactionKind,
    pub title: String,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub title: String,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl NewTransaction {
    /// Builds a payload from raw form input, coercing the amount and date
    /// strings (comma decimals and the common local date formats).
    pub fn from_form(
        kind: &str,
        title: &str,
        amount: &str,
        category: &str,
        date: &str,
        note: Option<String>,
    ) -> Result<Self> {
        Ok(NewTransaction {
            kind: TransactionKind::parse(kind)?,
            title: title.to_string(),
            amount: parse_amount(amount)?,
            category: category.to_string(),
            date: parse_date(date)?,
            note,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(SaverlyError::validation("title", "must not be empty"));
        }
        if self.amount <= Decimal::ZERO {
            return Err(SaverlyError::validation("amount", "must be positive"));
        }
        if self.category.trim().is_empty() {
            return Err(SaverlyError::validation("category", "must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReminder {
    pub title: String,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl NewReminder {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(SaverlyError::validation("title", "must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub content: String,
}

impl NewNote {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(SaverlyError::validation("title", "must not be empty"));
        }
        if self.content.trim().is_empty() {
            return Err(SaverlyError::validation("content", "must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub currency: String,
    pub language: String,
    pub reminder_notifications: bool,
    pub summary_notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            currency: "bdt".to_string(),
            language: "bn".to_string(),
            reminder_notifications: false,
            summary_notifications: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month: String,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
    pub expenses_by_category: Vec<CategoryTotal>,
    pub recent_transactions: Vec<Transaction>,
    pub monthly_series: Vec<MonthlySummary>,
}
