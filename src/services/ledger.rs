use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{Result, SaverlyError};
use crate::models::{
    CategoryTotal, DashboardStats, MonthlySummary, NewNote, NewReminder, NewTransaction, Note,
    Reminder, Transaction, TransactionKind,
};
use crate::utils::now_rfc3339;

const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    /// `YYYY-MM`.
    pub month: Option<String>,
}

pub fn add_transaction(db: &Database, payload: NewTransaction) -> Result<Transaction> {
    payload.validate()?;
    let transaction = Transaction {
        id: Uuid::new_v4().to_string(),
        kind: payload.kind,
        title: payload.title,
        amount: payload.amount,
        category: payload.category,
        date: payload.date,
        note: payload.note,
        created_at: now_rfc3339(),
    };
    db.insert_transaction(&transaction)?;
    info!(kind = transaction.kind.as_str(), "transaction recorded");
    Ok(transaction)
}

pub fn list_transactions(db: &Database, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
    let transactions = match &filter.month {
        Some(month) => {
            validate_year_month(month)?;
            db.list_transactions_in_month(month)?
        }
        None => db.list_transactions()?,
    };

    Ok(transactions
        .into_iter()
        .filter(|t| filter.kind.map_or(true, |kind| t.kind == kind))
        .filter(|t| {
            filter
                .category
                .as_deref()
                .map_or(true, |category| t.category == category)
        })
        .collect())
}

pub fn delete_transaction(db: &Database, id: &str) -> Result<()> {
    if !db.delete_transaction(id)? {
        return Err(SaverlyError::NotFound("transaction"));
    }
    Ok(())
}

pub fn monthly_summary(db: &Database, year_month: &str) -> Result<MonthlySummary> {
    validate_year_month(year_month)?;
    let transactions = db.list_transactions_in_month(year_month)?;
    let mut total_income = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;
    for transaction in &transactions {
        match transaction.kind {
            TransactionKind::Income => total_income += transaction.amount,
            TransactionKind::Expense => total_expenses += transaction.amount,
        }
    }

    Ok(MonthlySummary {
        month: year_month.to_string(),
        total_income,
        total_expenses,
        balance: total_income - total_expenses,
    })
}

/// Per-category expense totals for one month, largest first.
pub fn expenses_by_category(db: &Database, year_month: &str) -> Result<Vec<CategoryTotal>> {
    validate_year_month(year_month)?;
    let transactions = db.list_transactions_in_month(year_month)?;
    let mut totals: Vec<CategoryTotal> = Vec::new();
    for transaction in transactions {
        if transaction.kind != TransactionKind::Expense {
            continue;
        }
        match totals.iter_mut().find(|t| t.category == transaction.category) {
            Some(entry) => entry.total += transaction.amount,
            None => totals.push(CategoryTotal {
                category: transaction.category,
                total: transaction.amount,
            }),
        }
    }
    totals.sort_by(|a, b| b.total.cmp(&a.total));
    Ok(totals)
}

pub fn dashboard_stats(db: &Database, year_month: &str, months_back: u32) -> Result<DashboardStats> {
    let summary = monthly_summary(db, year_month)?;
    let expenses = expenses_by_category(db, year_month)?;

    let mut recent = db.list_transactions()?;
    recent.truncate(RECENT_LIMIT);

    let monthly_series = build_monthly_series(db, year_month, months_back)?;

    Ok(DashboardStats {
        total_income: summary.total_income,
        total_expenses: summary.total_expenses,
        balance: summary.balance,
        expenses_by_category: expenses,
        recent_transactions: recent,
        monthly_series,
    })
}

/// The month bucket match is textual (`substr(date, 1, 7)`), so a
/// non-canonical key like `2024-7` would silently match nothing. Reject
/// anything that is not zero-padded `YYYY-MM`.
fn validate_year_month(year_month: &str) -> Result<()> {
    let bytes = year_month.as_bytes();
    let shape_ok = bytes.len() == 7
        && bytes[4] == b'-'
        && bytes[..4].iter().all(|b| b.is_ascii_digit())
        && bytes[5..].iter().all(|b| b.is_ascii_digit());
    let month_ok = shape_ok && {
        let month = (bytes[5] - b'0') * 10 + (bytes[6] - b'0');
        (1..=12).contains(&month)
    };
    if !month_ok {
        return Err(SaverlyError::Parse(format!(
            "year-month `{}` must be YYYY-MM",
            year_month
        )));
    }
    Ok(())
}

fn build_monthly_series(
    db: &Database,
    current_year_month: &str,
    months_back: u32,
) -> Result<Vec<MonthlySummary>> {
    validate_year_month(current_year_month)?;
    let base_date = NaiveDate::parse_from_str(&format!("{}-01", current_year_month), "%Y-%m-%d")
        .map_err(|e| SaverlyError::Parse(format!("year-month `{}`: {}", current_year_month, e)))?;

    let mut series = Vec::new();
    for offset in (0..months_back).rev() {
        let date = base_date
            .checked_sub_months(Months::new(offset))
            .ok_or_else(|| SaverlyError::Parse("month offset out of range".to_string()))?;
        let ym = format!("{}-{:02}", date.year(), date.month());
        series.push(monthly_summary(db, &ym)?);
    }
    Ok(series)
}

pub fn add_reminder(db: &Database, payload: NewReminder) -> Result<Reminder> {
    payload.validate()?;
    let reminder = Reminder {
        id: Uuid::new_v4().to_string(),
        title: payload.title,
        date: payload.date,
        note: payload.note,
        created_at: now_rfc3339(),
    };
    db.insert_reminder(&reminder)?;
    Ok(reminder)
}

pub fn list_reminders(db: &Database) -> Result<Vec<Reminder>> {
    db.list_reminders()
}

pub fn upcoming_reminders(db: &Database, from: NaiveDate) -> Result<Vec<Reminder>> {
    Ok(db
        .list_reminders()?
        .into_iter()
        .filter(|r| r.date >= from)
        .collect())
}

pub fn delete_reminder(db: &Database, id: &str) -> Result<()> {
    if !db.delete_reminder(id)? {
        return Err(SaverlyError::NotFound("reminder"));
    }
    Ok(())
}

pub fn add_note(db: &Database, payload: NewNote) -> Result<Note> {
    payload.validate()?;
    let now = now_rfc3339();
    let note = Note {
        id: Uuid::new_v4().to_string(),
        title: payload.title,
        content: payload.content,
        created_at: now.clone(),
        updated_at: now,
    };
    db.insert_note(&note)?;
    Ok(note)
}

pub fn list_notes(db: &Database) -> Result<Vec<Note>> {
    db.list_notes()
}

pub fn update_note(db: &Database, id: &str, payload: NewNote) -> Result<Note> {
    payload.validate()?;
    let updated_at = now_rfc3339();
    if !db.update_note(id, &payload.title, &payload.content, &updated_at)? {
        return Err(SaverlyError::NotFound("note"));
    }
    db.get_note(id)?.ok_or(SaverlyError::NotFound("note"))
}

pub fn delete_note(db: &Database, id: &str) -> Result<()> {
    if !db.delete_note(id)? {
        return Err(SaverlyError::NotFound("note"));
    }
    Ok(())
}
