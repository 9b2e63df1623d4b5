use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::PathBuf;

use crate::error::Result;
use crate::models::{
    Invoice, InvoiceLineItem, InvoiceStatus, Note, Reminder, Transaction, TransactionKind,
};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::from_connection(conn)
    }

    /// In-memory database, used by tests and throwaway sessions.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mut db = Database { conn };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL
            );",
        )?;

        let migrations = vec![
            (
                "001_create_invoices.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/001_create_invoices.sql"
                )),
            ),
            (
                "002_create_ledger.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/002_create_ledger.sql"
                )),
            ),
            (
                "003_create_settings.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/003_create_settings.sql"
                )),
            ),
        ];

        for (name, sql) in migrations {
            let applied: Option<String> = self
                .conn
                .query_row(
                    "SELECT name FROM schema_migrations WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;

            if applied.is_none() {
                let tx = self.conn.transaction()?;
                tx.execute_batch(sql)?;
                tx.execute(
                    "INSERT INTO schema_migrations (name, applied_at) VALUES (?1, datetime('now'))",
                    params![name],
                )?;
                tx.commit()?;
            }
        }

        Ok(())
    }

    pub fn upsert_invoice(&self, invoice: &Invoice) -> Result<()> {
        let items_json = serde_json::to_string(&invoice.items)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO invoices (
                id, invoice_number, client_name, client_email, issue_date, due_date,
                items_json, tax_rate_percent, sub_total, tax_amount, grand_total,
                status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                invoice.id,
                invoice.invoice_number,
                invoice.client_name,
                invoice.client_email,
                invoice.issue_date,
                invoice.due_date,
                items_json,
                invoice.tax_rate_percent.to_string(),
                invoice.sub_total.to_string(),
                invoice.tax_amount.to_string(),
                invoice.grand_total.to_string(),
                invoice.status.as_str(),
                invoice.created_at,
                invoice.updated_at
            ],
        )?;
        Ok(())
    }

    pub fn get_invoice(&self, id: &str) -> Result<Option<Invoice>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, invoice_number, client_name, client_email, issue_date, due_date,
                    items_json, tax_rate_percent, sub_total, tax_amount, grand_total,
                    status, created_at, updated_at
             FROM invoices WHERE id = ?1",
        )?;

        let invoice = stmt
            .query_row(params![id], invoice_from_row)
            .optional()?;
        Ok(invoice)
    }

    pub fn list_invoices(&self) -> Result<Vec<Invoice>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, invoice_number, client_name, client_email, issue_date, due_date,
                    items_json, tax_rate_percent, sub_total, tax_amount, grand_total,
                    status, created_at, updated_at
             FROM invoices
             ORDER BY issue_date DESC, created_at DESC",
        )?;

        let rows = stmt.query_map([], invoice_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn delete_invoice(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM invoices WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn insert_transaction(&self, transaction: &Transaction) -> Result<()> {
        self.conn.execute(
            "INSERT INTO transactions (id, kind, title, amount, category, date, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                transaction.id,
                transaction.kind.as_str(),
                transaction.title,
                transaction.amount.to_string(),
                transaction.category,
                transaction.date,
                transaction.note,
                transaction.created_at
            ],
        )?;
        Ok(())
    }

    pub fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, title, amount, category, date, note, created_at
             FROM transactions
             ORDER BY date DESC, created_at DESC",
        )?;

        let rows = stmt.query_map([], transaction_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn list_transactions_in_month(&self, year_month: &str) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, title, amount, category, date, note, created_at
             FROM transactions
             WHERE substr(date, 1, 7) = ?1
             ORDER BY date DESC, created_at DESC",
        )?;

        let rows = stmt.query_map(params![year_month], transaction_from_row)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn delete_transaction(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn insert_reminder(&self, reminder: &Reminder) -> Result<()> {
        self.conn.execute(
            "INSERT INTO reminders (id, title, date, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                reminder.id,
                reminder.title,
                reminder.date,
                reminder.note,
                reminder.created_at
            ],
        )?;
        Ok(())
    }

    pub fn list_reminders(&self) -> Result<Vec<Reminder>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, date, note, created_at
             FROM reminders
             ORDER BY date ASC, created_at ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Reminder {
                id: row.get(0)?,
                title: row.get(1)?,
                date: row.get(2)?,
                note: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn delete_reminder(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM reminders WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn insert_note(&self, note: &Note) -> Result<()> {
        self.conn.execute(
            "INSERT INTO notes (id, title, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![note.id, note.title, note.content, note.created_at, note.updated_at],
        )?;
        Ok(())
    }

    pub fn get_note(&self, id: &str) -> Result<Option<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, created_at, updated_at FROM notes WHERE id = ?1",
        )?;
        let note = stmt
            .query_row(params![id], |row| {
                Ok(Note {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    content: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                })
            })
            .optional()?;
        Ok(note)
    }

    pub fn list_notes(&self) -> Result<Vec<Note>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, content, created_at, updated_at
             FROM notes
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Note {
                id: row.get(0)?,
                title: row.get(1)?,
                content: row.get(2)?,
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    pub fn update_note(&self, id: &str, title: &str, content: &str, updated_at: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE notes SET title = ?2, content = ?3, updated_at = ?4 WHERE id = ?1",
            params![id, title, content, updated_at],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_note(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM settings WHERE key = ?1")?;
        let value = stmt
            .query_row(params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn remove_setting(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Writes `value` only if the stored value still equals `expected`.
    /// `expected = None` means "only insert if the key is absent". Returns
    /// whether the swap took place.
    pub fn swap_setting(&self, key: &str, expected: Option<&str>, value: &str) -> Result<bool> {
        let changed = match expected {
            Some(expected) => self.conn.execute(
                "UPDATE settings SET value = ?3, updated_at = datetime('now')
                 WHERE key = ?1 AND value = ?2",
                params![key, expected, value],
            )?,
            None => self.conn.execute(
                "INSERT INTO settings (key, value, updated_at)
                 VALUES (?1, ?2, datetime('now'))
                 ON CONFLICT(key) DO NOTHING",
                params![key, value],
            )?,
        };
        Ok(changed > 0)
    }
}

fn invoice_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Invoice> {
    let items_json: String = row.get(6)?;
    let items: Vec<InvoiceLineItem> = serde_json::from_str(&items_json)
        .map_err(|e| conversion_error(6, e))?;
    let status_text: String = row.get(11)?;
    let status = InvoiceStatus::parse(&status_text).map_err(|e| conversion_error(11, e))?;

    Ok(Invoice {
        id: row.get(0)?,
        invoice_number: row.get(1)?,
        client_name: row.get(2)?,
        client_email: row.get(3)?,
        issue_date: row.get(4)?,
        due_date: row.get(5)?,
        items,
        tax_rate_percent: decimal_column(row, 7)?,
        sub_total: decimal_column(row, 8)?,
        tax_amount: decimal_column(row, 9)?,
        grand_total: decimal_column(row, 10)?,
        status,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn transaction_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    let kind_text: String = row.get(1)?;
    let kind = TransactionKind::parse(&kind_text).map_err(|e| conversion_error(1, e))?;

    Ok(Transaction {
        id: row.get(0)?,
        kind,
        title: row.get(2)?,
        amount: decimal_column(row, 3)?,
        category: row.get(4)?,
        date: row.get(5)?,
        note: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn decimal_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    text.parse::<Decimal>().map_err(|e| conversion_error(idx, e))
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}
