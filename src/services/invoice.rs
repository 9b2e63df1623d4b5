use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{Result, SaverlyError};
use crate::models::{Invoice, InvoiceLineItem, InvoiceStatus, InvoiceTotals, NewInvoice, NewLineItem};
use crate::utils::{format_amount, now_rfc3339, round2};

/// Derives subtotal, tax and grand total from line items and a tax rate.
///
/// The subtotal is the exact sum of `quantity * unit_price` over the items;
/// only the tax amount is rounded to two decimal places, so
/// `grand_total == sub_total + tax_amount` holds exactly.
pub fn compute_totals(items: &[NewLineItem], tax_rate_percent: Decimal) -> Result<InvoiceTotals> {
    if items.is_empty() {
        return Err(SaverlyError::validation("items", "at least one line item is required"));
    }
    if tax_rate_percent < Decimal::ZERO || tax_rate_percent > Decimal::from(100) {
        return Err(SaverlyError::validation(
            "tax_rate_percent",
            "must be between 0 and 100",
        ));
    }

    let mut sub_total = Decimal::ZERO;
    for (index, item) in items.iter().enumerate() {
        if item.name.trim().is_empty() {
            return Err(SaverlyError::validation(
                format!("items[{}].name", index),
                "must not be empty",
            ));
        }
        if item.quantity < 1 {
            return Err(SaverlyError::validation(
                format!("items[{}].quantity", index),
                "must be at least 1",
            ));
        }
        if item.unit_price < Decimal::ZERO {
            return Err(SaverlyError::validation(
                format!("items[{}].unit_price", index),
                "must be 0 or greater",
            ));
        }
        sub_total += Decimal::from(item.quantity) * item.unit_price;
    }

    let tax_amount = round2(sub_total * tax_rate_percent / Decimal::from(100));
    let grand_total = sub_total + tax_amount;

    Ok(InvoiceTotals {
        sub_total,
        tax_amount,
        grand_total,
    })
}

/// Formats a human-readable invoice number: `{prefix}-{YY}{MM}-{4 digits}`,
/// e.g. `INV-2407-1234`. The suffix is random and this function alone makes
/// no uniqueness guarantee; callers that need one must check against
/// existing invoices.
pub fn generate_invoice_number(prefix: &str, date: NaiveDate) -> String {
    let suffix = 1000 + (Uuid::new_v4().as_u128() % 9000) as u32;
    format!(
        "{}-{:02}{:02}-{}",
        prefix,
        date.year() % 100,
        date.month(),
        suffix
    )
}

pub fn create_invoice(db: &Database, payload: NewInvoice) -> Result<Invoice> {
    payload.validate()?;
    let totals = compute_totals(&payload.items, payload.tax_rate_percent)?;

    let now = now_rfc3339();
    let invoice = Invoice {
        id: Uuid::new_v4().to_string(),
        invoice_number: generate_invoice_number("INV", payload.issue_date),
        client_name: payload.client_name,
        client_email: payload.client_email,
        issue_date: payload.issue_date,
        due_date: payload.due_date,
        items: build_line_items(&payload.items),
        tax_rate_percent: payload.tax_rate_percent,
        sub_total: totals.sub_total,
        tax_amount: totals.tax_amount,
        grand_total: totals.grand_total,
        status: payload.status,
        created_at: now.clone(),
        updated_at: now,
    };

    db.upsert_invoice(&invoice)?;
    info!(
        invoice_number = %invoice.invoice_number,
        grand_total = %format_amount(invoice.grand_total),
        "invoice created"
    );
    Ok(invoice)
}

/// Replaces an invoice's editable fields. The id, invoice number and
/// creation timestamp are preserved; totals are recomputed from the new
/// items and tax rate, never taken from the caller.
pub fn update_invoice(db: &Database, invoice_id: &str, payload: NewInvoice) -> Result<Invoice> {
    payload.validate()?;
    let totals = compute_totals(&payload.items, payload.tax_rate_percent)?;

    let existing = db
        .get_invoice(invoice_id)?
        .ok_or(SaverlyError::NotFound("invoice"))?;

    let invoice = Invoice {
        id: existing.id,
        invoice_number: existing.invoice_number,
        client_name: payload.client_name,
        client_email: payload.client_email,
        issue_date: payload.issue_date,
        due_date: payload.due_date,
        items: build_line_items(&payload.items),
        tax_rate_percent: payload.tax_rate_percent,
        sub_total: totals.sub_total,
        tax_amount: totals.tax_amount,
        grand_total: totals.grand_total,
        status: payload.status,
        created_at: existing.created_at,
        updated_at: now_rfc3339(),
    };

    db.upsert_invoice(&invoice)?;
    Ok(invoice)
}

pub fn set_invoice_status(db: &Database, invoice_id: &str, status: InvoiceStatus) -> Result<Invoice> {
    let mut invoice = db
        .get_invoice(invoice_id)?
        .ok_or(SaverlyError::NotFound("invoice"))?;
    invoice.status = status;
    invoice.updated_at = now_rfc3339();
    db.upsert_invoice(&invoice)?;
    Ok(invoice)
}

pub fn get_invoice(db: &Database, invoice_id: &str) -> Result<Invoice> {
    db.get_invoice(invoice_id)?
        .ok_or(SaverlyError::NotFound("invoice"))
}

pub fn list_invoices(db: &Database) -> Result<Vec<Invoice>> {
    db.list_invoices()
}

pub fn delete_invoice(db: &Database, invoice_id: &str) -> Result<()> {
    if !db.delete_invoice(invoice_id)? {
        return Err(SaverlyError::NotFound("invoice"));
    }
    Ok(())
}

fn build_line_items(items: &[NewLineItem]) -> Vec<InvoiceLineItem> {
    items
        .iter()
        .map(|item| InvoiceLineItem {
            id: Uuid::new_v4().to_string(),
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: Decimal::from(item.quantity) * item.unit_price,
        })
        .collect()
}
