use chrono::NaiveDate;
use rust_decimal_macros::dec;

use saverly::db::Database;
use saverly::models::{InvoiceStatus, NewInvoice, NewLineItem};
use saverly::services::invoice;
use saverly::SaverlyError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn sample_payload() -> NewInvoice {
    NewInvoice {
        client_name: "Rahim Traders".to_string(),
        client_email: "rahim@example.com".to_string(),
        issue_date: date(2024, 7, 15),
        due_date: date(2024, 8, 14),
        items: vec![
            NewLineItem {
                name: "Consulting".to_string(),
                quantity: 2,
                unit_price: dec!(10.00),
            },
            NewLineItem {
                name: "Hosting".to_string(),
                quantity: 1,
                unit_price: dec!(5.50),
            },
        ],
        tax_rate_percent: dec!(10),
        status: InvoiceStatus::Unpaid,
    }
}

#[test]
fn create_persists_computed_totals() {
    let db = Database::open_in_memory().expect("db");
    let created = invoice::create_invoice(&db, sample_payload()).expect("create");

    assert_eq!(created.sub_total, dec!(25.50));
    assert_eq!(created.tax_amount, dec!(2.55));
    assert_eq!(created.grand_total, dec!(28.05));
    assert!(created.invoice_number.starts_with("INV-2407-"));

    let loaded = invoice::get_invoice(&db, &created.id).expect("get");
    assert_eq!(loaded.grand_total, created.grand_total);
    assert_eq!(loaded.items.len(), 2);
    assert_eq!(loaded.items[0].line_total, dec!(20.00));
    assert_eq!(loaded.status, InvoiceStatus::Unpaid);
}

#[test]
fn update_recomputes_totals_and_keeps_identity() {
    let db = Database::open_in_memory().expect("db");
    let created = invoice::create_invoice(&db, sample_payload()).expect("create");

    let mut payload = sample_payload();
    payload.items = vec![NewLineItem {
        name: "Consulting".to_string(),
        quantity: 4,
        unit_price: dec!(10.00),
    }];
    payload.tax_rate_percent = dec!(0);

    let updated = invoice::update_invoice(&db, &created.id, payload).expect("update");
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.invoice_number, created.invoice_number);
    assert_eq!(updated.sub_total, dec!(40.00));
    assert_eq!(updated.tax_amount, dec!(0.00));
    assert_eq!(updated.grand_total, dec!(40.00));
}

#[test]
fn status_transitions_are_persisted() {
    let db = Database::open_in_memory().expect("db");
    let created = invoice::create_invoice(&db, sample_payload()).expect("create");

    invoice::set_invoice_status(&db, &created.id, InvoiceStatus::Paid).expect("set status");
    let loaded = invoice::get_invoice(&db, &created.id).expect("get");
    assert_eq!(loaded.status, InvoiceStatus::Paid);
}

#[test]
fn listing_orders_by_issue_date_descending() {
    let db = Database::open_in_memory().expect("db");

    let mut older = sample_payload();
    older.issue_date = date(2024, 5, 1);
    older.due_date = date(2024, 6, 1);
    invoice::create_invoice(&db, older).expect("create older");

    let mut newer = sample_payload();
    newer.issue_date = date(2024, 7, 1);
    newer.due_date = date(2024, 8, 1);
    let newer = invoice::create_invoice(&db, newer).expect("create newer");

    let invoices = invoice::list_invoices(&db).expect("list");
    assert_eq!(invoices.len(), 2);
    assert_eq!(invoices[0].id, newer.id);
}

#[test]
fn rejects_invalid_client_fields_and_dates() {
    let db = Database::open_in_memory().expect("db");

    let mut payload = sample_payload();
    payload.client_email = "not-an-email".to_string();
    let err = invoice::create_invoice(&db, payload).unwrap_err();
    assert!(matches!(err, SaverlyError::Validation { ref field, .. } if field == "client_email"));

    let mut payload = sample_payload();
    payload.due_date = date(2024, 7, 1); // before the issue date
    let err = invoice::create_invoice(&db, payload).unwrap_err();
    assert!(matches!(err, SaverlyError::Validation { ref field, .. } if field == "due_date"));

    let mut payload = sample_payload();
    payload.items.clear();
    let err = invoice::create_invoice(&db, payload).unwrap_err();
    assert!(matches!(err, SaverlyError::Validation { ref field, .. } if field == "items"));
}

#[test]
fn delete_and_missing_lookups_report_not_found() {
    let db = Database::open_in_memory().expect("db");
    let created = invoice::create_invoice(&db, sample_payload()).expect("create");

    invoice::delete_invoice(&db, &created.id).expect("delete");
    assert!(matches!(
        invoice::get_invoice(&db, &created.id),
        Err(SaverlyError::NotFound("invoice"))
    ));
    assert!(matches!(
        invoice::delete_invoice(&db, &created.id),
        Err(SaverlyError::NotFound("invoice"))
    ));
}
