//! End-to-end checks of field extraction through the public API.

use invex_core::invoice::rules::{extract_invoice_date, extract_invoice_id};
use invex_core::{extract, ExtractionResult, HeuristicInvoiceParser, InvoiceParser};
use pretty_assertions::assert_eq;

const RECEIPT: &str = r#"Northwind Supplies
7 Harbour Lane
Kochi 682001
Email: billing@northwind.example

"Receipt No.","INV-2024-001"
"Document Date","29-Nov-2024"

Sold To:
Contoso Stores
Plot 12, MG Road
Bengaluru 560001

Item                 Amount
Printer paper        1,100.00
Toner                  134.56
Payment Amount   INR 1,234.56
"#;

/// Texts shaped like real OCR output, including some awkward ones.
const CORPUS: &[&str] = &[
    "",
    "\n\n\n",
    "   ",
    RECEIPT,
    "Acme Corp\nPhone: 555-1234\n221B Baker St\nGSTIN: XX123",
    "Invoice\n\nTotal",
    "Widget 45.00\nGadget 999.99\nShipping 12.50",
    "INVOICE #A-77 dated 29. November 2024\r\n\r\nBill To\r\nJane\r\n\r\nGrand Total $ 10.00",
    "₹₹₹ ... 1,2,3 .. total: ...\n\n\"Receipt No.\",\"\"",
];

fn assert_well_formed(result: &ExtractionResult) {
    for (name, value) in result.fields() {
        let Some(value) = value else { continue };

        // Addresses are the remainder of a party block and may be empty.
        if name.ends_with("Address") {
            assert_eq!(value, value.trim_matches('\n'), "{name}");
            continue;
        }

        assert!(!value.is_empty(), "{name} is empty");
        assert_eq!(value, value.trim(), "{name} is not trimmed");
    }
}

#[test]
fn test_every_text_yields_well_formed_record() {
    for text in CORPUS {
        let result = extract(text);
        assert_well_formed(&result);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 7);
    }
}

#[test]
fn test_empty_text_has_no_fields() {
    let result = extract("");
    assert_eq!(result, ExtractionResult::default());
    assert_eq!(result.missing_fields().len(), 7);
}

#[test]
fn test_extraction_is_idempotent() {
    let parser = HeuristicInvoiceParser::new();
    for text in CORPUS {
        assert_eq!(extract(text), extract(text));
        assert_eq!(parser.parse(text), extract(text));
    }
}

#[test]
fn test_supplier_name_is_first_line() {
    for (text, expected) in [
        (RECEIPT, "Northwind Supplies"),
        ("\n\nAcme Corp\nMain St", "Acme Corp"),
        ("Solo Line", "Solo Line"),
    ] {
        assert_eq!(extract(text).supplier_name.as_deref(), Some(expected));
    }
}

#[test]
fn test_quoted_receipt_number() {
    assert_eq!(
        extract_invoice_id(r#""Receipt No.","INV-2024-001""#),
        Some("INV-2024-001".to_string())
    );
}

#[test]
fn test_payment_amount_line() {
    let result = extract("Payment Amount   INR 1,234.56");
    assert_eq!(result.total_amount.as_deref(), Some("1234.56"));
}

#[test]
fn test_total_falls_back_to_largest_amount() {
    let result = extract("Widget 45.00\nGadget 999.99\nShipping 12.50");
    assert_eq!(result.total_amount.as_deref(), Some("999.99"));
}

#[test]
fn test_supplier_address_filters_contact_lines() {
    let result = extract("Acme Corp\nPhone: 555-1234\n221B Baker St\nGSTIN: XX123");
    assert_eq!(result.supplier_name.as_deref(), Some("Acme Corp"));
    assert_eq!(result.supplier_address.as_deref(), Some("221B Baker St"));
}

#[test]
fn test_single_paragraph_has_no_customer() {
    let result = extract("Acme Corp\nBill To: Jane Doe\nTotal 5.00");
    assert_eq!(result.customer_name, None);
    assert_eq!(result.customer_address, None);
}

#[test]
fn test_dotted_long_date() {
    let date = extract_invoice_date("Dated: 29. November 2024").unwrap();
    let day = date.find("29").unwrap();
    let month = date.find("November").unwrap();
    let year = date.find("2024").unwrap();
    assert!(day < month && month < year);
}

#[test]
fn test_receipt_end_to_end() {
    let result = extract(RECEIPT);

    assert_eq!(
        result,
        ExtractionResult {
            supplier_name: Some("Northwind Supplies".to_string()),
            supplier_address: Some("7 Harbour Lane\nKochi 682001".to_string()),
            customer_name: Some("Sold To:".to_string()),
            customer_address: Some("Contoso Stores\nPlot 12, MG Road\nBengaluru 560001".to_string()),
            invoice_id: Some("INV-2024-001".to_string()),
            invoice_date: Some("29-Nov-2024".to_string()),
            total_amount: Some("1234.56".to_string()),
        }
    );
}
