//! Common regex patterns for invoice field extraction.
//!
//! Rule tables in the sibling modules are assembled from these pieces.

use lazy_static::lazy_static;
use regex::Regex;

/// English month names and their usual abbreviations, optional trailing dot.
pub const MONTH_NAME: &str = r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?";

// Invoice ID patterns

/// CSV-style `"Receipt No.","<value>"`; the label may wrap across lines.
pub const INVOICE_ID_QUOTED: &str = r#"(?i)"\s*receipt\s+no\.?\s*"\s*,\s*"([^"]+)""#;

/// `Invoice No: X`, `Receipt Number X`, `Invoice #X`. The token must hold a digit.
pub const INVOICE_ID_LABELED: &str =
    r"(?i)\b(?:invoice|receipt)(?:\s*(?:number|num\.?|no\.?|#))?[\s:.#-]*([a-z0-9/-]*\d[a-z0-9/-]*)";

/// `Invoice` followed closely by an upper-case reference of four or more characters.
pub const INVOICE_ID_LOOSE: &str = r"Invoice.{0,15}?[:-]?\s*\b([A-Z0-9][A-Z0-9/-]{3,})\b";

// Date patterns

/// CSV-style `"Document Date","<value>"`; the label may wrap across lines.
pub const DATE_QUOTED: &str = r#"(?i)"\s*document\s+date\s*"\s*,\s*"([^"]+)""#;

/// A date label followed by a numeric `D/M/Y` date.
pub const DATE_LABELED: &str = r"(?i)\b(?:document\s+date|invoice\s+date|invoice|date)\b[^\d\n]{0,20}?(\d{1,2}[/.-]\d{1,2}[/.-](?:\d{4}|\d{2}))\b";

lazy_static! {
    /// `29-Nov-2024`, `29. November 2024`, `05 / 11 / 2024`.
    pub static ref DATE_DAY_MONTH_YEAR: String = format!(
        r"(?i)\b\d{{1,2}}(?:[ \t]*[-./ \t][ \t]*{month}[ \t]*[-./ \t][ \t]*|[ \t]*[-./][ \t]*\d{{1,2}}[ \t]*[-./][ \t]*)\d{{4}}\b",
        month = MONTH_NAME
    );

    /// `November 29, 2024`.
    pub static ref DATE_MONTH_FIRST: String = format!(
        r"(?i)\b{month}[ \t]+\d{{1,2}},?[ \t]+\d{{4}}\b",
        month = MONTH_NAME
    );

    /// A monetary value: optional currency marker, comma-grouped or plain
    /// integer digits, a decimal point and exactly two decimals.
    pub static ref MONEY: Regex = Regex::new(
        r"(?i)(?:[₹$€£]|\brs\.?|\binr|\busd|\beur|\bgbp)?[ \t]*((?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2})(?:\D|$)"
    ).unwrap();
}
