//! The fixed invoice field schema returned to callers.

use serde::{Deserialize, Serialize};

/// Fields extracted from one invoice.
///
/// Every field is optional: `None` means no rule matched. Serialized keys
/// are the human-readable labels downstream consumers expect, with `null`
/// for absent values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// First line of the issuing party's block.
    #[serde(rename = "Supplier Name")]
    pub supplier_name: Option<String>,

    /// Cleaned remainder of the issuing party's block.
    #[serde(rename = "Supplier Address")]
    pub supplier_address: Option<String>,

    /// First line of the billed party's block.
    #[serde(rename = "Customer Name")]
    pub customer_name: Option<String>,

    /// Cleaned remainder of the billed party's block.
    #[serde(rename = "Customer Address")]
    pub customer_address: Option<String>,

    /// Invoice or receipt number.
    #[serde(rename = "Invoice ID")]
    pub invoice_id: Option<String>,

    /// Invoice date as printed on the document.
    #[serde(rename = "Invoice Date")]
    pub invoice_date: Option<String>,

    /// Total amount with two decimals and no thousands separators.
    #[serde(rename = "Total Amount")]
    pub total_amount: Option<String>,
}

impl ExtractionResult {
    /// Field labels in schema order.
    pub const FIELD_NAMES: [&'static str; 7] = [
        "Supplier Name",
        "Supplier Address",
        "Customer Name",
        "Customer Address",
        "Invoice ID",
        "Invoice Date",
        "Total Amount",
    ];

    /// Pairs of label and value in schema order.
    pub fn fields(&self) -> [(&'static str, Option<&str>); 7] {
        [
            (Self::FIELD_NAMES[0], self.supplier_name.as_deref()),
            (Self::FIELD_NAMES[1], self.supplier_address.as_deref()),
            (Self::FIELD_NAMES[2], self.customer_name.as_deref()),
            (Self::FIELD_NAMES[3], self.customer_address.as_deref()),
            (Self::FIELD_NAMES[4], self.invoice_id.as_deref()),
            (Self::FIELD_NAMES[5], self.invoice_date.as_deref()),
            (Self::FIELD_NAMES[6], self.total_amount.as_deref()),
        ]
    }

    /// Labels of fields no rule matched.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.fields()
            .into_iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name)
            .collect()
    }

    /// True when nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, value)| value.is_none())
    }
}
