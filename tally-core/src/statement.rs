//! Statement record types produced by the extraction engine

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;

/// The typed result of extracting one bank statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementRecord {
    pub bank: BankInfo,
    pub client: ClientInfo,
    pub account: AccountInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_period: Option<StatementPeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Balance>,
    pub transactions: TransactionSet,
    /// Verbatim copy of the input document, for auditing.
    pub raw_response: Document,
}

impl StatementRecord {
    /// Empty record for a document that carries no entities at all.
    pub fn empty(raw_response: Document) -> Self {
        Self {
            bank: BankInfo::default(),
            client: ClientInfo::default(),
            account: AccountInfo::default(),
            statement_period: None,
            currency: None,
            balance: None,
            transactions: TransactionSet::default(),
            raw_response,
        }
    }

    /// JSON form without the audit copy of the input document.
    pub fn without_raw_response(&self) -> serde_json::Result<Value> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("rawResponse");
        }
        Ok(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Statement coverage. Values are ISO dates when the service normalized
/// them, otherwise the text as printed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub start: f64,
    pub end: f64,
    pub change: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionSet {
    pub items: Vec<Transaction>,
    pub totals: Totals,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub positive: f64,
    pub negative: f64,
    pub net: f64,
}

/// One statement row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// YYYY-MM-DD, or the printed text when no year could be inferred
    pub date: String,
    /// Empty when unknown
    pub description: String,
    /// Negative = withdrawal, positive = deposit. Never zero.
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_number: Option<String>,
    /// Source line the row was built from
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_confidence: Option<DescriptionConfidence>,
}

impl Transaction {
    pub fn is_withdrawal(&self) -> bool {
        self.amount < 0.0
    }

    pub fn is_deposit(&self) -> bool {
        self.amount > 0.0
    }
}

/// Where a transaction's description came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DescriptionConfidence {
    /// Typed description sub-fields of the line item
    #[serde(rename = "high")]
    High,
    /// The line item's own raw text
    #[serde(rename = "medium")]
    Medium,
    /// Searched for elsewhere in the document
    #[serde(rename = "low")]
    Low,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transaction {
        Transaction {
            date: "2025-01-05".to_string(),
            description: "Coffee Shop".to_string(),
            amount: -5.0,
            currency: Some("USD".to_string()),
            check_number: None,
            raw_text: "Jan 05 Coffee Shop -$5.00".to_string(),
            description_confidence: Some(DescriptionConfidence::High),
        }
    }

    #[test]
    fn test_transaction_json_keys() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["rawText"], "Jan 05 Coffee Shop -$5.00");
        assert_eq!(json["descriptionConfidence"], "high");
        assert!(json.get("checkNumber").is_none());
        assert!(sample().is_withdrawal());
        assert!(!sample().is_deposit());
    }

    #[test]
    fn test_without_raw_response() {
        let mut record = StatementRecord::empty(Document::default());
        record.account.kind = Some("Checking".to_string());
        record.transactions.items.push(sample());

        let value = record.without_raw_response().unwrap();
        assert!(value.get("rawResponse").is_none());
        assert_eq!(value["account"]["type"], "Checking");
        assert_eq!(value["transactions"]["items"][0]["amount"], -5.0);

        let full = serde_json::to_value(&record).unwrap();
        assert!(full.get("rawResponse").is_some());
    }
}
