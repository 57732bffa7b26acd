//! The entity document handed over by the upstream extraction service.
//!
//! Shapes follow the service's JSON output (camelCase keys, int64 values
//! encoded as strings). Fields this crate does not interpret are kept in
//! `extra` so the document can be echoed back verbatim for auditing.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// A processed document: a flat entity list plus the full OCR text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<Entity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("parse document JSON")
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::from_json_str(&s).with_context(|| format!("decode {}", path.display()))
    }

    /// Full document text, empty when the service returned none.
    pub fn full_text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// One field or line item identified by the extraction service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mention_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Child fields (only line items carry these).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_value: Option<NormalizedValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_anchor: Option<PageAnchor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_mention(mut self, text: impl Into<String>) -> Self {
        self.mention_text = Some(text.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn mention(&self) -> &str {
        self.mention_text.as_deref().unwrap_or("")
    }

    /// Missing confidence counts as zero.
    pub fn confidence_or_zero(&self) -> f64 {
        self.confidence.unwrap_or(0.0)
    }

    pub fn money_value(&self) -> Option<&MoneyValue> {
        self.normalized_value.as_ref()?.money_value.as_ref()
    }

    pub fn date_value(&self) -> Option<&DateValue> {
        self.normalized_value.as_ref()?.date_value.as_ref()
    }

    pub fn normalized_text(&self) -> Option<&str> {
        self.normalized_value.as_ref()?.text.as_deref()
    }

    fn first_page_ref(&self) -> Option<&PageRef> {
        self.page_anchor.as_ref()?.page_refs.first()
    }

    /// Page of the first anchor. The service omits page 0, so an anchor
    /// without a page number means the first page.
    pub fn page(&self) -> Option<i64> {
        self.first_page_ref().map(|r| r.page.unwrap_or(0))
    }

    /// Normalized vertical position (0 = top) of the first bounding vertex.
    pub fn vertical_position(&self) -> Option<f64> {
        let vertex = self
            .first_page_ref()?
            .bounding_poly
            .as_ref()?
            .normalized_vertices
            .first()?;
        Some(vertex.y.unwrap_or(0.0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub money_value: Option<MoneyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_value: Option<DateValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyValue {
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub units: Option<i64>,
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub nanos: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
}

/// A possibly partial calendar date. Zero or missing parts are unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
}

impl DateValue {
    pub fn year(&self) -> Option<i32> {
        self.year.filter(|y| *y != 0)
    }

    pub fn month(&self) -> Option<u32> {
        self.month.filter(|m| *m != 0)
    }

    pub fn day(&self) -> Option<u32> {
        self.day.filter(|d| *d != 0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnchor {
    #[serde(default)]
    pub page_refs: Vec<PageRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRef {
    #[serde(default, deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_poly: Option<BoundingPoly>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingPoly {
    #[serde(default)]
    pub normalized_vertices: Vec<NormalizedVertex>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedVertex {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

/// int64 fields arrive as JSON strings ("125") or plain numbers.
fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Int(n)) => Some(n),
        Some(Raw::Float(f)) => Some(f.trunc() as i64),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service_json() {
        let doc = Document::from_json_str(
            r#"{
                "text": "Acme Bank\nStatement",
                "uri": "gs://bucket/stmt.pdf",
                "entities": [
                    {
                        "type": "ending_balance",
                        "mentionText": "$1,250.50",
                        "confidence": 0.97,
                        "id": "7",
                        "normalizedValue": {
                            "text": "1250.50 USD",
                            "moneyValue": { "units": "1250", "nanos": 500000000, "currencyCode": "USD" }
                        },
                        "pageAnchor": {
                            "pageRefs": [{ "page": "1", "boundingPoly": { "normalizedVertices": [{ "x": 0.1, "y": 0.42 }] } }]
                        }
                    }
                ]
            }"#,
        )
        .unwrap();

        let entities = doc.entities.as_ref().unwrap();
        assert_eq!(entities.len(), 1);
        let balance = &entities[0];
        assert_eq!(balance.kind, "ending_balance");
        assert_eq!(balance.money_value().unwrap().units, Some(1250));
        assert_eq!(balance.money_value().unwrap().nanos, Some(500_000_000));
        assert_eq!(balance.page(), Some(1));
        assert_eq!(balance.vertical_position(), Some(0.42));
        assert_eq!(balance.extra.get("id"), Some(&Value::String("7".into())));
        assert_eq!(doc.extra.get("uri"), Some(&Value::String("gs://bucket/stmt.pdf".into())));
        assert_eq!(doc.full_text(), "Acme Bank\nStatement");
    }

    #[test]
    fn test_missing_entities_is_none() {
        let doc = Document::from_json_str(r#"{ "text": "" }"#).unwrap();
        assert!(doc.entities.is_none());
    }

    #[test]
    fn test_anchor_defaults_match_service_omissions() {
        let doc = Document::from_json_str(
            r#"{ "entities": [{ "type": "table_item",
                 "pageAnchor": { "pageRefs": [{ "boundingPoly": { "normalizedVertices": [{ "x": 0.2 }] } }] } }] }"#,
        )
        .unwrap();
        let item = &doc.entities.unwrap()[0];
        assert_eq!(item.page(), Some(0));
        assert_eq!(item.vertical_position(), Some(0.0));
        assert_eq!(Entity::new("table_item").page(), None);
    }

    #[test]
    fn test_partial_date_parts() {
        let dv = DateValue {
            year: Some(0),
            month: Some(12),
            day: Some(15),
        };
        assert_eq!(dv.year(), None);
        assert_eq!(dv.month(), Some(12));
        assert_eq!(dv.day(), Some(15));
    }
}
