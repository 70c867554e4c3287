//! Master records consumed by the engine (item and customer lookups).
//!
//! The master-data API hands these over as JSON; field names follow that
//! payload (`stock_item_name`, `gst`, `hsn`/`hsn_code`, `uom`).

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use orderline_core::{DomainError, DomainResult, Percent, ValueObject, money};

/// Stock item code (the key lines are merged on).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemCode(String);

impl ValueObject for ItemCode {}

impl ItemCode {
    pub fn new(code: impl Into<String>) -> DomainResult<Self> {
        let code = code.into().trim().to_string();
        if code.is_empty() {
            return Err(DomainError::validation("item not selected"));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ItemCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Item master record: `{item_code, stock_item_name, rate, gst, hsn, uom}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMaster {
    pub item_code: String,
    #[serde(rename = "stock_item_name", alias = "item_name", default)]
    pub name: String,
    pub rate: Decimal,
    #[serde(rename = "gst", deserialize_with = "deserialize_tax_rate", default)]
    pub tax_rate_percent: Percent,
    #[serde(rename = "hsn", alias = "hsn_code", default)]
    pub hsn_code: String,
    #[serde(rename = "uom", default)]
    pub unit_of_measure: Option<String>,
}

impl ItemMaster {
    pub fn new(
        item_code: impl Into<String>,
        name: impl Into<String>,
        rate: Decimal,
        tax_rate_percent: Percent,
    ) -> Self {
        Self {
            item_code: item_code.into(),
            name: name.into(),
            rate,
            tax_rate_percent,
            hsn_code: String::new(),
            unit_of_measure: None,
        }
    }

    pub fn with_hsn(mut self, hsn_code: impl Into<String>) -> Self {
        self.hsn_code = hsn_code.into();
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit_of_measure = Some(unit.into());
        self
    }

    /// Validated item code.
    pub fn code(&self) -> DomainResult<ItemCode> {
        ItemCode::new(self.item_code.as_str())
    }

    /// Rate validated as non-negative and normalized to currency scale.
    pub fn normalized_rate(&self) -> DomainResult<Decimal> {
        money::non_negative_amount(self.rate)
    }
}

/// Customer master record: `{customer_code, customer_name, state}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerMaster {
    pub customer_code: String,
    pub customer_name: String,
    #[serde(default)]
    pub state: String,
}

impl CustomerMaster {
    pub fn new(
        customer_code: impl Into<String>,
        customer_name: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            customer_code: customer_code.into(),
            customer_name: customer_name.into(),
            state: state.into(),
        }
    }
}

/// The master API sends GST as a number (`18`), a numeric string (`"18"`) or
/// a percent string (`"18%"`).
fn deserialize_tax_rate<'de, D>(deserializer: D) -> Result<Percent, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawRate {
        Number(Decimal),
        Text(String),
    }

    match RawRate::deserialize(deserializer)? {
        RawRate::Number(value) => Percent::new(value).map_err(serde::de::Error::custom),
        RawRate::Text(text) if text.trim().is_empty() => Ok(Percent::ZERO),
        RawRate::Text(text) => Percent::parse(&text).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn item_master_parses_api_payload_with_percent_string() {
        let json = r#"{
            "item_code": "ITM-001",
            "stock_item_name": "Copper wire 2.5mm",
            "rate": 1250.5,
            "gst": "18%",
            "hsn_code": "8544",
            "uom": "Roll"
        }"#;
        let item: ItemMaster = serde_json::from_str(json).unwrap();
        assert_eq!(item.item_code, "ITM-001");
        assert_eq!(item.name, "Copper wire 2.5mm");
        assert_eq!(item.rate, Decimal::from_str("1250.5").unwrap());
        assert_eq!(item.tax_rate_percent.value(), Decimal::from(18));
        assert_eq!(item.hsn_code, "8544");
        assert_eq!(item.unit_of_measure.as_deref(), Some("Roll"));
    }

    #[test]
    fn item_master_accepts_numeric_gst_and_missing_optionals() {
        let json = r#"{"item_code":"X","stock_item_name":"X","rate":"10","gst":12}"#;
        let item: ItemMaster = serde_json::from_str(json).unwrap();
        assert_eq!(item.tax_rate_percent.value(), Decimal::from(12));
        assert!(item.hsn_code.is_empty());
        assert!(item.unit_of_measure.is_none());
    }

    #[test]
    fn item_master_rejects_garbage_gst() {
        let json = r#"{"item_code":"X","stock_item_name":"X","rate":"10","gst":"exempt"}"#;
        assert!(serde_json::from_str::<ItemMaster>(json).is_err());
    }

    #[test]
    fn blank_item_code_is_unselected() {
        let item = ItemMaster::new("  ", "", Decimal::ONE, Percent::ZERO);
        assert!(matches!(item.code(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn negative_rate_is_rejected() {
        let item = ItemMaster::new("A", "A", Decimal::from(-5), Percent::ZERO);
        assert!(item.normalized_rate().is_err());
    }
}
