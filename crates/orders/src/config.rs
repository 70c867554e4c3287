//! Engine configuration.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use orderline_core::{DomainError, Percent};

use crate::line::LineDiscount;
use crate::numbering::{DEFAULT_PREFIX, DEFAULT_SEQUENCE_WIDTH, OrderNumberFormat};
use crate::tax::StateClassifier;

/// What `add_line` does when the item is already on the draft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Add the quantity to the existing line.
    #[default]
    Merge,
    /// Always push a new line.
    Append,
}

impl FromStr for DuplicatePolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "append" => Ok(Self::Append),
            other => Err(DomainError::validation(format!(
                "unknown duplicate policy: {other:?}"
            ))),
        }
    }
}

/// Unit of measure recorded when the item master has none.
pub const DEFAULT_UNIT_OF_MEASURE: &str = "No's";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub duplicate_policy: DuplicatePolicy,
    pub order_prefix: String,
    pub sequence_width: usize,
    pub default_unit_of_measure: String,
    /// Spellings of the home state on top of the built-in ones.
    pub home_state_aliases: Vec<String>,
    /// Order-level discount applied to every line added or merged.
    pub default_discount: LineDiscount,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Merge,
            order_prefix: DEFAULT_PREFIX.to_string(),
            sequence_width: DEFAULT_SEQUENCE_WIDTH,
            default_unit_of_measure: DEFAULT_UNIT_OF_MEASURE.to_string(),
            home_state_aliases: Vec::new(),
            default_discount: LineDiscount::NONE,
        }
    }
}

impl EngineConfig {
    /// Read `ORDERLINE_*` environment variables over the defaults.
    ///
    /// - `ORDERLINE_DUPLICATE_POLICY`: `merge` | `append`
    /// - `ORDERLINE_ORDER_PREFIX`
    /// - `ORDERLINE_SEQUENCE_WIDTH`
    /// - `ORDERLINE_DEFAULT_UOM`
    /// - `ORDERLINE_HOME_STATE_ALIASES`: comma-separated
    /// - `ORDERLINE_DEFAULT_DISCOUNT`, `ORDERLINE_DEFAULT_SPECIAL_DISCOUNT`: percentages
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("ORDERLINE_DUPLICATE_POLICY") {
            match raw.parse() {
                Ok(policy) => config.duplicate_policy = policy,
                Err(err) => tracing::warn!(error = %err, "ignoring ORDERLINE_DUPLICATE_POLICY"),
            }
        }

        if let Some(prefix) = lookup("ORDERLINE_ORDER_PREFIX").filter(|p| !p.trim().is_empty()) {
            config.order_prefix = prefix.trim().to_string();
        }

        if let Some(raw) = lookup("ORDERLINE_SEQUENCE_WIDTH") {
            match raw.trim().parse::<usize>() {
                Ok(width) if width > 0 => config.sequence_width = width,
                _ => tracing::warn!(value = %raw, "ignoring ORDERLINE_SEQUENCE_WIDTH"),
            }
        }

        if let Some(unit) = lookup("ORDERLINE_DEFAULT_UOM").filter(|u| !u.trim().is_empty()) {
            config.default_unit_of_measure = unit.trim().to_string();
        }

        if let Some(raw) = lookup("ORDERLINE_HOME_STATE_ALIASES") {
            config.home_state_aliases = raw
                .split(',')
                .map(str::trim)
                .filter(|alias| !alias.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(percent) = percent_var(&lookup, "ORDERLINE_DEFAULT_DISCOUNT") {
            config.default_discount.percent = percent;
        }
        if let Some(percent) = percent_var(&lookup, "ORDERLINE_DEFAULT_SPECIAL_DISCOUNT") {
            config.default_discount.special_percent = percent;
        }

        config
    }

    pub fn order_number_format(&self) -> OrderNumberFormat {
        OrderNumberFormat::new(self.order_prefix.clone(), self.sequence_width)
    }

    pub fn state_classifier(&self) -> StateClassifier {
        let mut classifier = StateClassifier::default();
        for alias in &self.home_state_aliases {
            classifier.add_home_alias(alias);
        }
        classifier
    }
}

fn percent_var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Percent> {
    let raw = lookup(key)?;
    match Percent::parse(&raw) {
        Ok(percent) => Some(percent),
        Err(err) => {
            tracing::warn!(error = %err, "ignoring {key}");
            None
        }
    }
}
