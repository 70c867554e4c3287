//! GST allocation: state classification and SGST/CGST vs IGST splitting.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderline_core::{DomainError, DomainResult, Percent, ValueObject, round_currency};

/// Tax treatment of a supply, decided by the customer's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxRegion {
    /// Supply within the home state: SGST + CGST.
    IntraState,
    /// Supply to any other state: IGST.
    InterState,
}

impl TaxRegion {
    pub fn is_intra_state(self) -> bool {
        matches!(self, TaxRegion::IntraState)
    }
}

/// Outcome of classifying a customer state string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateClassification {
    pub region: TaxRegion,
    /// The state was empty; the region is then the inter-state default.
    pub state_missing: bool,
}

impl StateClassification {
    /// The warning to surface when the state was missing.
    pub fn warning(&self) -> Option<DomainError> {
        self.state_missing.then(missing_state_warning)
    }
}

/// Warning raised when a customer has no state: IGST is applied.
pub fn missing_state_warning() -> DomainError {
    DomainError::state_unknown("customer state missing; applying IGST")
}

/// Lookup table from normalized state names/codes to a tax region.
///
/// Keys are trimmed and lower-cased. Anything not in the table, non-empty, is
/// inter-state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateClassifier {
    home_states: HashMap<String, TaxRegion>,
}

/// Names and codes under which the home state (Tamil Nadu) shows up in
/// customer and distributor masters.
pub const HOME_STATE_ALIASES: [&str; 3] = ["tamil nadu", "tn", "tamilnadu"];

impl Default for StateClassifier {
    fn default() -> Self {
        Self::with_aliases(HOME_STATE_ALIASES)
    }
}

impl StateClassifier {
    pub fn with_aliases<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let home_states = aliases
            .into_iter()
            .map(|alias| normalize_state(alias.as_ref()))
            .filter(|key| !key.is_empty())
            .map(|key| (key, TaxRegion::IntraState))
            .collect();
        Self { home_states }
    }

    /// Register another spelling of the home state.
    pub fn add_home_alias(&mut self, alias: &str) {
        let key = normalize_state(alias);
        if !key.is_empty() {
            self.home_states.insert(key, TaxRegion::IntraState);
        }
    }

    pub fn classify(&self, state: &str) -> StateClassification {
        let key = normalize_state(state);
        if key.is_empty() {
            return StateClassification {
                region: TaxRegion::InterState,
                state_missing: true,
            };
        }

        let region = self
            .home_states
            .get(&key)
            .copied()
            .unwrap_or(TaxRegion::InterState);
        StateClassification {
            region,
            state_missing: false,
        }
    }

    pub fn region_of(&self, state: &str) -> TaxRegion {
        self.classify(state).region
    }
}

fn normalize_state(state: &str) -> String {
    state.trim().to_lowercase()
}

/// Tax split for one line. The two shapes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaxSplit {
    Intra { sgst: Decimal, cgst: Decimal },
    Inter { igst: Decimal },
}

impl ValueObject for TaxSplit {}

impl TaxSplit {
    /// Split the GST on `taxable` at `rate` for `region`. Exact (unrounded).
    pub fn compute(taxable: Decimal, rate: Percent, region: TaxRegion) -> DomainResult<Self> {
        let gst = rate
            .of(taxable)
            .ok_or_else(|| DomainError::validation("tax amount too large"))?;
        Ok(match region {
            TaxRegion::IntraState => {
                let half = gst / Decimal::TWO;
                TaxSplit::Intra {
                    sgst: half,
                    cgst: half,
                }
            }
            TaxRegion::InterState => TaxSplit::Inter { igst: gst },
        })
    }

    pub fn sgst(&self) -> Decimal {
        match self {
            TaxSplit::Intra { sgst, .. } => *sgst,
            TaxSplit::Inter { .. } => Decimal::ZERO,
        }
    }

    pub fn cgst(&self) -> Decimal {
        match self {
            TaxSplit::Intra { cgst, .. } => *cgst,
            TaxSplit::Inter { .. } => Decimal::ZERO,
        }
    }

    pub fn igst(&self) -> Decimal {
        match self {
            TaxSplit::Intra { .. } => Decimal::ZERO,
            TaxSplit::Inter { igst } => *igst,
        }
    }

    pub fn total(&self) -> Decimal {
        self.sgst() + self.cgst() + self.igst()
    }

    pub fn region(&self) -> TaxRegion {
        match self {
            TaxSplit::Intra { .. } => TaxRegion::IntraState,
            TaxSplit::Inter { .. } => TaxRegion::InterState,
        }
    }

    /// Each component rounded half-up to currency scale.
    pub fn rounded(&self) -> Self {
        match *self {
            TaxSplit::Intra { sgst, cgst } => TaxSplit::Intra {
                sgst: round_currency(sgst),
                cgst: round_currency(cgst),
            },
            TaxSplit::Inter { igst } => TaxSplit::Inter {
                igst: round_currency(igst),
            },
        }
    }
}
