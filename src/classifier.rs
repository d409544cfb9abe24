// 🧮 Label Classifier - Layered pattern matching with sign fallback
// classify(label, amount): exact → prefix → contains → amount sign → sentinel

use serde::{Deserialize, Serialize};

use crate::rules::RuleSet;

// ============================================================================
// WELL-KNOWN CATEGORY NAMES
// ============================================================================

/// Sentinel category meaning "not yet classified". A valid, storable value,
/// distinct from an absent category.
pub const UNCATEGORIZED: &str = "Non catégorisé";

/// Category assigned to unmatched positive amounts (incoming funds).
pub const INCOME_CATEGORY: &str = "Rentrée";

/// Subcategory assigned alongside [`INCOME_CATEGORY`] by the sign heuristic.
pub const INCOME_OTHER: &str = "Autre";

/// Savings category whose direction is repaired from the amount sign.
pub const SAVINGS_CATEGORY: &str = "Economies";

/// Savings direction: money moved into savings (negative amount).
pub const SAVINGS_DEPOSIT: &str = "Ajout";

/// Savings direction: money taken out of savings (positive amount).
pub const SAVINGS_WITHDRAWAL: &str = "Retrait";

// ============================================================================
// CLASSIFICATION RESULT
// ============================================================================

/// Which of the five classification cases produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchKind {
    Exact,
    Prefix,
    Contains,
    /// No rule matched; the positive amount was treated as incoming funds.
    AmountSign,
    /// No rule matched and the amount was not positive; sentinel assigned.
    Unmatched,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::Prefix => "prefix",
            MatchKind::Contains => "contains",
            MatchKind::AmountSign => "amount sign",
            MatchKind::Unmatched => "unmatched",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: String,
    pub subcategory: Option<String>,
    pub matched_by: MatchKind,
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Pure, total classifier over an immutable rule set.
///
/// For any `(label, amount)` input exactly one of the five cases applies,
/// so `classify` never fails and always returns the same result for the
/// same input.
pub struct Classifier {
    rules: RuleSet,
}

impl Classifier {
    pub fn new(rules: RuleSet) -> Self {
        Classifier { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Classify a transaction label, strictly ordered, first success returns:
    ///
    /// 1. Exact tier against the raw label (case-sensitive).
    /// 2. Prefix tier against the lowercased label, declaration order.
    /// 3. Contains tier against the lowercased label, declaration order.
    /// 4. `amount > 0` → ("Rentrée", "Autre"): an unmatched positive amount
    ///    is treated as incoming funds.
    /// 5. Sentinel ("Non catégorisé", none).
    pub fn classify(&self, label: &str, amount: f64) -> Classification {
        for rule in self.rules.exact_rules() {
            if rule.pattern == label {
                return Classification {
                    category: rule.category.clone(),
                    subcategory: rule.subcategory.clone(),
                    matched_by: MatchKind::Exact,
                };
            }
        }

        let lower = label.to_lowercase();

        for rule in self.rules.prefix_rules() {
            if lower.starts_with(&rule.pattern.to_lowercase()) {
                return Classification {
                    category: rule.category.clone(),
                    subcategory: rule.subcategory.clone(),
                    matched_by: MatchKind::Prefix,
                };
            }
        }

        for rule in self.rules.contains_rules() {
            if lower.contains(&rule.pattern.to_lowercase()) {
                return Classification {
                    category: rule.category.clone(),
                    subcategory: rule.subcategory.clone(),
                    matched_by: MatchKind::Contains,
                };
            }
        }

        if amount > 0.0 {
            return Classification {
                category: INCOME_CATEGORY.to_string(),
                subcategory: Some(INCOME_OTHER.to_string()),
                matched_by: MatchKind::AmountSign,
            };
        }

        Classification {
            category: UNCATEGORIZED.to_string(),
            subcategory: None,
            matched_by: MatchKind::Unmatched,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
