// ⚙️ Reprocess Engine - Batch categorization over the transaction store
// Skips resolved records, classifies the rest, repairs savings direction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::classifier::{
    Classifier, MatchKind, SAVINGS_CATEGORY, SAVINGS_DEPOSIT, SAVINGS_WITHDRAWAL, UNCATEGORIZED,
};
use crate::store::{Category, Transaction};

// ============================================================================
// REPROCESS REPORT
// ============================================================================

/// Outcome of one main reprocessing pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReprocessReport {
    /// Records visited (the whole store).
    pub scanned: usize,

    /// Records that received a category in this pass.
    pub newly_categorized: usize,

    /// How many of the newly categorized records each case produced.
    pub match_counts: BTreeMap<String, usize>,

    /// (category, subcategory?) pairs assigned in this pass but not present
    /// in the taxonomy: the category is missing entirely, or the subcategory
    /// is not listed under a known category.
    pub new_pairs: BTreeSet<(String, Option<String>)>,

    pub reprocessed_at: DateTime<Utc>,
}

impl ReprocessReport {
    pub fn summary(&self) -> String {
        format!(
            "Categorized {} of {} transactions ({} pairs missing from taxonomy)",
            self.newly_categorized,
            self.scanned,
            self.new_pairs.len()
        )
    }
}

// ============================================================================
// REPROCESS ENGINE
// ============================================================================

pub struct ReprocessEngine {
    classifier: Classifier,
}

impl ReprocessEngine {
    pub fn new(classifier: Classifier) -> Self {
        ReprocessEngine { classifier }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Main pass, in store order.
    ///
    /// Records whose category is present and not the sentinel are skipped
    /// without mutation, so manual corrections survive and a rerun after a
    /// successful run changes nothing. Every other record is classified:
    /// the category is set, and the subcategory is either set or removed
    /// (a stale subcategory from a previous assignment must not outlive its
    /// category).
    ///
    /// `taxonomy` is only consulted to decide which newly assigned pairs the
    /// taxonomy does not know yet; it is not mutated here.
    pub fn run(&self, transactions: &mut [Transaction], taxonomy: &[Category]) -> ReprocessReport {
        let mut report = ReprocessReport {
            scanned: transactions.len(),
            newly_categorized: 0,
            match_counts: BTreeMap::new(),
            new_pairs: BTreeSet::new(),
            reprocessed_at: Utc::now(),
        };

        for tx in transactions.iter_mut() {
            if tx.is_resolved() {
                continue;
            }

            let result = self.classifier.classify(&tx.label, tx.amount);

            tx.category = Some(result.category.clone());
            tx.subcategory = result.subcategory.clone();
            report.newly_categorized += 1;
            *report
                .match_counts
                .entry(result.matched_by.as_str().to_string())
                .or_insert(0) += 1;

            if result.matched_by == MatchKind::Unmatched {
                // The sentinel itself is never a taxonomy candidate.
                continue;
            }

            match taxonomy.iter().find(|c| c.name == result.category) {
                None => {
                    report
                        .new_pairs
                        .insert((result.category, result.subcategory));
                }
                Some(category) => {
                    if let Some(sub) = &result.subcategory {
                        if !category.has_subcategory(sub) {
                            report
                                .new_pairs
                                .insert((result.category, result.subcategory));
                        }
                    }
                }
            }
        }

        report
    }
}

// ============================================================================
// SAVINGS REPAIR PASS
// ============================================================================

/// Secondary pass over the full collection: savings records whose direction
/// the pattern rules could not infer get it from the amount sign.
///
/// `amount < 0` is an addition to savings ("Ajout"), `amount > 0` a
/// withdrawal ("Retrait"); a zero amount stays without subcategory.
/// Returns the number of records repaired.
pub fn repair_savings(transactions: &mut [Transaction]) -> usize {
    let mut repaired = 0;

    for tx in transactions.iter_mut() {
        if tx.category.as_deref() != Some(SAVINGS_CATEGORY) || tx.has_subcategory() {
            continue;
        }

        if tx.amount < 0.0 {
            tx.subcategory = Some(SAVINGS_DEPOSIT.to_string());
            repaired += 1;
        } else if tx.amount > 0.0 {
            tx.subcategory = Some(SAVINGS_WITHDRAWAL.to_string());
            repaired += 1;
        }
    }

    repaired
}

// ============================================================================
// SUMMARY HELPERS
// ============================================================================

/// Per-(category, subcategory) record counts over the whole store.
/// Records without any category are counted under "???".
pub fn category_distribution(transactions: &[Transaction]) -> BTreeMap<(String, String), usize> {
    let mut counts = BTreeMap::new();

    for tx in transactions {
        let category = tx.category.clone().unwrap_or_else(|| "???".to_string());
        let subcategory = tx.subcategory.clone().unwrap_or_default();
        *counts.entry((category, subcategory)).or_insert(0) += 1;
    }

    counts
}

/// Labels still carrying the sentinel, with occurrence counts.
pub fn unresolved_labels(transactions: &[Transaction]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();

    for tx in transactions {
        if tx.category.as_deref() == Some(UNCATEGORIZED) {
            *counts.entry(tx.label.clone()).or_insert(0) += 1;
        }
    }

    counts
}

// ============================================================================
// TESTS
// ============================================================================
