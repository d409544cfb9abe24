// 🗂️ Taxonomy Reconciliation - Fold newly seen pairs into the category file
// Known categories grow subcategories; unknown categories are only reported

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::store::Category;

// ============================================================================
// TAXONOMY UPDATE
// ============================================================================

/// What reconciliation did to the taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyUpdate {
    /// (category, subcategory) pairs appended to the taxonomy.
    pub added: Vec<(String, String)>,

    /// Categories referenced by transactions but absent from the taxonomy.
    /// Surfaced for the operator; deliberately never auto-created — the
    /// transaction store may reference categories the taxonomy does not
    /// define, and that is accepted.
    pub unknown_categories: Vec<String>,
}

impl TaxonomyUpdate {
    /// True when the taxonomy document needs to be written back.
    pub fn changed(&self) -> bool {
        !self.added.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Added {} subcategories, {} unknown categories",
            self.added.len(),
            self.unknown_categories.len()
        )
    }
}

// ============================================================================
// RECONCILIATION
// ============================================================================

/// Reconcile the pairs produced by reprocessing against the taxonomy.
///
/// For a pair whose category exists, a missing subcategory is appended and
/// the category's subcategory list re-sorted lexicographically. A pair whose
/// category does not exist only lands in `unknown_categories`.
pub fn apply_new_pairs(
    categories: &mut [Category],
    pairs: &BTreeSet<(String, Option<String>)>,
) -> TaxonomyUpdate {
    let mut update = TaxonomyUpdate {
        added: Vec::new(),
        unknown_categories: Vec::new(),
    };
    let mut unknown = BTreeSet::new();

    for (name, subcategory) in pairs {
        match categories.iter_mut().find(|c| &c.name == name) {
            None => {
                unknown.insert(name.clone());
            }
            Some(category) => {
                if let Some(sub) = subcategory {
                    if !category.has_subcategory(sub) {
                        category.add_subcategory(sub);
                        update.added.push((name.clone(), sub.clone()));
                    }
                }
            }
        }
    }

    update.unknown_categories = unknown.into_iter().collect();
    update
}

// ============================================================================
// TESTS
// ============================================================================
