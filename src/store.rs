// 💾 Store - The two persisted JSON documents
// Whole-document load, in-place mutation, whole-document overwrite

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::classifier::UNCATEGORIZED;

// ============================================================================
// TRANSACTION
// ============================================================================

/// One record of the transaction document.
///
/// Only `label`, `amount`, `category` and `subcategory` are interpreted here.
/// Everything else the extraction side writes (date, status, period, ...) is
/// captured in `extra` and round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub label: String,
    pub amount: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Invariant: only present when `category` is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Transaction {
    /// A record is resolved once it carries a category other than the
    /// sentinel. Resolved records are never touched again, which is what
    /// makes reprocessing idempotent and keeps manual corrections intact.
    pub fn is_resolved(&self) -> bool {
        match &self.category {
            Some(category) => category != UNCATEGORIZED,
            None => false,
        }
    }

    /// Subcategory treated as missing when absent or empty.
    pub fn has_subcategory(&self) -> bool {
        matches!(&self.subcategory, Some(s) if !s.is_empty())
    }
}

// ============================================================================
// CATEGORY (taxonomy entry)
// ============================================================================

/// One entry of the taxonomy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,

    /// Kept lexicographically sorted on disk.
    pub subcategories: Vec<String>,

    /// Display color ("#RRGGBB"), opaque to the engine.
    pub color: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Category {
    pub fn has_subcategory(&self, name: &str) -> bool {
        self.subcategories.iter().any(|s| s == name)
    }

    /// Append a subcategory and restore lexicographic order.
    pub fn add_subcategory(&mut self, name: &str) {
        self.subcategories.push(name.to_string());
        self.subcategories.sort();
    }
}

// ============================================================================
// DOCUMENT I/O
// ============================================================================

/// Load the transaction document fully into memory.
/// A malformed document fails here, before anything is mutated.
pub fn load_transactions<P: AsRef<Path>>(path: P) -> Result<Vec<Transaction>> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read transactions file: {:?}", path.as_ref()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse transactions JSON: {:?}", path.as_ref()))
}

/// Overwrite the transaction document. Safe to repeat with unchanged content.
pub fn save_transactions<P: AsRef<Path>>(path: P, transactions: &[Transaction]) -> Result<()> {
    let content = serde_json::to_string_pretty(transactions)
        .context("Failed to serialize transactions")?;

    fs::write(path.as_ref(), content + "\n")
        .with_context(|| format!("Failed to write transactions file: {:?}", path.as_ref()))
}

/// Load the taxonomy document fully into memory.
pub fn load_taxonomy<P: AsRef<Path>>(path: P) -> Result<Vec<Category>> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read taxonomy file: {:?}", path.as_ref()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse taxonomy JSON: {:?}", path.as_ref()))
}

/// Overwrite the taxonomy document.
pub fn save_taxonomy<P: AsRef<Path>>(path: P, categories: &[Category]) -> Result<()> {
    let content =
        serde_json::to_string_pretty(categories).context("Failed to serialize taxonomy")?;

    fs::write(path.as_ref(), content + "\n")
        .with_context(|| format!("Failed to write taxonomy file: {:?}", path.as_ref()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_opaque_fields_round_trip() {
        let json = r#"{
            "label": "Spotify",
            "amount": -9.99,
            "category": "Abonnements",
            "subcategory": "Loisirs",
            "date": "2023-04-02",
            "status": "pointé",
            "period": "2023-04"
        }"#;

        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.label, "Spotify");
        assert_eq!(tx.amount, -9.99);
        assert_eq!(tx.category.as_deref(), Some("Abonnements"));
        assert_eq!(tx.extra.get("date").unwrap(), "2023-04-02");
        assert_eq!(tx.extra.get("status").unwrap(), "pointé");

        // Opaque fields survive re-serialization.
        let back = serde_json::to_value(&tx).unwrap();
        assert_eq!(back.get("date").unwrap(), "2023-04-02");
        assert_eq!(back.get("period").unwrap(), "2023-04");
    }

    #[test]
    fn test_absent_optional_fields_stay_absent() {
        let json = r#"{ "label": "Loyer", "amount": -650.0 }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();

        assert_eq!(tx.category, None);
        assert_eq!(tx.subcategory, None);

        let back = serde_json::to_value(&tx).unwrap();
        assert!(back.get("category").is_none());
        assert!(back.get("subcategory").is_none());
    }

    #[test]
    fn test_is_resolved() {
        let mut tx: Transaction =
            serde_json::from_str(r#"{ "label": "x", "amount": -1.0 }"#).unwrap();
        assert!(!tx.is_resolved());

        tx.category = Some(UNCATEGORIZED.to_string());
        assert!(!tx.is_resolved());

        tx.category = Some("Foyer".to_string());
        assert!(tx.is_resolved());
    }

    #[test]
    fn test_category_add_subcategory_keeps_sorted() {
        let mut category: Category = serde_json::from_str(
            r##"{ "name": "Economies", "subcategories": ["Ajout", "Retrait"], "color": "#2ECC71" }"##,
        )
        .unwrap();

        category.add_subcategory("Livret A");
        assert_eq!(category.subcategories, vec!["Ajout", "Livret A", "Retrait"]);
    }

    #[test]
    fn test_malformed_document_is_fatal() {
        let dir = std::env::temp_dir().join("txcat-store-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.json");
        fs::write(&path, "[ { \"label\": ").unwrap();

        assert!(load_transactions(&path).is_err());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_save_and_reload_transactions() {
        let dir = std::env::temp_dir().join("txcat-store-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("transactions.json");

        let transactions: Vec<Transaction> = serde_json::from_str(
            r#"[
                { "label": "Spotify", "amount": -9.99, "date": "2023-04-02" },
                { "label": "Salaire", "amount": 1800.0, "category": "Rentrée", "subcategory": "Salaire" }
            ]"#,
        )
        .unwrap();

        save_transactions(&path, &transactions).unwrap();
        let reloaded = load_transactions(&path).unwrap();
        assert_eq!(reloaded, transactions);

        // Re-writing unchanged content is safe.
        save_transactions(&path, &reloaded).unwrap();
        assert_eq!(load_transactions(&path).unwrap(), transactions);
        fs::remove_file(&path).unwrap();
    }
}
