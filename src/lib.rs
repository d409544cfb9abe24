// Transaction Categorizer - Core Library
// Exposes all modules for use in the CLI and tests

pub mod store;
pub mod rules;
pub mod classifier;
pub mod reprocess;
pub mod taxonomy;

// Re-export commonly used types
pub use store::{
    Transaction, Category,
    load_transactions, save_transactions, load_taxonomy, save_taxonomy,
};
pub use rules::{
    Rule, RuleSet, PatternRule, ShadowedRule, Tier,
};
pub use classifier::{
    Classifier, Classification, MatchKind,
    UNCATEGORIZED, INCOME_CATEGORY, INCOME_OTHER,
    SAVINGS_CATEGORY, SAVINGS_DEPOSIT, SAVINGS_WITHDRAWAL,
};
pub use reprocess::{
    ReprocessEngine, ReprocessReport,
    repair_savings, category_distribution, unresolved_labels,
};
pub use taxonomy::{TaxonomyUpdate, apply_new_pairs};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
