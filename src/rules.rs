// 🏷️ Classification Rules - Rules as Data
// Three ordered pattern tiers (exact, prefix, contains) loaded from JSON

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The production rule table, shipped with the binary.
const DEFAULT_RULES: &str = include_str!("../rules/default_rules.json");

// ============================================================================
// RULE DEFINITION
// ============================================================================

/// A single pattern rule, tagged by matching tier.
///
/// Rule files are flat JSON arrays in declaration order:
/// ```json
/// [
///   { "match": "exact",    "label": "Spotify",   "category": "Abonnements",  "subcategory": "Loisirs" },
///   { "match": "prefix",   "pattern": "courses", "category": "Alimentation", "subcategory": "Courses" },
///   { "match": "contains", "pattern": "pizza",   "category": "Alimentation", "subcategory": "Resto" }
/// ]
/// ```
/// Declaration order is part of the contract: within a tier, the first rule
/// that matches wins, and a later rule overlapping an earlier one is
/// permanently unreachable. Rule files are never deduplicated or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "lowercase")]
pub enum Rule {
    /// Case-sensitive, byte-for-byte match against the untransformed label.
    Exact {
        label: String,
        category: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subcategory: Option<String>,
    },

    /// Case-insensitive match at the start of the label.
    Prefix {
        pattern: String,
        category: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subcategory: Option<String>,
    },

    /// Case-insensitive match anywhere in the label.
    Contains {
        pattern: String,
        category: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subcategory: Option<String>,
    },
}

/// One tier entry: pattern text plus the (category, subcategory) it assigns.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternRule {
    pub pattern: String,
    pub category: String,
    pub subcategory: Option<String>,
}

impl PatternRule {
    fn new(pattern: String, category: String, subcategory: Option<String>) -> Self {
        PatternRule {
            pattern,
            category,
            subcategory,
        }
    }
}

// ============================================================================
// RULE SET
// ============================================================================

/// Three ordered, immutable rule tiers.
///
/// Built once at startup and passed explicitly into the classifier; no rule
/// may be added, removed, or reordered afterwards.
#[derive(Debug, Clone)]
pub struct RuleSet {
    exact: Vec<PatternRule>,
    prefix: Vec<PatternRule>,
    contains: Vec<PatternRule>,
}

impl RuleSet {
    /// Load rules from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read rules file: {:?}", path.as_ref()))?;

        let rules: Vec<Rule> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse rules JSON: {:?}", path.as_ref()))?;

        Ok(RuleSet::from_rules(rules))
    }

    /// The production rule table embedded in the binary.
    pub fn builtin() -> Result<Self> {
        let rules: Vec<Rule> =
            serde_json::from_str(DEFAULT_RULES).context("Failed to parse built-in rule table")?;
        Ok(RuleSet::from_rules(rules))
    }

    /// Partition a flat declaration list into the three tiers, preserving
    /// declaration order within each tier.
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        let mut set = RuleSet {
            exact: Vec::new(),
            prefix: Vec::new(),
            contains: Vec::new(),
        };

        for rule in rules {
            match rule {
                Rule::Exact {
                    label,
                    category,
                    subcategory,
                } => set.exact.push(PatternRule::new(label, category, subcategory)),
                Rule::Prefix {
                    pattern,
                    category,
                    subcategory,
                } => set
                    .prefix
                    .push(PatternRule::new(pattern, category, subcategory)),
                Rule::Contains {
                    pattern,
                    category,
                    subcategory,
                } => set
                    .contains
                    .push(PatternRule::new(pattern, category, subcategory)),
            }
        }

        set
    }

    pub fn exact_rules(&self) -> &[PatternRule] {
        &self.exact
    }

    pub fn prefix_rules(&self) -> &[PatternRule] {
        &self.prefix
    }

    pub fn contains_rules(&self) -> &[PatternRule] {
        &self.contains
    }

    /// Total number of rules across all tiers.
    pub fn rule_count(&self) -> usize {
        self.exact.len() + self.prefix.len() + self.contains.len()
    }

    /// Diagnostic lint: rules that can never fire because an earlier rule in
    /// the same tier matches every label they would match.
    ///
    /// Shadowing is a documented property of the rule table, not an error.
    /// Nothing is removed or reordered; this only surfaces the dead entries.
    pub fn find_shadowed(&self) -> Vec<ShadowedRule> {
        let mut shadowed = Vec::new();

        for (i, rule) in self.exact.iter().enumerate() {
            if let Some(by) = self.exact[..i].iter().position(|r| r.pattern == rule.pattern) {
                shadowed.push(ShadowedRule {
                    tier: Tier::Exact,
                    index: i,
                    shadowed_by: by,
                });
            }
        }

        for (i, rule) in self.prefix.iter().enumerate() {
            let lower = rule.pattern.to_lowercase();
            if let Some(by) = self.prefix[..i]
                .iter()
                .position(|r| lower.starts_with(&r.pattern.to_lowercase()))
            {
                shadowed.push(ShadowedRule {
                    tier: Tier::Prefix,
                    index: i,
                    shadowed_by: by,
                });
            }
        }

        for (i, rule) in self.contains.iter().enumerate() {
            let lower = rule.pattern.to_lowercase();
            if let Some(by) = self.contains[..i]
                .iter()
                .position(|r| lower.contains(&r.pattern.to_lowercase()))
            {
                shadowed.push(ShadowedRule {
                    tier: Tier::Contains,
                    index: i,
                    shadowed_by: by,
                });
            }
        }

        shadowed
    }
}

/// Rule tier, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Exact,
    Prefix,
    Contains,
}

/// A rule flagged by the shadowing lint: the rule at `index` in `tier` can
/// never fire because the rule at `shadowed_by` matches first.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowedRule {
    pub tier: Tier,
    pub index: usize,
    pub shadowed_by: usize,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_json() -> &'static str {
        r#"[
            { "match": "exact", "label": "Spotify", "category": "Abonnements", "subcategory": "Loisirs" },
            { "match": "prefix", "pattern": "courses", "category": "Alimentation", "subcategory": "Courses" },
            { "match": "exact", "label": "caf", "category": "Aide" },
            { "match": "contains", "pattern": "pizza", "category": "Alimentation", "subcategory": "Resto" }
        ]"#
    }

    #[test]
    fn test_parse_rule_file() {
        let rules: Vec<Rule> = serde_json::from_str(rule_json()).unwrap();
        let set = RuleSet::from_rules(rules);

        assert_eq!(set.rule_count(), 4);
        assert_eq!(set.exact_rules().len(), 2);
        assert_eq!(set.prefix_rules().len(), 1);
        assert_eq!(set.contains_rules().len(), 1);
        assert_eq!(set.exact_rules()[0].pattern, "Spotify");
        assert_eq!(set.exact_rules()[1].subcategory, None);
    }

    #[test]
    fn test_tier_order_preserved() {
        let rules = vec![
            Rule::Prefix {
                pattern: "salaire".to_string(),
                category: "Rentrée".to_string(),
                subcategory: Some("Salaire".to_string()),
            },
            Rule::Exact {
                label: "APL".to_string(),
                category: "Rentrée".to_string(),
                subcategory: Some("Autre".to_string()),
            },
            Rule::Prefix {
                pattern: "prime ".to_string(),
                category: "Rentrée".to_string(),
                subcategory: Some("Salaire".to_string()),
            },
        ];
        let set = RuleSet::from_rules(rules);

        assert_eq!(set.prefix_rules()[0].pattern, "salaire");
        assert_eq!(set.prefix_rules()[1].pattern, "prime ");
    }

    #[test]
    fn test_builtin_table_loads() {
        let set = RuleSet::builtin().unwrap();
        assert!(set.rule_count() > 900);
        assert!(!set.exact_rules().is_empty());
        assert!(!set.prefix_rules().is_empty());
        assert!(!set.contains_rules().is_empty());
    }

    #[test]
    fn test_shadowed_prefix_rule() {
        let rules = vec![
            Rule::Prefix {
                pattern: "retrait".to_string(),
                category: "Autre".to_string(),
                subcategory: Some("Autre".to_string()),
            },
            Rule::Prefix {
                pattern: "retrait eco".to_string(),
                category: "Economies".to_string(),
                subcategory: Some("Retrait".to_string()),
            },
        ];
        let set = RuleSet::from_rules(rules);
        let shadowed = set.find_shadowed();

        assert_eq!(shadowed.len(), 1);
        assert_eq!(shadowed[0].tier, Tier::Prefix);
        assert_eq!(shadowed[0].index, 1);
        assert_eq!(shadowed[0].shadowed_by, 0);
    }

    #[test]
    fn test_duplicate_exact_rule_flagged_not_removed() {
        let rules = vec![
            Rule::Exact {
                label: "Peluche raie".to_string(),
                category: "Loisirs".to_string(),
                subcategory: Some("Petit plaisir".to_string()),
            },
            Rule::Exact {
                label: "Peluche raie".to_string(),
                category: "Loisirs".to_string(),
                subcategory: Some("Petit plaisir".to_string()),
            },
        ];
        let set = RuleSet::from_rules(rules);

        // Both entries stay in the table; the lint flags the second.
        assert_eq!(set.exact_rules().len(), 2);
        let shadowed = set.find_shadowed();
        assert_eq!(shadowed.len(), 1);
        assert_eq!(shadowed[0].tier, Tier::Exact);
    }

    #[test]
    fn test_builtin_table_has_known_shadowing() {
        // The production table intentionally carries overlapping entries
        // (e.g. "retrait " declared before "retrait" in the prefix tier).
        let set = RuleSet::builtin().unwrap();
        assert!(!set.find_shadowed().is_empty());
    }
}
