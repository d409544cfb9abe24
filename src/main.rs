use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::process;

use transaction_categorizer::{
    apply_new_pairs, category_distribution, load_taxonomy, load_transactions, repair_savings,
    save_taxonomy, save_transactions, unresolved_labels, Classifier, ReprocessEngine, RuleSet,
};

const DEFAULT_TRANSACTIONS: &str = "data/transactions.json";
const DEFAULT_TAXONOMY: &str = "data/categories.json";

struct Args {
    transactions_path: PathBuf,
    taxonomy_path: PathBuf,
    rules_path: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut positional: Vec<String> = Vec::new();
    let mut rules_path = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--rules" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--rules requires a file path".to_string())?;
                rules_path = Some(PathBuf::from(value));
            }
            "--help" | "-h" => return Err(usage()),
            other if other.starts_with('-') => {
                return Err(format!("Unknown option: {}\n\n{}", other, usage()));
            }
            other => positional.push(other.to_string()),
        }
    }

    if positional.len() > 2 {
        return Err(usage());
    }

    let mut positional = positional.into_iter();
    Ok(Args {
        transactions_path: positional
            .next()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TRANSACTIONS)),
        taxonomy_path: positional
            .next()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TAXONOMY)),
        rules_path,
    })
}

fn usage() -> String {
    format!(
        "Usage: transaction-categorizer [TRANSACTIONS_JSON] [TAXONOMY_JSON] [--rules RULES_JSON]\n\
         \n\
         Defaults: {} {}",
        DEFAULT_TRANSACTIONS, DEFAULT_TAXONOMY
    )
}

fn main() -> Result<()> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            process::exit(2);
        }
    };

    run(&args)
}

fn run(args: &Args) -> Result<()> {
    println!("🏷️  Transaction Categorizer - Batch Reprocessing");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load rules
    let rules = match &args.rules_path {
        Some(path) => RuleSet::from_file(path)?,
        None => RuleSet::builtin()?,
    };
    let shadowed = rules.find_shadowed().len();
    println!("\n📐 Loaded {} rules ({} shadowed)", rules.rule_count(), shadowed);

    // 2. Load both documents before mutating anything
    let mut transactions = load_transactions(&args.transactions_path)?;
    let mut taxonomy = load_taxonomy(&args.taxonomy_path)?;
    println!(
        "📂 Loaded {} transactions, {} categories",
        transactions.len(),
        taxonomy.len()
    );

    // 3. Main reprocessing pass
    let engine = ReprocessEngine::new(Classifier::new(rules));
    let report = engine.run(&mut transactions, &taxonomy);
    println!("\n⚙️  {}", report.summary());
    for (kind, count) in &report.match_counts {
        println!("   {:5}  via {}", count, kind);
    }
    save_transactions(&args.transactions_path, &transactions)?;

    // 4. Fold new pairs into the taxonomy
    let update = apply_new_pairs(&mut taxonomy, &report.new_pairs);
    if update.changed() {
        for (category, subcategory) in &update.added {
            println!("🗂️  New subcategory: {} / {}", category, subcategory);
        }
        save_taxonomy(&args.taxonomy_path, &taxonomy)?;
    }
    for name in &update.unknown_categories {
        println!("⚠️  Category not in taxonomy (left as-is): {}", name);
    }

    // 5. Savings repair pass, second write-back only if it changed records
    let repaired = repair_savings(&mut transactions);
    if repaired > 0 {
        println!("🔧 Fixed {} savings transactions missing direction", repaired);
        save_transactions(&args.transactions_path, &transactions)?;
    }

    // 6. Summary
    let unresolved = unresolved_labels(&transactions);
    let still_uncategorized: usize = unresolved.values().sum();

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("📊 Still uncategorized: {}", still_uncategorized);
    println!("\nCategory distribution:");
    for ((category, subcategory), count) in category_distribution(&transactions) {
        if subcategory.is_empty() {
            println!("  {:5}  {}", count, category);
        } else {
            println!("  {:5}  {} / {}", count, category, subcategory);
        }
    }

    if !unresolved.is_empty() {
        println!("\nUncategorized labels ({} unique):", unresolved.len());
        let mut labels: Vec<_> = unresolved.into_iter().collect();
        labels.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        for (label, count) in labels {
            println!("  {:3}x  {}", count, label);
        }
    }

    println!("\n✅ Done");
    Ok(())
}
