use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use common::record::readable_category;
use excavator::{RuleSet, ScanOrchestrator};

#[derive(Parser)]
#[command(name = "relic")]
#[command(about = "Deprecated API usage scanner for PHP projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one or more project roots for deprecated API usage.
    Scan {
        /// Project roots to scan.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Directory holding the rule configuration JSON files.
        #[arg(long)]
        rules: PathBuf,
        /// Also print documentation references for each finding.
        #[arg(long)]
        verbose: bool,
    },
    /// List the active rule identifiers for a rule directory.
    Rules {
        /// Directory holding the rule configuration JSON files.
        #[arg(long)]
        rules: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Scan {
            paths,
            rules,
            verbose,
        } => cmd_scan(paths, rules, *verbose),
        Commands::Rules { rules } => cmd_rules(rules),
    }
}

fn cmd_scan(paths: &[PathBuf], rules_dir: &Path, verbose: bool) -> anyhow::Result<()> {
    let rules = RuleSet::load(rules_dir);
    if rules.is_empty() {
        eprintln!(
            "warning: no rule configurations loaded from {}",
            rules_dir.display()
        );
    }

    let roots: Vec<(String, PathBuf)> = paths
        .iter()
        .map(|path| (root_key(path), path.clone()))
        .collect();

    let mut orchestrator = ScanOrchestrator::new(rules)
        .with_progress(|processed, total| {
            eprint!("\r  scanning {processed}/{total}");
            std::io::stderr().flush().ok();
        })
        .with_parse_error(|file, message| {
            eprintln!("\rwarning: skipping {file}: {message}");
        });

    let report = orchestrator.scan_roots(&roots)?;
    eprintln!();

    println!("+------------------------------------------+");
    println!("| RELIC SCAN                               |");
    println!("+------------------------------------------+");
    println!("| Files scanned  : {:>22} |", report.files_scanned);
    println!("| Strong         : {:>22} |", report.totals.strong);
    println!("| Weak           : {:>22} |", report.totals.weak);
    println!("| Total          : {:>22} |", report.totals.total());
    println!("+------------------------------------------+");

    for root in &report.roots {
        if report.roots.len() > 1 {
            println!(
                "\n[{}] strong: {}, weak: {}",
                root.key, root.stats.strong, root.stats.weak
            );
        }
        for record in &root.records {
            println!(
                "  {}:{} [{}] {} ({})",
                record.relative_path,
                record.line,
                record.severity,
                record.message,
                record.category()
            );
            if verbose {
                for doc in &record.docs {
                    println!("      see {doc}");
                }
            }
        }
    }

    if report.totals.total() == 0 {
        println!("No deprecated API usage detected.");
    }

    if report.totals.strong > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_rules(rules_dir: &Path) -> anyhow::Result<()> {
    let rules = RuleSet::load(rules_dir);
    println!("{} active rule(s):", rules.len());
    for rule_id in rules.rule_ids() {
        println!("  {rule_id} ({})", readable_category(rule_id));
    }
    Ok(())
}

/// Report key for a root: its final path component.
fn root_key(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
