//! Drives the per-file scanner across whole roots and aggregates results.
//!
//! Files are enumerated up front in a fixed, repeatable order (lexicographic
//! within each root, roots in caller order) so output and progress totals
//! are reproducible. One file is fully parsed and matched before the next
//! begins; callbacks run synchronously on the calling thread, in
//! file-processing order. The loop is interruptible between files without
//! losing results already collected.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::{MatchRecord, ScanStatistics};
use tracing::warn;
use walkdir::WalkDir;

use crate::registry::RuleSet;
use crate::scanner::{display_path, FileScanner};
use crate::ExcavatorError;

/// Directory names pruned from enumeration: vendored/third-party code and
/// build output.
const DEFAULT_EXCLUDED_DIRS: &[&str] = &["vendor", "node_modules", ".Build", ".git"];

/// The single recognized source-file extension.
const SOURCE_EXTENSION: &str = "php";

/// Findings and counters for one scanned root.
#[derive(Debug)]
pub struct RootReport {
    /// Caller-supplied identifier for this root (e.g. an extension name).
    pub key: String,
    /// The root path as given by the caller.
    pub root: PathBuf,
    /// All records, in deterministic file order, then per-file collection
    /// order.
    pub records: Vec<MatchRecord>,
    pub stats: ScanStatistics,
}

/// Results of a whole scan across one or more roots.
#[derive(Debug)]
pub struct ScanReport {
    pub roots: Vec<RootReport>,
    /// Files actually processed (equals `total_files` unless interrupted).
    pub files_scanned: usize,
    /// Files enumerated across all roots.
    pub total_files: usize,
    /// `true` when the cancellation flag stopped the loop early. Records
    /// collected before the stop are retained.
    pub interrupted: bool,
    pub totals: ScanStatistics,
}

/// Orchestrates scanning: enumeration, per-file dispatch, callbacks,
/// aggregation.
pub struct ScanOrchestrator<'cb> {
    rules: RuleSet,
    excluded_dirs: Vec<String>,
    progress: Option<Box<dyn FnMut(usize, usize) + 'cb>>,
    parse_error: Option<Box<dyn FnMut(&str, &str) + 'cb>>,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'cb> ScanOrchestrator<'cb> {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
            progress: None,
            parse_error: None,
            cancel: None,
        }
    }

    /// Progress notification `(processed, total)`, fired after every file
    /// regardless of outcome.
    pub fn with_progress(mut self, callback: impl FnMut(usize, usize) + 'cb) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Parse-failure notification `(file identity, detail)`, fired once per
    /// failing file.
    pub fn with_parse_error(mut self, callback: impl FnMut(&str, &str) + 'cb) -> Self {
        self.parse_error = Some(Box::new(callback));
        self
    }

    /// Cooperative cancellation, checked between files.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Adds a directory name to the exclusion list.
    pub fn exclude(mut self, dir: impl Into<String>) -> Self {
        self.excluded_dirs.push(dir.into());
        self
    }

    /// Identifiers of the active rules, independent of any scan having run.
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.rule_ids()
    }

    /// Scans a single root.
    pub fn scan_root(&mut self, key: &str, root: &Path) -> Result<RootReport, ExcavatorError> {
        let report = self.scan_roots(&[(key.to_string(), root.to_path_buf())])?;
        Ok(report
            .roots
            .into_iter()
            .next()
            .expect("scan_roots returns one report per requested root"))
    }

    /// Scans every root, keyed by the caller-supplied identifiers.
    ///
    /// # Errors
    /// `RootNotFound` when any root is missing or unreadable — distinct
    /// from a root that contains no matching files, which scans as an
    /// empty success.
    pub fn scan_roots(
        &mut self,
        roots: &[(String, PathBuf)],
    ) -> Result<ScanReport, ExcavatorError> {
        // Enumerate everything up front: hard-fails fast on a bad root and
        // fixes the progress denominator across all roots.
        let mut work: Vec<(usize, PathBuf, String)> = Vec::new();
        for (index, (_, root)) in roots.iter().enumerate() {
            let canonical = dunce::canonicalize(root)
                .map_err(|_| ExcavatorError::RootNotFound(root.clone()))?;
            // Surfaces permission errors the canonicalize call tolerates.
            std::fs::read_dir(&canonical)
                .map_err(|_| ExcavatorError::RootNotFound(root.clone()))?;

            for (absolute, relative) in enumerate_source_files(&canonical, &self.excluded_dirs) {
                work.push((index, absolute, relative));
            }
        }

        let mut reports: Vec<RootReport> = roots
            .iter()
            .map(|(key, root)| RootReport {
                key: key.clone(),
                root: root.clone(),
                records: Vec::new(),
                stats: ScanStatistics::default(),
            })
            .collect();

        let total = work.len();
        let mut processed = 0usize;
        let mut interrupted = false;
        let mut scanner = FileScanner::new(&self.rules)?;

        for (index, absolute, relative) in &work {
            if let Some(flag) = &self.cancel {
                if flag.load(Ordering::Relaxed) {
                    interrupted = true;
                    break;
                }
            }

            match scanner.scan_file(relative, absolute, self.parse_error.as_deref_mut()) {
                Ok(records) => reports[*index].records.extend(records),
                Err(e) => {
                    // Per-file failures never abort the scan of other files.
                    warn!(file = %relative, "file skipped: {e}");
                }
            }

            processed += 1;
            if let Some(callback) = self.progress.as_deref_mut() {
                callback(processed, total);
            }
        }

        let mut totals = ScanStatistics::default();
        for report in &mut reports {
            report.stats = ScanStatistics::from_records(&report.records);
            totals.merge(report.stats);
        }

        Ok(ScanReport {
            roots: reports,
            files_scanned: processed,
            total_files: total,
            interrupted,
            totals,
        })
    }
}

/// Yields `(absolute, root-relative)` source files under a root in
/// lexicographic order, pruning excluded directories.
fn enumerate_source_files(root: &Path, excluded: &[String]) -> Vec<(PathBuf, String)> {
    let mut files: Vec<(PathBuf, String)> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && entry
                    .file_name()
                    .to_str()
                    .map(|name| excluded.iter().any(|ex| ex == name))
                    .unwrap_or(false))
        })
        .flatten()
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext == SOURCE_EXTENSION)
                .unwrap_or(false)
        })
        .map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(root)
                .map(display_path)
                .unwrap_or_else(|_| display_path(entry.path()));
            (entry.path().to_path_buf(), relative)
        })
        .collect();

    files.sort_by(|a, b| a.1.cmp(&b.1));
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RuleKind;
    use serde_json::json;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;

    fn test_rules() -> RuleSet {
        RuleSet::from_payloads(vec![
            (
                RuleKind::MethodCallStatic,
                json!({
                    "Core\\Utility\\GeneralUtility::loadTca": {
                        "numberOfMandatoryArguments": 1,
                        "maximumNumberOfArguments": 1
                    }
                }),
            ),
            (RuleKind::Constant, json!({ "LEGACY_DLOG": {} })),
            (
                RuleKind::MethodCall,
                json!({ "Core\\Page\\PageRenderer->loadJquery": {} }),
            ),
        ])
    }

    fn make_root(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(name);
        fs::remove_dir_all(&root).ok();
        fs::create_dir_all(&root).unwrap();
        root
    }

    #[test]
    fn test_end_to_end_three_files() {
        let root = make_root("excavator_orch_e2e");
        // File A: two strong findings.
        fs::write(
            root.join("a.php"),
            "<?php\n$log = LEGACY_DLOG;\n\\Core\\Utility\\GeneralUtility::loadTca('x');\n",
        )
        .unwrap();
        // File B: one weak finding.
        fs::write(root.join("b.php"), "<?php\n$renderer->loadJquery();\n").unwrap();
        // File C: ignored (no declarations, no executable statements).
        fs::write(root.join("c.php"), "<?php\nnamespace Quiet\\Corner;\n").unwrap();

        let progress = Rc::new(RefCell::new(Vec::new()));
        let progress_log = Rc::clone(&progress);
        let mut orchestrator = ScanOrchestrator::new(test_rules())
            .with_progress(move |done, total| progress_log.borrow_mut().push((done, total)));

        let report = orchestrator
            .scan_root("demo_ext", &root)
            .expect("scan succeeds");

        assert_eq!(report.records.len(), 3);
        assert_eq!(report.stats.strong, 2);
        assert_eq!(report.stats.weak, 1);
        assert_eq!(report.stats.total(), 3);
        assert!(!report.records.iter().any(|r| r.relative_path == "c.php"));
        assert_eq!(*progress.borrow(), vec![(1, 3), (2, 3), (3, 3)]);

        fs::remove_dir_all(root).ok();
    }

    #[test]
    fn test_parse_failure_is_soft_and_notified_once() {
        let root = make_root("excavator_orch_parse_error");
        fs::write(root.join("bad.php"), "<?php class Broken {\n").unwrap();
        fs::write(root.join("good.php"), "<?php $log = LEGACY_DLOG;\n").unwrap();

        let errors = Rc::new(RefCell::new(Vec::new()));
        let error_log = Rc::clone(&errors);
        let mut orchestrator = ScanOrchestrator::new(test_rules())
            .with_parse_error(move |file, message| {
                error_log.borrow_mut().push((file.to_string(), message.to_string()));
            });

        let report = orchestrator.scan_root("ext", &root).unwrap();

        assert_eq!(errors.borrow().len(), 1);
        assert_eq!(errors.borrow()[0].0, "bad.php");
        // The bad file contributes nothing; the good file still reports.
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].relative_path, "good.php");
        assert_eq!(report.files_scanned, 2);

        fs::remove_dir_all(root).ok();
    }

    #[test]
    fn test_deterministic_lexicographic_order() {
        let root = make_root("excavator_orch_order");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("zzz.php"), "<?php $a = LEGACY_DLOG;\n").unwrap();
        fs::write(root.join("aaa.php"), "<?php $a = LEGACY_DLOG;\n").unwrap();
        fs::write(root.join("sub/mid.php"), "<?php $a = LEGACY_DLOG;\n").unwrap();

        let mut orchestrator = ScanOrchestrator::new(test_rules());
        let report = orchestrator.scan_root("ext", &root).unwrap();

        let order: Vec<&str> = report
            .records
            .iter()
            .map(|r| r.relative_path.as_str())
            .collect();
        assert_eq!(order, vec!["aaa.php", "sub/mid.php", "zzz.php"]);

        fs::remove_dir_all(root).ok();
    }

    #[test]
    fn test_vendor_and_non_php_excluded() {
        let root = make_root("excavator_orch_excluded");
        fs::create_dir_all(root.join("vendor/pkg")).unwrap();
        fs::write(root.join("vendor/pkg/lib.php"), "<?php $a = LEGACY_DLOG;\n").unwrap();
        fs::write(root.join("notes.txt"), "LEGACY_DLOG").unwrap();
        fs::write(root.join("app.php"), "<?php $a = LEGACY_DLOG;\n").unwrap();

        let mut orchestrator = ScanOrchestrator::new(test_rules());
        let report = orchestrator.scan_root("ext", &root).unwrap();

        assert_eq!(report.total_files, 1);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].relative_path, "app.php");

        fs::remove_dir_all(root).ok();
    }

    #[test]
    fn test_missing_root_is_a_hard_error() {
        let mut orchestrator = ScanOrchestrator::new(test_rules());
        let err = orchestrator
            .scan_root("ext", Path::new("/no/such/root"))
            .unwrap_err();
        assert!(matches!(err, ExcavatorError::RootNotFound(_)));
    }

    #[test]
    fn test_empty_root_is_empty_success() {
        let root = make_root("excavator_orch_empty");
        let mut orchestrator = ScanOrchestrator::new(test_rules());
        let report = orchestrator.scan_root("ext", &root).unwrap();
        assert_eq!(report.total_files, 0);
        assert_eq!(report.totals.total(), 0);
        assert!(!report.interrupted);
        fs::remove_dir_all(root).ok();
    }

    #[test]
    fn test_cancellation_between_files_keeps_completed_results() {
        let root = make_root("excavator_orch_cancel");
        fs::write(root.join("a.php"), "<?php $a = LEGACY_DLOG;\n").unwrap();
        fs::write(root.join("b.php"), "<?php $b = LEGACY_DLOG;\n").unwrap();

        let flag = Arc::new(AtomicBool::new(false));
        let trip = Arc::clone(&flag);
        let mut orchestrator = ScanOrchestrator::new(test_rules())
            .with_cancel_flag(Arc::clone(&flag))
            .with_progress(move |_, _| trip.store(true, Ordering::Relaxed));

        let report = orchestrator.scan_root("ext", &root).unwrap();

        assert!(report.interrupted);
        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].relative_path, "a.php");

        fs::remove_dir_all(root).ok();
    }

    #[test]
    fn test_multiple_roots_share_progress_denominator() {
        let root_a = make_root("excavator_orch_multi_a");
        let root_b = make_root("excavator_orch_multi_b");
        fs::write(root_a.join("one.php"), "<?php $a = LEGACY_DLOG;\n").unwrap();
        fs::write(root_b.join("two.php"), "<?php $b = LEGACY_DLOG;\n").unwrap();

        let progress = Rc::new(RefCell::new(Vec::new()));
        let progress_log = Rc::clone(&progress);
        let mut orchestrator = ScanOrchestrator::new(test_rules())
            .with_progress(move |done, total| progress_log.borrow_mut().push((done, total)));

        let report = orchestrator
            .scan_roots(&[
                ("ext_a".to_string(), root_a.clone()),
                ("ext_b".to_string(), root_b.clone()),
            ])
            .unwrap();

        assert_eq!(report.roots.len(), 2);
        assert_eq!(report.roots[0].key, "ext_a");
        assert_eq!(report.roots[0].stats.total(), 1);
        assert_eq!(report.roots[1].stats.total(), 1);
        assert_eq!(report.totals.total(), 2);
        assert_eq!(*progress.borrow(), vec![(1, 2), (2, 2)]);

        fs::remove_dir_all(root_a).ok();
        fs::remove_dir_all(root_b).ok();
    }

    #[test]
    fn test_malformed_rule_dropped_scan_still_reports_others() {
        let rules_dir = make_root("excavator_orch_rules");
        fs::write(
            rules_dir.join("ConstantMatcher.json"),
            serde_json::to_string(&json!({ "LEGACY_DLOG": {} })).unwrap(),
        )
        .unwrap();
        fs::write(rules_dir.join("MethodCallMatcher.json"), "{{ broken").unwrap();

        let root = make_root("excavator_orch_rules_src");
        fs::write(root.join("app.php"), "<?php $a = LEGACY_DLOG;\n").unwrap();

        let rules = RuleSet::load(&rules_dir);
        assert_eq!(rules.rule_ids(), vec!["ConstantMatcher"]);

        let mut orchestrator = ScanOrchestrator::new(rules);
        let report = orchestrator.scan_root("ext", &root).unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].rule_id, "ConstantMatcher");

        fs::remove_dir_all(rules_dir).ok();
        fs::remove_dir_all(root).ok();
    }

    #[test]
    fn test_rule_ids_without_scanning() {
        let orchestrator = ScanOrchestrator::new(test_rules());
        let ids = orchestrator.rule_ids();
        assert_eq!(
            ids,
            vec!["MethodCallStaticMatcher", "ConstantMatcher", "MethodCallMatcher"]
        );
    }
}
