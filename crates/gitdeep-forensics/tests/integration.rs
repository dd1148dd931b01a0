//! Integration tests: mine → classify → report on fixtures and on this workspace.

use std::path::Path;

use gitdeep_core::{DuplicationConfig, GitdeepConfig};
use gitdeep_forensics::duplication::detect_duplication;
use gitdeep_forensics::forensics::{analyze_files, Tag};
use gitdeep_forensics::mining::parse_log;
use gitdeep_forensics::report::report_for_history;

const LOG: &str = "\
^CF^c6|2024-06-08T23:10:00+02:00|alice
30\t2\tsrc/engine.py
2\t0\tsrc/util.py
^CF^c5|2024-05-04T22:40:00+02:00|alice
40\t1\tsrc/engine.py
2\t0\tsrc/util.py
^CF^c4|2024-04-10T10:00:00+02:00|bob
5\t5\ttests/test_engine.py
1\t1\tsrc/util.py
^CF^c3|2024-03-09T23:30:00+02:00|alice
90\t0\tsrc/engine.py
1\t0\tsrc/util.py
^CF^c2|2024-02-12T09:00:00+02:00|bob
3\t1\ttests/test_engine.py
^CF^c1|2024-01-15T09:00:00+02:00|alice
100\t0\tsrc/engine.py
-\t-\tassets/logo.png
";

fn workspace_root() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(Path::parent)
        .unwrap()
}

#[test]
fn end_to_end_on_log_fixture() {
    let history = parse_log(LOG);
    assert_eq!(history.len(), 6);

    let result = analyze_files(&history, &GitdeepConfig::default().forensics);
    assert_eq!(result.total_files_tracked, 4);

    // engine.py: 4 commits, all by alice, mostly late at night and on weekends
    let engine = result
        .files
        .iter()
        .find(|f| f.path == "src/engine.py")
        .expect("engine.py should be tracked");
    assert_eq!(engine.commit_count, 4);
    assert_eq!(engine.primary_owner, "alice");
    assert!((engine.ownership_pct - 100.0).abs() < 1e-9);
    assert_eq!(engine.net_growth, 257);

    let tags = result.tags_of("src/engine.py");
    assert!(tags.contains(&Tag::Hotspot));
    assert!(tags.contains(&Tag::SingleOwnerRisk));
    assert!(tags.contains(&Tag::Bloated));
    assert!(tags.contains(&Tag::NightOwl));
    assert!(!tags.contains(&Tag::Healthy));

    // util.py is co-changed with engine.py three times
    let pair = &result.top_coupled[0];
    assert_eq!((pair.file1.as_str(), pair.file2.as_str()), ("src/engine.py", "src/util.py"));
    assert_eq!(pair.co_commits, 3);

    // single-commit files are tracked but never classified
    assert!(result.tags_of("assets/logo.png").is_empty());
    assert!(result.tags_of("tests/test_engine.py").contains(&Tag::TestFile));
}

#[test]
fn combined_report_from_fixture() {
    let report = report_for_history(&parse_log(LOG), None, None, &GitdeepConfig::default());
    assert_eq!(report.bus_factor.bus_factor, 1);
    assert_eq!(report.bus_factor.top_contributors[0].author, "alice");
    assert_eq!(report.decay.activity_trend.len(), 6);

    let md = report.to_markdown();
    assert!(md.contains("## Contributor Concentration"));
    assert!(md.contains("## Activity Trend"));
    assert!(md.contains("## Commit Intent"));
    assert!(md.contains("No working tree scanned."));
}

#[test]
fn duplication_scan_on_workspace_sources() {
    let crates = workspace_root().join("crates");
    let report = detect_duplication(&crates, &DuplicationConfig::default(), &[]).unwrap();

    assert!(
        report.files_compared > 5,
        "should compare the workspace sources: {}",
        report.files_compared
    );
    assert!(!report.truncated);
    assert!((0.0..=100.0).contains(&report.duplication_pct));
    for window in report.pairs.windows(2) {
        assert!(window[0].similarity >= window[1].similarity);
    }
}

#[test]
fn mining_is_repeatable() {
    assert_eq!(parse_log(LOG), parse_log(LOG));
}
