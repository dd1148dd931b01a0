use std::process::Command;

const LOG: &str = "\
^CF^c4|2024-04-02T10:00:00+00:00|alice
10\t2\tsrc/core.py
3\t1\ttests/test_core.py
^CF^c3|2024-03-02T10:00:00+00:00|alice
20\t0\tsrc/core.py
^CF^c2|2024-02-02T10:00:00+00:00|bob
1\t1\ttests/test_core.py
^CF^c1|2024-01-02T10:00:00+00:00|alice
80\t0\tsrc/core.py
";

fn gitdeep(dir: &std::path::Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_gitdeep"))
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap()
}

#[test]
fn forensics_from_log_file_as_json() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("history.txt"), LOG).unwrap();

    let output = gitdeep(dir.path(), &["forensics", "--log", "history.txt", "--format", "json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["totalFilesTracked"], 2);
    assert_eq!(json["hotspots"][0]["path"], "src/core.py");
    assert_eq!(json["testFiles"][0]["path"], "tests/test_core.py");
}

#[test]
fn contributors_from_commit_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let commits = r#"[
        {"sha": "3", "message": "c", "author": "alice", "date": "2024-03-01T00:00:00Z"},
        {"sha": "2", "message": "b", "author": "alice", "date": "2024-02-01T00:00:00Z"},
        {"sha": "1", "message": "a", "author": "bob", "date": "2024-01-01T00:00:00Z"}
    ]"#;
    std::fs::write(dir.path().join("commits.json"), commits).unwrap();

    let output = gitdeep(dir.path(), &["contributors", "--commits", "commits.json", "--format", "json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["busFactor"], 1);
    assert_eq!(json["totalContributors"], 2);
    assert_eq!(json["topContributors"][0]["author"], "alice");
}

#[test]
fn intent_from_commit_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let commits = r#"[
        {"sha": "3", "message": "fix: null deref", "author": "alice", "date": null},
        {"sha": "2", "message": "chore: bump deps", "author": "alice", "date": null},
        {"sha": "1", "message": "Add exporter", "author": "bob", "date": null}
    ]"#;
    std::fs::write(dir.path().join("commits.json"), commits).unwrap();

    let output = gitdeep(dir.path(), &["intent", "--commits", "commits.json", "--format", "json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["feature"], 1);
    assert_eq!(json["techDebtRatio"], 2.0);
    assert_eq!(json["maintenanceFocus"], true);
}

#[test]
fn trend_renders_markdown() {
    let dir = tempfile::tempdir().unwrap();
    let commits = r#"[
        {"sha": "2", "message": "b", "author": null, "date": "2024-02-01T00:00:00Z"},
        {"sha": "1", "message": "a", "author": null, "date": "2024-01-01T00:00:00Z"}
    ]"#;
    std::fs::write(dir.path().join("commits.json"), commits).unwrap();

    let output = gitdeep(dir.path(), &["trend", "--commits", "commits.json", "--format", "markdown"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("## Activity Trend"));
    assert!(stdout.contains("| 2024-01 | 1 |"));
}

#[test]
fn dups_flags_copied_file() {
    let dir = tempfile::tempdir().unwrap();
    let body: String = (0..12).map(|i| format!("value_{i} = compute_something({i})\n")).collect();
    std::fs::create_dir(dir.path().join("src")).unwrap();
    std::fs::write(dir.path().join("src/a.py"), &body).unwrap();
    std::fs::write(dir.path().join("src/b.py"), &body).unwrap();

    let output = gitdeep(dir.path(), &["dups", "--path", ".", "--format", "json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["pairs"][0]["similarity"], 1.0);
    assert_eq!(json["filesCompared"], 2);
}

#[test]
fn missing_log_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = gitdeep(dir.path(), &["forensics", "--log", "nope.txt"]);
    assert!(!output.status.success());
}
