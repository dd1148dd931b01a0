use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_gitdeep"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "gitdeep init failed: {}", String::from_utf8_lossy(&output.stderr));

    let config_path = dir.path().join(".gitdeep.toml");
    assert!(config_path.exists(), ".gitdeep.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[forensics]"));
    assert!(content.contains("[duplication]"));

    let _config: gitdeep_core::GitdeepConfig = toml::from_str(&content).unwrap();
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".gitdeep.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_gitdeep"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let content = std::fs::read_to_string(dir.path().join(".gitdeep.toml")).unwrap();
    assert_eq!(content, "# existing");
}
