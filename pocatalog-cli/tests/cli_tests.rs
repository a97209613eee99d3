use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn pocatalog_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("pocatalog"))
}

fn corpus(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("tests")
        .join("data")
        .join("lib")
        .join("corpus")
        .join(name)
}

/// Config pointing at a gettext directory that doesn't exist, so results don't
/// depend on what is installed.
fn no_gettext_config(dir: &Path) -> PathBuf {
    let path = dir.join("pocatalog.toml");
    fs::write(&path, "gettext_path = \"/nonexistent/gettext\"\ncompile_mo = false\n").unwrap();
    path
}

fn run(args: &[&str]) -> Output {
    pocatalog_cmd().args(args).output().expect("Failed to execute command")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "Command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_view_shows_entries() {
    let input = corpus("plurals_cs.po");
    let output = run(&["view", "-i", input.to_str().unwrap()]);
    assert_success(&output);

    let stdout = stdout_of(&output);
    assert!(stdout.contains("Language: cs"));
    assert!(stdout.contains("Plural forms: 3"));
    assert!(stdout.contains("Entry 1 (line"));
    assert!(stdout.contains("[1]: %d soubory vybrány"));
    assert!(stdout.contains("Status: fuzzy"));
    assert!(stdout.contains("Context: menu"));
}

#[test]
fn test_view_untranslated_only() {
    let input = corpus("two_entries.po");
    let output = run(&["view", "-i", input.to_str().unwrap(), "--untranslated"]);
    assert_success(&output);

    let stdout = stdout_of(&output);
    assert!(stdout.contains("Bye"));
    assert!(!stdout.contains("Bonjour"));
}

#[test]
fn test_view_missing_file_fails() {
    let output = run(&["view", "-i", "/nonexistent/fr.po"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error reading /nonexistent/fr.po"));
}

#[test]
fn test_stats_json_for_glob() {
    let temp_dir = TempDir::new().unwrap();
    fs::copy(corpus("two_entries.po"), temp_dir.path().join("fr.po")).unwrap();
    fs::copy(corpus("plurals_cs.po"), temp_dir.path().join("cs.po")).unwrap();
    fs::write(temp_dir.path().join("notes.txt"), "not a catalog").unwrap();

    let pattern = format!("{}/*.po", temp_dir.path().display());
    let output = run(&["stats", "-i", &pattern, "--json"]);
    assert_success(&output);

    let v: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(v["summary"]["files"], 2);
    assert_eq!(v["summary"]["total"], 4);
    let files = v["files"].as_array().unwrap();
    // sorted by path: cs.po first
    assert_eq!(files[0]["language"], "cs");
    assert_eq!(files[0]["fuzzy"], 1);
    assert_eq!(files[1]["language"], "fr");
    assert_eq!(files[1]["translated"], 1);
    assert_eq!(files[1]["untranslated"], 1);
    assert_eq!(files[1]["completion_percent"], 50.0);
}

#[test]
fn test_stats_text_output() {
    let input = corpus("obsolete.po");
    let output = run(&["stats", "-i", input.to_str().unwrap()]);
    assert_success(&output);

    let stdout = stdout_of(&output);
    assert!(stdout.contains("=== Stats ==="));
    assert!(stdout.contains("Obsolete: 3"));
    assert!(stdout.contains("Completion: 100.00%"));
}

#[test]
fn test_check_reports_parse_error_with_line() {
    let temp_dir = TempDir::new().unwrap();
    let config = no_gettext_config(temp_dir.path());
    let input = corpus("broken_plural.po");

    let output = run(&[
        "check",
        "--config",
        config.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "--json",
    ]);
    assert!(!output.status.success(), "broken file should fail the check");

    let v: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(v["errors"], 1);
    let problem = &v["files"][0]["problems"][0];
    assert_eq!(problem["severity"], "error");
    assert_eq!(problem["line"], 6);
}

#[test]
fn test_check_passes_clean_file_without_msgfmt() {
    let temp_dir = TempDir::new().unwrap();
    let config = no_gettext_config(temp_dir.path());
    let input = corpus("two_entries.po");

    let output = run(&["check", "--config", config.to_str().unwrap(), "-i", input.to_str().unwrap()]);
    assert_success(&output);
    assert!(stdout_of(&output).contains("✅"));
}

#[test]
fn test_check_warns_about_misdeclared_charset() {
    let temp_dir = TempDir::new().unwrap();
    let config = no_gettext_config(temp_dir.path());
    let input = corpus("misdeclared_utf8.po");

    let output = run(&[
        "check",
        "--config",
        config.to_str().unwrap(),
        "-i",
        input.to_str().unwrap(),
        "--json",
    ]);
    assert_success(&output);

    let v: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(v["files"][0]["msgfmt_checked"], false);
    assert_eq!(v["files"][0]["problems"][0]["severity"], "warning");
}

#[test]
fn test_normalize_without_gettext_keeps_content() {
    let temp_dir = TempDir::new().unwrap();
    let config = no_gettext_config(temp_dir.path());
    let output_file = temp_dir.path().join("fr.po");

    let output = run(&[
        "normalize",
        "--config",
        config.to_str().unwrap(),
        "-i",
        corpus("two_entries.po").to_str().unwrap(),
        "-o",
        output_file.to_str().unwrap(),
    ]);
    assert_success(&output);
    assert!(String::from_utf8_lossy(&output.stderr).contains("saved without formatting"));

    let saved = fs::read_to_string(&output_file).unwrap();
    assert!(saved.contains("msgid \"Hello\"\nmsgstr \"Bonjour\"\n"));
    assert!(saved.contains("msgid \"Bye\"\nmsgstr \"\"\n"));
    assert!(!temp_dir.path().join("fr.mo").exists());
}

#[test]
fn test_normalize_applies_dos_line_endings_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("dos.toml");
    fs::write(
        &config,
        "gettext_path = \"/nonexistent/gettext\"\nkeep_format = false\nline_ending = \"dos\"\n",
    )
    .unwrap();
    let output_file = temp_dir.path().join("fr.po");

    let output = run(&[
        "normalize",
        "--config",
        config.to_str().unwrap(),
        "-i",
        corpus("two_entries.po").to_str().unwrap(),
        "-o",
        output_file.to_str().unwrap(),
        "--no-mo",
    ]);
    assert_success(&output);

    let saved = fs::read_to_string(&output_file).unwrap();
    assert!(saved.contains("msgid \"Hello\"\r\nmsgstr \"Bonjour\"\r\n"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("bad.toml");
    fs::write(&config, "line_ending = \"mac\"\n").unwrap();

    let output = run(&[
        "stats",
        "--config",
        config.to_str().unwrap(),
        "-i",
        corpus("two_entries.po").to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid config file"));
}

#[test]
fn test_debug_writes_json_file() {
    let temp_dir = TempDir::new().unwrap();
    let output_file = temp_dir.path().join("dump.json");

    let output = run(&[
        "debug",
        "-i",
        corpus("plurals_cs.po").to_str().unwrap(),
        "-o",
        output_file.to_str().unwrap(),
    ]);
    assert_success(&output);

    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output_file).unwrap()).unwrap();
    assert_eq!(v["language"], "cs");
    assert_eq!(v["plural_forms"], 3);
    assert_eq!(v["items"][0]["msgid_plural"].is_string(), true);
    assert_eq!(v["items"][1]["context"], "menu");
    assert_eq!(v["items"][0]["references"][1], "src/status.c:57");
}

#[test]
fn test_compile_rejects_templates() {
    let output = run(&["compile", "-i", corpus("messages.pot").to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("POT template"));
}

#[test]
fn test_update_reports_missing_reference() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("fr.po");
    fs::copy(corpus("two_entries.po"), &input).unwrap();

    let output = run(&[
        "update",
        "-i",
        input.to_str().unwrap(),
        "-p",
        "/nonexistent/messages.pot",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("couldn't be opened"));
}
