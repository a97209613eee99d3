use indoc::indoc;
use pocatalog::{
    CancellationToken, Catalog, CatalogConfig, FileType, GettextRunner, IssueKind, LoadFlags,
    UpdateContext, perform_update_from_reference,
};
use std::fs;
use std::path::{Path, PathBuf};

fn corpus_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("tests")
        .join("data")
        .join("lib")
        .join("corpus")
}

fn gettext_available() -> bool {
    let runner = GettextRunner::new();
    ["msgmerge", "msgfmt", "msgcat"]
        .iter()
        .all(|program| runner.is_available(program))
}

macro_rules! require_gettext {
    () => {
        if !gettext_available() {
            eprintln!("skipping: gettext tools are not installed");
            return;
        }
    };
}

const HELLO_BYE_PO: &str = indoc! {r#"
    msgid ""
    msgstr ""
    "Language: fr\n"
    "Content-Type: text/plain; charset=UTF-8\n"

    msgid "Hello"
    msgstr "Bonjour"

    msgid "Bye"
    msgstr "Au revoir"
"#};

#[test]
fn merge_keeps_translations_and_obsoletes_removed_strings() {
    require_gettext!();

    let mut catalog =
        Catalog::from_bytes(HELLO_BYE_PO.as_bytes(), FileType::Po, LoadFlags::default()).expect("load po");
    let reference = Catalog::load(
        corpus_root().join("messages.pot"),
        LoadFlags::new().with_ignore_translations(true),
    )
    .expect("load pot");

    let errors = catalog
        .merge(&reference, &CatalogConfig::default().with_merge_behavior(pocatalog::MergeBehavior::None))
        .expect("merge");
    assert!(errors.errors().next().is_none());

    let strings: Vec<&str> = catalog.items().iter().map(|i| i.string.as_str()).collect();
    assert_eq!(strings, vec!["Hello", "New string"]);
    assert_eq!(catalog.items()[0].translation(), "Bonjour");
    assert!(!catalog.items()[1].is_translated());
    assert_eq!(catalog.items()[0].references, vec!["src/main.c:10"]);

    assert_eq!(catalog.deleted_items().len(), 1);
    assert!(catalog.deleted_items()[0].lines.iter().any(|l| l.contains("Bye")));
    assert_eq!(catalog.header().charset, "UTF-8");
}

#[test]
fn update_from_reference_reports_changes() {
    require_gettext!();

    let catalog =
        Catalog::from_bytes(HELLO_BYE_PO.as_bytes(), FileType::Po, LoadFlags::default()).expect("load po");
    let config = CatalogConfig::default();
    let token = CancellationToken::new();
    let ctx = UpdateContext::new(&config, &token);

    let outcome = perform_update_from_reference(&catalog, corpus_root().join("messages.pot"), &ctx)
        .expect("update");
    assert_eq!(outcome.summary.summary, "Translation file was updated with 2 changes.");
    assert_eq!(outcome.summary.stats.added, vec!["New string"]);
    assert_eq!(outcome.summary.stats.removed, vec!["Bye"]);
    assert_eq!(outcome.catalog.items().len(), 2);
    // the input catalog is left alone
    assert_eq!(catalog.items().len(), 2);
    assert_eq!(catalog.items()[1].string, "Bye");
}

#[test]
fn validation_attaches_issues_to_items() {
    require_gettext!();

    let text = indoc! {r#"
        msgid ""
        msgstr ""
        "Language: fr\n"
        "Content-Type: text/plain; charset=UTF-8\n"

        #, c-format
        msgid "%d apples"
        msgstr "pommes"

        msgid "Fine"
        msgstr "Bien"
    "#};
    let mut catalog = Catalog::from_bytes(text.as_bytes(), FileType::Po, LoadFlags::default()).expect("load");
    let results = catalog.validate(None, &CatalogConfig::default()).expect("validate");

    assert!(results.errors >= 1);
    let issue = catalog.items()[0].issue.as_ref().expect("issue on the format string");
    assert_eq!(issue.kind, IssueKind::Error);
    assert!(catalog.items()[1].issue.is_none());
}

#[test]
fn save_formats_and_compiles() {
    require_gettext!();

    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("fr.po");
    let mut catalog =
        Catalog::from_bytes(HELLO_BYE_PO.as_bytes(), FileType::Po, LoadFlags::default()).expect("load");

    let result = catalog.save(&path, true, &CatalogConfig::default()).expect("save");
    assert!(result.notices.is_empty(), "unexpected notices: {:?}", result.notices);
    assert_eq!(result.validation.errors, 0);
    assert_eq!(result.mo_status, pocatalog::CompilationStatus::Success);
    assert!(path.with_extension("mo").exists());

    let saved = fs::read_to_string(&path).expect("read saved file");
    assert!(saved.contains("msgid \"Hello\"\nmsgstr \"Bonjour\"\n"));

    let reloaded = Catalog::load(&path, LoadFlags::default()).expect("reload");
    assert_eq!(reloaded.items().len(), 2);
}

#[test]
fn template_update_needs_no_tools() {
    let mut pot = Catalog::load(corpus_root().join("messages.pot"), LoadFlags::default()).expect("load pot");
    let mut newer = Catalog::new(FileType::Pot);
    newer.add_item(pocatalog::CatalogItem::new("Only this"));

    pot.update_from_pot(&newer, false, &CatalogConfig::default()).expect("update");
    assert_eq!(pot.items().len(), 1);
    assert_eq!(pot.items()[0].string, "Only this");
}
