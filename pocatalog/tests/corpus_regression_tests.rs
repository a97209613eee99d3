use pocatalog::{
    Catalog, CatalogConfig, CharsetIssue, Error, FileType, LineEnding, LoadFlags, WrapWidth,
};
use std::fs;
use std::path::{Path, PathBuf};

struct ExpectedItem {
    context: Option<&'static str>,
    string: &'static str,
    translations: &'static [&'static str],
    fuzzy: bool,
}

struct ParseCase {
    name: &'static str,
    input_relative_path: &'static str,
    language: Option<&'static str>,
    line_ending: LineEnding,
    wrap_width: WrapWidth,
    expected_items: Vec<ExpectedItem>,
    deleted_count: usize,
}

fn corpus_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("tests")
        .join("data")
        .join("lib")
        .join("corpus")
}

fn load(name: &str) -> Catalog {
    let path = corpus_root().join(name);
    Catalog::load(&path, LoadFlags::default())
        .unwrap_or_else(|e| panic!("failed to load {}: {}", path.display(), e))
}

fn assert_items(catalog: &Catalog, expected: &[ExpectedItem], case_name: &str) {
    assert_eq!(
        catalog.items().len(),
        expected.len(),
        "case '{}' item count mismatch",
        case_name
    );
    for (index, (item, want)) in catalog.items().iter().zip(expected).enumerate() {
        assert_eq!(item.id as usize, index + 1, "case '{}' id mismatch", case_name);
        assert_eq!(item.context.as_deref(), want.context, "case '{}' context mismatch", case_name);
        assert_eq!(item.string, want.string, "case '{}' source mismatch", case_name);
        assert_eq!(
            item.translations, want.translations,
            "case '{}' translations mismatch for '{}'",
            case_name, want.string
        );
        assert_eq!(item.is_fuzzy(), want.fuzzy, "case '{}' fuzzy mismatch", case_name);
    }
}

#[test]
fn parse_corpora_table_driven() {
    let cases = vec![
        ParseCase {
            name: "two_entries",
            input_relative_path: "two_entries.po",
            language: Some("fr"),
            line_ending: LineEnding::Unix,
            wrap_width: WrapWidth::NoWrap,
            expected_items: vec![
                ExpectedItem {
                    context: None,
                    string: "Hello",
                    translations: &["Bonjour"],
                    fuzzy: false,
                },
                ExpectedItem {
                    context: None,
                    string: "Bye",
                    translations: &[""],
                    fuzzy: false,
                },
            ],
            deleted_count: 0,
        },
        ParseCase {
            name: "two_entries_crlf",
            input_relative_path: "two_entries_crlf.po",
            language: Some("fr"),
            line_ending: LineEnding::Dos,
            wrap_width: WrapWidth::NoWrap,
            expected_items: vec![
                ExpectedItem {
                    context: None,
                    string: "Hello",
                    translations: &["Bonjour"],
                    fuzzy: false,
                },
                ExpectedItem {
                    context: None,
                    string: "Bye",
                    translations: &[""],
                    fuzzy: false,
                },
            ],
            deleted_count: 0,
        },
        ParseCase {
            name: "plurals_cs",
            input_relative_path: "plurals_cs.po",
            language: Some("cs"),
            line_ending: LineEnding::Unix,
            wrap_width: WrapWidth::NoWrap,
            expected_items: vec![
                ExpectedItem {
                    context: None,
                    string: "%d file selected",
                    translations: &["%d soubor vybrán", "%d soubory vybrány", ""],
                    fuzzy: false,
                },
                ExpectedItem {
                    context: Some("menu"),
                    string: "Open",
                    translations: &["Otevřít"],
                    fuzzy: true,
                },
            ],
            deleted_count: 0,
        },
        ParseCase {
            name: "obsolete",
            input_relative_path: "obsolete.po",
            language: Some("de"),
            line_ending: LineEnding::Unix,
            wrap_width: WrapWidth::NoWrap,
            expected_items: vec![ExpectedItem {
                context: None,
                string: "Kept",
                translations: &["Behalten"],
                fuzzy: false,
            }],
            deleted_count: 3,
        },
        ParseCase {
            name: "wrapped",
            input_relative_path: "wrapped.po",
            language: Some("es"),
            line_ending: LineEnding::Unix,
            wrap_width: WrapWidth::Width(74),
            expected_items: vec![ExpectedItem {
                context: None,
                string: "This is a rather long source string that gettext wrapped at the default width of the tools.",
                translations: &["Esta es una cadena de origen bastante larga que gettext ajusto al ancho predeterminado de las herramientas."],
                fuzzy: false,
            }],
            deleted_count: 0,
        },
        ParseCase {
            name: "latin1",
            input_relative_path: "latin1.po",
            language: Some("fr"),
            line_ending: LineEnding::Unix,
            wrap_width: WrapWidth::NoWrap,
            expected_items: vec![ExpectedItem {
                context: None,
                string: "Coffee",
                translations: &["Café"],
                fuzzy: false,
            }],
            deleted_count: 0,
        },
        ParseCase {
            name: "duplicate_header",
            input_relative_path: "duplicate_header.po",
            language: Some("pl"),
            line_ending: LineEnding::Unix,
            wrap_width: WrapWidth::NoWrap,
            expected_items: vec![ExpectedItem {
                context: None,
                string: "Yes",
                translations: &["Tak"],
                fuzzy: false,
            }],
            deleted_count: 0,
        },
    ];

    for case in cases {
        let catalog = load(case.input_relative_path);
        assert_eq!(
            catalog.language().map(|l| l.code()),
            case.language,
            "case '{}' language mismatch",
            case.name
        );
        assert_eq!(catalog.line_ending(), case.line_ending, "case '{}' line ending mismatch", case.name);
        assert_eq!(catalog.wrap_width(), case.wrap_width, "case '{}' wrap width mismatch", case.name);
        assert!(catalog.charset_issues().is_empty(), "case '{}' charset issues", case.name);
        assert_items(&catalog, &case.expected_items, case.name);
        assert_eq!(
            catalog.deleted_items().len(),
            case.deleted_count,
            "case '{}' obsolete count mismatch",
            case.name
        );
    }
}

#[test]
fn two_entry_example_statistics() {
    let catalog = load("two_entries.po");
    let stats = catalog.statistics();
    assert_eq!(stats.all, 2);
    assert_eq!(stats.translated, 1);
    assert_eq!(stats.untranslated, 1);
    assert!(catalog.items()[0].is_translated());
    assert!(!catalog.items()[1].is_translated());
}

#[test]
fn plural_metadata_survives_load() {
    let catalog = load("plurals_cs.po");
    let header = catalog.header();
    assert_eq!(header.project, "demo 2.1");
    assert_eq!(header.translator, "Jana Novakova");
    assert_eq!(header.translator_email, "jana@example.org");
    assert_eq!(
        header.get_header("Plural-Forms"),
        "nplurals=3; plural=(n==1) ? 0 : (n>=2 && n<=4) ? 1 : 2;"
    );
    assert_eq!(catalog.plural_forms_count(), 3);
    assert!(!catalog.has_wrong_plural_forms_count());

    for item in catalog.items().iter().filter(|i| i.has_plural()) {
        assert_eq!(item.translations.len(), catalog.plural_forms_count());
    }

    let plural = &catalog.items()[0];
    assert_eq!(plural.extracted_comments, vec!["TRANSLATORS: shown in the status bar"]);
    assert_eq!(plural.references, vec!["src/status.c:40 src/status.c:57"]);
    assert_eq!(plural.parsed_references(), vec!["src/status.c:40", "src/status.c:57"]);
    assert_eq!(plural.format_flag(), Some("c"));

    let open = &catalog.items()[1];
    assert_eq!(open.comment, "# Needs review\n");
    assert_eq!(open.msgid_old, vec!["msgid \"Open file\""]);
}

#[test]
fn adjacent_obsolete_entries_are_split() {
    let catalog = load("obsolete.po");
    let deleted = catalog.deleted_items();
    assert_eq!(deleted[0].lines, vec!["#~ msgid \"First gone\"", "#~ msgstr \"Erstes weg\""]);
    assert_eq!(deleted[1].lines, vec!["#~ msgid \"Second gone\"", "#~ msgstr \"Zweites weg\""]);
    assert_eq!(deleted[2].flags, ", fuzzy");
    assert_eq!(deleted[2].lines.len(), 3);
}

#[test]
fn structurally_broken_files_are_rejected() {
    let cases = [("broken_plural.po", 6), ("broken_singular.po", 7)];
    for (name, line) in cases {
        let result = Catalog::load(corpus_root().join(name), LoadFlags::default());
        match result {
            Err(Error::Parse { line: actual, .. }) => assert_eq!(actual, line, "case '{}'", name),
            other => panic!("case '{}' expected a parse error, got {:?}", name, other.map(|_| ())),
        }
    }
}

#[test]
fn misdeclared_charset_is_reported_not_fatal() {
    let catalog = load("misdeclared_utf8.po");
    assert_eq!(catalog.charset_issues(), &[CharsetIssue::CorruptedLine { line: 7 }]);
}

#[test]
fn template_placeholders_are_kept_in_pot() {
    let catalog = load("messages.pot");
    assert_eq!(catalog.file_type(), FileType::Pot);
    assert_eq!(catalog.header().project, "");
    assert_eq!(catalog.header().get_header("Last-Translator"), "FULL NAME <EMAIL@ADDRESS>");
    assert_eq!(catalog.items().len(), 2);
}

#[test]
fn saved_corpora_reload_identically() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = CatalogConfig::default()
        .with_gettext_path(Some(PathBuf::from("/nonexistent/gettext")))
        .with_compile_mo(false);

    for name in ["two_entries.po", "plurals_cs.po", "obsolete.po", "latin1.po", "two_entries_crlf.po"] {
        let mut original = load(name);
        let output = tmp.path().join(name);
        original
            .save(&output, false, &config)
            .unwrap_or_else(|e| panic!("case '{}' failed to save: {}", name, e));

        let reloaded = Catalog::load(&output, LoadFlags::default()).expect("reload");
        assert_eq!(reloaded.line_ending(), original.line_ending(), "case '{}'", name);
        assert_eq!(reloaded.header().charset, original.header().charset, "case '{}'", name);
        assert_eq!(reloaded.items().len(), original.items().len(), "case '{}'", name);
        for (a, b) in original.items().iter().zip(reloaded.items()) {
            assert_eq!(a.string, b.string, "case '{}'", name);
            assert_eq!(a.context, b.context, "case '{}'", name);
            assert_eq!(a.translations, b.translations, "case '{}'", name);
            assert_eq!(a.flags(), b.flags(), "case '{}'", name);
            assert_eq!(a.comment, b.comment, "case '{}'", name);
            assert_eq!(a.references, b.references, "case '{}'", name);
        }
        assert_eq!(reloaded.deleted_items().len(), original.deleted_items().len(), "case '{}'", name);
    }

    let latin1 = fs::read(tmp.path().join("latin1.po")).expect("read latin1 output");
    assert!(latin1.windows(4).any(|w| w == b"Caf\xE9"));
}
