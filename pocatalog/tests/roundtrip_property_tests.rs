use pocatalog::escape::{escape_c_string, format_string_for_file, unescape_c_string};
use pocatalog::{Catalog, CatalogItem, FileType, LoadFlags};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn text_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9 %_\\-\\.,!\\?\"\\\\\n\téü日本]{1,40}").expect("valid text regex")
}

fn context_strategy() -> impl Strategy<Value = Option<String>> {
    proptest::option::of(proptest::string::string_regex("[a-z][a-z ]{0,10}").expect("valid context regex"))
}

fn dataset_strategy() -> impl Strategy<Value = BTreeMap<String, (String, Option<String>)>> {
    prop::collection::btree_map(
        text_strategy(),
        (proptest::string::string_regex("[A-Za-z0-9 \n\"éü]{0,30}").expect("valid translation regex"), context_strategy()),
        1..8,
    )
}

fn build_catalog(values: &BTreeMap<String, (String, Option<String>)>) -> Catalog {
    let mut catalog = Catalog::new(FileType::Po);
    for (source, (translation, context)) in values {
        let mut item = CatalogItem::new(source.clone());
        item.context = context.clone();
        item.set_translation(0, translation.clone());
        catalog.add_item(item);
    }
    catalog
}

fn canonical_map(catalog: &Catalog) -> BTreeMap<String, (String, Option<String>)> {
    catalog
        .items()
        .iter()
        .map(|item| {
            (
                item.string.clone(),
                (item.translation().to_string(), item.context.clone()),
            )
        })
        .collect()
}

#[test]
fn newline_escape_roundtrip() {
    assert_eq!(escape_c_string("a\nb"), "a\\nb");
    assert_eq!(unescape_c_string("a\\nb"), "a\nb");
    assert_eq!(format_string_for_file("a\nb"), "a\\n\"\n\"b");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn escape_then_unescape_is_identity(text in "\\PC{0,40}") {
        prop_assert_eq!(unescape_c_string(&escape_c_string(&text)), text);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn serialize_then_parse_preserves_entries(values in dataset_strategy()) {
        let mut catalog = build_catalog(&values);
        let bytes = catalog.save_to_buffer().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let reloaded = Catalog::from_bytes(&bytes, FileType::Po, LoadFlags::default())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(canonical_map(&reloaded), values);
        let ids: Vec<u32> = reloaded.items().iter().map(|i| i.id).collect();
        let expected: Vec<u32> = (1..=reloaded.items().len() as u32).collect();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn saving_twice_is_stable(values in dataset_strategy()) {
        let mut catalog = build_catalog(&values);
        let first = catalog.save_to_buffer().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let mut reloaded = Catalog::from_bytes(&first, FileType::Po, LoadFlags::default())
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let second = reloaded.save_to_buffer().map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(first, second);
    }
}
