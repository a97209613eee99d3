use pocatalog::{Catalog, CatalogItem};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const MAX_VALUE_WIDTH: usize = 50;

/// Cut `value` to at most `max_width` terminal columns, marking the cut with `...`.
pub fn truncate_to_width(value: &str, max_width: usize) -> String {
    if value.width() <= max_width {
        return value.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for c in value.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > max_width {
            break;
        }
        width += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

fn display_value(value: &str, full: bool) -> String {
    let value = value.replace('\n', "\\n");
    if full {
        value
    } else {
        truncate_to_width(&value, MAX_VALUE_WIDTH)
    }
}

fn status_of(item: &CatalogItem) -> &'static str {
    if item.issue.is_some() {
        "needs attention"
    } else if item.is_fuzzy() {
        "fuzzy"
    } else if item.is_translated() {
        "translated"
    } else {
        "untranslated"
    }
}

/// Print the header summary and every entry of a catalog.
pub fn print_view(catalog: &Catalog, untranslated_only: bool, full: bool) {
    let header = catalog.header();
    println!("=== Catalog ===");
    if let Some(path) = catalog.file_name() {
        println!("File: {}", path.display());
    }
    println!(
        "Language: {}",
        catalog.language().map(|l| l.code()).unwrap_or("(none)")
    );
    if !header.project.is_empty() {
        println!("Project: {}", header.project);
    }
    println!("Charset: {}", header.charset);
    if catalog.has_plural_items() {
        println!("Plural forms: {}", catalog.plural_forms_count());
    }
    println!("Entries: {}", catalog.items().len());
    if !catalog.deleted_items().is_empty() {
        println!("Obsolete entries: {}", catalog.deleted_items().len());
    }

    let items = catalog
        .items()
        .iter()
        .filter(|item| !untranslated_only || !item.is_translated() || item.is_fuzzy());

    for item in items {
        println!("\n  Entry {} (line {}): {}", item.id, item.line_number, display_value(&item.string, full));
        println!("    Status: {}", status_of(item));
        if let Some(context) = &item.context {
            println!("    Context: {}", context);
        }
        for comment in &item.extracted_comments {
            println!("    Note: {}", comment);
        }
        match &item.plural {
            None => println!("    Value: {}", display_value(item.translation(), full)),
            Some(plural) => {
                println!("    Plural ID: {}", display_value(plural, full));
                for (form, value) in item.translations.iter().enumerate() {
                    println!("      [{}]: {}", form, display_value(value, full));
                }
            }
        }
        if let Some(issue) = &item.issue {
            println!("    Issue: {}", issue);
        }
    }
}
