//! Language codes and gettext plural forms.

use std::{collections::BTreeMap, fmt};

use lazy_static::lazy_static;
use unic_langid::LanguageIdentifier;

const ONE_OTHER: &str = "nplurals=2; plural=(n != 1);";
const ONE_OTHER_ZERO_IS_ONE: &str = "nplurals=2; plural=(n > 1);";
const OTHER_ONLY: &str = "nplurals=1; plural=0;";
const EAST_SLAVIC: &str = "nplurals=3; plural=(n%10==1 && n%100!=11 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2);";

lazy_static! {
    /// Default `Plural-Forms` expressions keyed by language (or `lang_REGION`).
    static ref PLURAL_FORMS_TABLE: BTreeMap<&'static str, &'static str> = {
        let mut m = BTreeMap::new();

        for code in [
            "en", "de", "nl", "sv", "da", "nb", "nn", "no", "is", "fi", "et", "hi", "bn",
            "gu", "ta", "te", "kn", "ml", "mr", "it", "es", "pt", "el", "eu", "gl", "af",
            "sw", "ur", "tr", "he", "iw", "bg", "ca", "hu", "sq", "az", "ka", "kk", "mn",
            "ne", "pa", "si", "ps", "fy", "eo",
        ] {
            m.insert(code, ONE_OTHER);
        }

        for code in ["fr", "pt_BR", "hy", "kab", "fil", "tl", "oc", "ln", "mg", "ti", "wa"] {
            m.insert(code, ONE_OTHER_ZERO_IS_ONE);
        }

        for code in ["ja", "zh", "ko", "th", "vi", "km", "lo", "my", "yue", "id", "ms", "fa", "jv"] {
            m.insert(code, OTHER_ONLY);
        }

        for code in ["ru", "uk", "be", "sr", "hr", "bs", "sh"] {
            m.insert(code, EAST_SLAVIC);
        }

        m.insert("pl", "nplurals=3; plural=(n==1 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2);");
        m.insert("cs", "nplurals=3; plural=(n==1) ? 0 : (n>=2 && n<=4) ? 1 : 2;");
        m.insert("sk", "nplurals=3; plural=(n==1) ? 0 : (n>=2 && n<=4) ? 1 : 2;");
        m.insert("sl", "nplurals=4; plural=(n%100==1 ? 0 : n%100==2 ? 1 : n%100==3 || n%100==4 ? 2 : 3);");
        m.insert("lt", "nplurals=3; plural=(n%10==1 && n%100!=11 ? 0 : n%10>=2 && (n%100<10 || n%100>=20) ? 1 : 2);");
        m.insert("lv", "nplurals=3; plural=(n%10==1 && n%100!=11 ? 0 : n != 0 ? 1 : 2);");
        m.insert("ga", "nplurals=5; plural=(n==1 ? 0 : n==2 ? 1 : n>2 && n<7 ? 2 : n>6 && n<11 ? 3 : 4);");
        m.insert("ro", "nplurals=3; plural=(n==1 ? 0 : (n==0 || (n%100 > 0 && n%100 < 20)) ? 1 : 2);");
        m.insert("ar", "nplurals=6; plural=(n==0 ? 0 : n==1 ? 1 : n==2 ? 2 : n%100>=3 && n%100<=10 ? 3 : n%100>=11 ? 4 : 5);");
        m.insert("cy", "nplurals=4; plural=(n==1) ? 0 : (n==2) ? 1 : (n != 8 && n != 11) ? 2 : 3;");
        m.insert("mk", "nplurals=2; plural=(n % 10 == 1 && n % 100 != 11) ? 0 : 1;");

        m
    };
}

/// A language as used in the `Language` header, e.g. `pt_BR` or `sr@latin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Language {
    code: String,
    identifier: LanguageIdentifier,
}

impl Language {
    /// Parses a POSIX-style (`pt_BR`) or BCP 47 (`pt-BR`) language code.
    ///
    /// Returns `None` for empty, undetermined or malformed codes.
    pub fn try_parse(code: &str) -> Option<Language> {
        let code = code.trim();
        let (base, variant) = match code.split_once('@') {
            Some((base, variant)) => (base, Some(variant)),
            None => (code, None),
        };
        if base.is_empty() {
            return None;
        }

        let identifier: LanguageIdentifier = base.replace('_', "-").parse().ok()?;
        if identifier.language.is_empty() {
            return None;
        }

        let mut normalized = identifier.language.as_str().to_string();
        if let Some(script) = identifier.script {
            normalized.push('_');
            normalized.push_str(script.as_str());
        }
        if let Some(region) = identifier.region {
            normalized.push('_');
            normalized.push_str(region.as_str());
        }
        if let Some(variant) = variant.filter(|v| !v.is_empty()) {
            normalized.push('@');
            normalized.push_str(variant);
        }

        Some(Language {
            code: normalized,
            identifier,
        })
    }

    pub fn english() -> Language {
        Language {
            code: "en".to_string(),
            identifier: "en".parse().unwrap_or_default(),
        }
    }

    /// Full code in POSIX form, e.g. `pt_BR`.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Base language subtag, e.g. `pt`.
    pub fn lang(&self) -> &str {
        self.identifier.language.as_str()
    }

    pub fn identifier(&self) -> &LanguageIdentifier {
        &self.identifier
    }

    /// The customary `Plural-Forms` expression for this language, if known.
    pub fn default_plural_forms_expr(&self) -> Option<&'static str> {
        let without_variant = self.code.split('@').next().unwrap_or(&self.code);
        PLURAL_FORMS_TABLE
            .get(without_variant)
            .or_else(|| PLURAL_FORMS_TABLE.get(self.lang()))
            .copied()
    }

    /// Number of plural forms of the default expression (2 when unknown).
    pub fn nplurals(&self) -> usize {
        self.default_plural_forms_expr()
            .and_then(nplurals_from_expr)
            .unwrap_or(2)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Extracts `N` from a `nplurals=N; plural=...;` expression.
///
/// The template placeholder `nplurals=INTEGER` counts as 2, like English.
pub fn nplurals_from_expr(expr: &str) -> Option<usize> {
    let first = expr.split(';').next()?;
    let (key, value) = first.split_once('=')?;
    if key.trim() != "nplurals" {
        return None;
    }
    let value = value.trim();
    if value == "INTEGER" {
        return Some(2);
    }
    value.parse().ok()
}
