//! Bilingual display text.
//!
//! Hadiya serves English and Arabic audiences; every customer-visible
//! product string carries both renderings.

use serde::{Deserialize, Serialize};

/// A display string in both storefront languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    /// English rendering.
    pub en: String,
    /// Arabic rendering.
    pub ar: String,
}

impl LocalizedText {
    /// Create a localized pair.
    #[must_use]
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }

    /// The rendering for a language tag, falling back to English for any
    /// tag other than `ar`.
    #[must_use]
    pub fn for_language(&self, lang: &str) -> &str {
        if lang.eq_ignore_ascii_case("ar") {
            &self.ar
        } else {
            &self.en
        }
    }
}
