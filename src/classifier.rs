use crate::models::{Suggestion, SuggestionStatus};

/// Markers left behind by bulk imports and seed scripts.
pub const DEFAULT_IMPORT_KEYWORDS: &[&str] = &[
    "blackjaxconnect.com",
    "import",
    "imported",
    "batch",
    "scrape",
    "scraped",
    "source:",
    "seed",
    "migration",
];

/// Tells seeded/migrated suggestions apart from organic ones. Display only, never stored.
#[derive(Debug, Clone)]
pub struct StatusClassifier {
    keywords: Vec<String>,
}

impl Default for StatusClassifier {
    fn default() -> Self {
        Self::with_keywords(DEFAULT_IMPORT_KEYWORDS.iter().copied())
    }
}

impl StatusClassifier {
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|keyword| keyword.as_ref().trim().to_lowercase())
                .filter(|keyword| !keyword.is_empty())
                .collect(),
        }
    }

    pub fn classify(&self, suggestion: &Suggestion) -> SuggestionStatus {
        let haystack = format!(
            "{} {}",
            suggestion.notes.as_deref().unwrap_or_default(),
            suggestion.website.as_deref().unwrap_or_default()
        )
        .to_lowercase();

        if self
            .keywords
            .iter()
            .any(|keyword| haystack.contains(keyword.as_str()))
        {
            SuggestionStatus::Imported
        } else {
            SuggestionStatus::Community
        }
    }
}
