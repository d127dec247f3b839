//! Translation-aware accessors on [`PostRecord`].
//!
//! Every accessor takes the language explicitly; there is no ambient
//! "current language".

use crate::domain::{
    entities::{PostRecord, PostTranslation},
    text,
    types::PostStatus,
};

impl PostRecord {
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Translation for `language` when it carries a title.
    pub fn translation(&self, language: &str) -> Option<&PostTranslation> {
        self.translations
            .get(language)
            .filter(|translation| !translation.title.trim().is_empty())
    }

    pub fn has_translation(&self, language: &str) -> bool {
        self.translation(language).is_some()
    }

    /// Non-empty slug for `language`.
    pub fn slug_for(&self, language: &str) -> Option<&str> {
        self.translations
            .get(language)
            .map(|translation| translation.slug.as_str())
            .filter(|slug| !slug.is_empty())
    }

    /// Languages with a translation, in the order of `configured`.
    pub fn available_languages<'a>(&self, configured: &'a [String]) -> Vec<&'a str> {
        configured
            .iter()
            .map(String::as_str)
            .filter(|code| self.has_translation(code))
            .collect()
    }

    /// Translation to display for `language`, falling back to the first
    /// configured language that has one.
    pub fn display_translation<'a>(
        &'a self,
        language: &'a str,
        configured: &'a [String],
    ) -> Option<(&'a str, &'a PostTranslation)> {
        if let Some(translation) = self.translation(language) {
            return Some((language, translation));
        }
        configured
            .iter()
            .find_map(|code| self.translation(code).map(|t| (code.as_str(), t)))
    }

    /// Stored meta description, or one derived from the body.
    pub fn meta_description(&self, language: &str) -> String {
        let Some(translation) = self.translation(language) else {
            return String::new();
        };
        if !translation.meta_description.trim().is_empty() {
            return translation.meta_description.clone();
        }
        text::meta_description_from_body(&translation.body)
    }

    pub fn tag_ids(&self) -> Vec<i64> {
        self.tags.iter().map(|tag| tag.id).collect()
    }
}
