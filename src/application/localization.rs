//! Configured languages and the display timezone.
//!
//! The active language is always passed explicitly; this type only answers
//! questions about the configuration.

use chrono_tz::Tz;
use serde::Serialize;

use crate::domain::error::DomainError;

#[derive(Debug, Clone)]
pub struct Localization {
    languages: Vec<String>,
    default_language: String,
    display_timezone: Tz,
}

/// Language a request is served in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveLanguage(pub String);

impl ActiveLanguage {
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl Localization {
    /// `languages` must be non-empty and contain `default_language`.
    pub fn new(
        languages: Vec<String>,
        default_language: impl Into<String>,
        display_timezone: Tz,
    ) -> Result<Self, DomainError> {
        let default_language = default_language.into();
        if languages.is_empty() {
            return Err(DomainError::validation("at least one language is required"));
        }
        if !languages.contains(&default_language) {
            return Err(DomainError::validation(format!(
                "default language `{default_language}` is not among the configured languages"
            )));
        }
        Ok(Self {
            languages,
            default_language,
            display_timezone,
        })
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn display_timezone(&self) -> Tz {
        self.display_timezone
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.languages.iter().any(|language| language == code)
    }

    /// Languages served under a `/{code}` prefix.
    pub fn prefixed_languages(&self) -> impl Iterator<Item = &str> {
        self.languages
            .iter()
            .map(String::as_str)
            .filter(|code| *code != self.default_language)
    }

    /// `""` for the default language, `/{code}` otherwise.
    pub fn path_prefix(&self, code: &str) -> String {
        if code == self.default_language {
            String::new()
        } else {
            format!("/{code}")
        }
    }

    /// Prefix an absolute site path for `code`.
    pub fn localized_path(&self, code: &str, path: &str) -> String {
        format!("{}{}", self.path_prefix(code), path)
    }

    pub fn active(&self, code: &str) -> ActiveLanguage {
        if self.is_supported(code) {
            ActiveLanguage(code.to_string())
        } else {
            ActiveLanguage(self.default_language.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn localization() -> Localization {
        Localization::new(
            vec!["es".to_string(), "en".to_string()],
            "es",
            chrono_tz::America::Santiago,
        )
        .expect("valid localization")
    }

    #[test]
    fn default_language_is_unprefixed() {
        let l10n = localization();
        assert_eq!(l10n.localized_path("es", "/news/"), "/news/");
        assert_eq!(l10n.localized_path("en", "/news/"), "/en/news/");
        assert_eq!(l10n.prefixed_languages().collect::<Vec<_>>(), vec!["en"]);
    }

    #[test]
    fn unsupported_language_maps_to_default() {
        let l10n = localization();
        assert_eq!(l10n.active("fr"), ActiveLanguage("es".to_string()));
        assert_eq!(l10n.active("en").code(), "en");
    }

    #[test]
    fn rejects_default_outside_languages() {
        let err = Localization::new(vec!["en".to_string()], "es", chrono_tz::UTC)
            .expect_err("default must be configured");
        assert!(err.to_string().contains("default language"));
    }
}
