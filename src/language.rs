//! Languages a session can be initialized with
//!
//! The session language is picked before initialization and fixed afterwards.
//! It decides the code sent to the backend and the words used for the
//! heuristic yes/no quick replies.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    /// English key, e.g. "german"
    pub key: &'static str,
    /// ISO 639-1 code sent to the backend
    pub code: &'static str,
    /// Locale used by the backend for speech synthesis
    pub speech_locale: &'static str,
    /// Native display name
    pub label: &'static str,
    pub yes: &'static str,
    pub no: &'static str,
}

pub const DEFAULT_LANGUAGE: &str = "de";

const CATALOG: &[Language] = &[
    Language {
        key: "german",
        code: "de",
        speech_locale: "de-DE",
        label: "Deutsch",
        yes: "Ja",
        no: "Nein",
    },
    Language {
        key: "english",
        code: "en",
        speech_locale: "en-US",
        label: "English",
        yes: "Yes",
        no: "No",
    },
    Language {
        key: "italian",
        code: "it",
        speech_locale: "it-IT",
        label: "Italiano",
        yes: "Sì",
        no: "No",
    },
    Language {
        key: "french",
        code: "fr",
        speech_locale: "fr-FR",
        label: "Français",
        yes: "Oui",
        no: "Non",
    },
    Language {
        key: "portuguese",
        code: "pt",
        speech_locale: "pt-PT",
        label: "Português",
        yes: "Sim",
        no: "Não",
    },
    Language {
        key: "spanish",
        code: "es",
        speech_locale: "es-ES",
        label: "Español",
        yes: "Sí",
        no: "No",
    },
    Language {
        key: "albanian",
        code: "sq",
        speech_locale: "sq-AL",
        label: "Shqip",
        yes: "Po",
        no: "Jo",
    },
    Language {
        key: "turkish",
        code: "tr",
        speech_locale: "tr-TR",
        label: "Türkçe",
        yes: "Evet",
        no: "Hayır",
    },
    Language {
        key: "macedonian",
        code: "mk",
        speech_locale: "mk-MK",
        label: "Македонски",
        yes: "Да",
        no: "Не",
    },
    Language {
        key: "ukrainian",
        code: "uk",
        speech_locale: "uk-UA",
        label: "Українська",
        yes: "Так",
        no: "Ні",
    },
];

impl Language {
    /// Look up by code ("de") or key ("german"), case-insensitively
    pub fn find(name: &str) -> Option<&'static Language> {
        let name = name.trim();
        CATALOG.iter().find(|lang| {
            lang.code.eq_ignore_ascii_case(name) || lang.key.eq_ignore_ascii_case(name)
        })
    }

    /// Like [`Language::find`], falling back to German
    pub fn resolve(name: &str) -> &'static Language {
        Self::find(name).unwrap_or_else(Self::default_language)
    }

    pub fn default_language() -> &'static Language {
        &CATALOG[0]
    }
}
