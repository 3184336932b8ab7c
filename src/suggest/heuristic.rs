use regex::Regex;
use std::sync::LazyLock;

use super::{dedupe_capped, MAX_QUICK_REPLIES};
use crate::language::Language;

/// Explicit yes/no words, matched on lowercased text
static YES_NO_CUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(yes|no|ja|nein)\b").expect("valid regex"));

/// Comparator or qualifier followed by an amount, optionally with a currency
static THRESHOLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([<>]=?|über|unter|mehr als|weniger als)\s*([\d'.,]+\s*(?:chf|eur|€|fr|franken)?)")
        .expect("valid regex")
});

/// "A or B" with each side at most 35 characters
static EITHER_OR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([^?.!\n]{1,35})\s+(?:oder|or)\s+([^?.!\n]{1,35})\b").expect("valid regex")
});

const ANSWER_CUE: &str = "bitte antworten sie";

/// At most this many threshold expressions are offered
const MAX_THRESHOLDS: usize = 2;

/// Suggest short replies to an assistant message from its wording alone
///
/// Rules, in order:
/// 1. yes/no cue, question mark or "bitte antworten sie" -> yes/no
/// 2. threshold expressions such as "mehr als 3000 CHF" (up to two, verbatim)
/// 3. nothing yet and an "A oder B" construction -> A, B
/// 4. nothing yet and a question mark -> yes/no
pub fn detect_quick_replies(text: &str, language: &Language) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let normalized = text.to_lowercase();
    let is_question = normalized.contains('?');
    let mut options: Vec<String> = Vec::new();

    if YES_NO_CUE.is_match(&normalized) || is_question || normalized.contains(ANSWER_CUE) {
        options.push(language.yes.to_string());
        options.push(language.no.to_string());
    }

    options.extend(
        THRESHOLD
            .find_iter(text)
            .map(|m| m.as_str().trim().to_string())
            .take(MAX_THRESHOLDS),
    );

    if options.is_empty() {
        if let Some(caps) = EITHER_OR.captures(text) {
            options.push(caps[1].trim().to_string());
            options.push(caps[2].trim().to_string());
        }
    }

    if options.is_empty() && is_question {
        options.push(language.yes.to_string());
        options.push(language.no.to_string());
    }

    dedupe_capped(options, MAX_QUICK_REPLIES)
}
