//! Quick-reply suggestions
//!
//! Two tiers: the backend is asked first; when it has nothing (or fails) a
//! synchronous heuristic looks at the assistant's wording. Results carry the
//! [`StalenessToken`] they were computed for so the session can drop results
//! that arrive after the conversation has moved on.

mod heuristic;

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::gateway::Gateway;
use crate::language::Language;

pub use heuristic::detect_quick_replies;

/// Upper bound on visible suggestions
pub const MAX_QUICK_REPLIES: usize = 4;

/// Identifies the conversation turn a computation belongs to
///
/// `generation` increases with every recompute request; `assistant_text` is
/// the latest assistant message at request time. A result is current only if
/// its token equals the session's token when it resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StalenessToken {
    pub generation: u64,
    pub assistant_text: String,
}

/// Which tier produced a suggestion set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSource {
    Heuristic,
    Network,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickReplySet {
    /// Unique, in display order, at most [`MAX_QUICK_REPLIES`]
    pub suggestions: Vec<String>,
    pub source: SuggestionSource,
    pub token: StalenessToken,
}

/// Keep the first occurrence of each entry, then cap
pub(crate) fn dedupe_capped(items: impl IntoIterator<Item = String>, cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .take(cap)
        .collect()
}

pub struct QuickReplySuggester {
    gateway: Arc<dyn Gateway>,
    network_enabled: bool,
}

impl QuickReplySuggester {
    pub fn new(gateway: Arc<dyn Gateway>, network_enabled: bool) -> Self {
        Self {
            gateway,
            network_enabled,
        }
    }

    /// Compute suggestions for the text captured in `token`
    ///
    /// Returns `None` when neither tier has anything to offer.
    pub async fn compute(
        &self,
        token: &StalenessToken,
        language: &Language,
    ) -> Option<QuickReplySet> {
        let text = token.assistant_text.as_str();

        let network = self.network_tier(text).await;
        if !network.is_empty() {
            return Some(QuickReplySet {
                suggestions: network,
                source: SuggestionSource::Network,
                token: token.clone(),
            });
        }

        let heuristic = detect_quick_replies(text, language);
        if heuristic.is_empty() {
            return None;
        }

        Some(QuickReplySet {
            suggestions: heuristic,
            source: SuggestionSource::Heuristic,
            token: token.clone(),
        })
    }

    /// Backend suggestions; any failure counts as "none"
    pub async fn network_tier(&self, text: &str) -> Vec<String> {
        if !self.network_enabled || text.trim().is_empty() {
            return Vec::new();
        }

        match self.gateway.suggest_quick_replies(text).await {
            Ok(items) => {
                let accepted: Vec<String> = items
                    .into_iter()
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .take(MAX_QUICK_REPLIES)
                    .collect();
                debug!("Backend suggested {} quick replies", accepted.len());
                dedupe_capped(accepted, MAX_QUICK_REPLIES)
            }
            Err(e) => {
                warn!("Quick-reply enrichment failed, using heuristics: {}", e);
                Vec::new()
            }
        }
    }
}
