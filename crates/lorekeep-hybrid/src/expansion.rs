//! Best-effort query expansion through a text generator.
//!
//! A failed expansion is not an error: the outcome records why and the
//! original question is searched as-is.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use lorekeep_core::settings::ExpansionSettings;
use lorekeep_core::traits::TextGenerator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// `query` is the question followed by the generated keywords.
    Expanded { query: String, keywords: Vec<String> },
    /// Expansion was attempted and failed; `query` is the original question.
    Fallback { query: String, reason: String },
    /// No generator configured or expansion switched off.
    Disabled { query: String },
}

impl Expansion {
    /// The string to search with.
    pub fn query(&self) -> &str {
        match self {
            Expansion::Expanded { query, .. } | Expansion::Fallback { query, .. } | Expansion::Disabled { query } => query,
        }
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, Expansion::Expanded { .. })
    }
}

pub struct QueryExpander {
    generator: Option<Arc<dyn TextGenerator>>,
    settings: ExpansionSettings,
}

impl QueryExpander {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, settings: ExpansionSettings) -> Self {
        Self { generator, settings }
    }

    pub fn disabled() -> Self {
        Self { generator: None, settings: ExpansionSettings { enabled: false, ..ExpansionSettings::default() } }
    }

    pub async fn expand(&self, question: &str) -> Expansion {
        let generator = match &self.generator {
            Some(g) if self.settings.enabled => g,
            _ => return Expansion::Disabled { query: question.to_string() },
        };
        let prompt = self.settings.prompt.replace("{question}", question);
        let timeout = Duration::from_secs(self.settings.timeout_secs.max(1));

        let reason = match tokio::time::timeout(timeout, generator.generate(&prompt)).await {
            Ok(Ok(reply)) => {
                let keywords = parse_keywords(&reply);
                if !keywords.is_empty() {
                    let query = format!("{} {}", question, keywords.join(" "));
                    debug!("Expanded query: {}", query);
                    return Expansion::Expanded { query, keywords };
                }
                "generator returned no keywords".to_string()
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {}s", timeout.as_secs()),
        };
        warn!("Query expansion failed, using original question: {}", reason);
        Expansion::Fallback { query: question.to_string(), reason }
    }
}

/// One keyword per non-blank line, list markers (`-`, `*`, `•`, `1.`, `2)`) removed.
pub fn parse_keywords(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(strip_list_marker)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    let line = line.trim_start_matches(['-', '*', '•']).trim_start();
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return stripped.trim();
        }
    }
    line.trim()
}
