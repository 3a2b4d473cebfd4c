use anyhow::{Context, Result};
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FuzzyMatch<'a> {
    pub(crate) name: &'a str,
    /// Similarity on a 0-100 scale.
    pub(crate) score: f64,
}

/// Best-candidate lookup used for known-polymer names.
pub(crate) trait FuzzyMatcher {
    fn best_match<'a>(
        &self,
        query: &str,
        candidates: &'a [String],
        score_cutoff: f64,
    ) -> Option<FuzzyMatch<'a>>;
}

/// Normalized Levenshtein similarity over whitespace-collapsed, lower-cased
/// strings. Equal scores keep the earlier candidate, so a sorted candidate
/// list breaks ties by name.
#[derive(Debug, Clone)]
pub(crate) struct StrsimMatcher {
    whitespace: Regex,
}

impl StrsimMatcher {
    pub(crate) fn new() -> Result<Self> {
        let whitespace = Regex::new(r"\s+").context("failed to compile whitespace regex")?;
        Ok(Self { whitespace })
    }

    pub(crate) fn normalize(&self, value: &str) -> String {
        self.whitespace
            .replace_all(value.trim(), " ")
            .to_lowercase()
    }
}

impl FuzzyMatcher for StrsimMatcher {
    fn best_match<'a>(
        &self,
        query: &str,
        candidates: &'a [String],
        score_cutoff: f64,
    ) -> Option<FuzzyMatch<'a>> {
        let query = self.normalize(query);
        if query.is_empty() {
            return None;
        }

        let mut best: Option<FuzzyMatch<'a>> = None;
        for candidate in candidates {
            let score =
                strsim::normalized_levenshtein(&query, &self.normalize(candidate)) * 100.0;
            if score < score_cutoff {
                continue;
            }
            if best.as_ref().is_none_or(|current| score > current.score) {
                best = Some(FuzzyMatch {
                    name: candidate,
                    score,
                });
            }
        }

        best
    }
}
