use anyhow::{Context, Result};
use extract::Family;
use ingest::Paragraph;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::candidates::generate_pairs;
use crate::schema::{Evidence, RelationCandidate};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    pub parent_child_terms: Vec<String>,
    pub sibling_terms: Vec<String>,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            parent_child_terms: ["father", "mother", "son", "daughter"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
            sibling_terms: ["brother", "sister", "sibling"]
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

/// Lowercased paragraph texts, prepared once per run.
pub struct ScoringCorpus {
    paragraphs: Vec<String>,
}

impl ScoringCorpus {
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            paragraphs: texts.into_iter().map(|t| t.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn from_paragraphs(paragraphs: &[Paragraph]) -> Self {
        Self::from_texts(paragraphs.iter().map(|p| p.text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}

/// Memoizes pair evidence across runs over the same corpus.
pub trait EvidenceCache {
    fn lookup(&self, first: &str, second: &str) -> Option<Evidence>;
    fn store(&self, first: &str, second: &str, evidence: &Evidence);
}

pub struct NoCache;

impl EvidenceCache for NoCache {
    fn lookup(&self, _first: &str, _second: &str) -> Option<Evidence> {
        None
    }

    fn store(&self, _first: &str, _second: &str, _evidence: &Evidence) {}
}

/// Counts relationship terms in paragraphs where both names co-occur.
pub struct CooccurrenceScorer {
    config: ScorerConfig,
    term_pattern: Regex,
}

impl CooccurrenceScorer {
    pub fn new(config: ScorerConfig) -> Result<Self> {
        let alternatives: Vec<String> = config
            .parent_child_terms
            .iter()
            .chain(&config.sibling_terms)
            .map(|t| regex::escape(&t.to_lowercase()))
            .collect();

        if alternatives.is_empty() {
            anyhow::bail!("Scorer needs at least one relationship term");
        }

        // Bare term, plural, possessive, or followed by a closing quote
        let pattern = format!(r"(?i)^({})(?:s|'s|s'|’s|'|’)?$", alternatives.join("|"));
        let term_pattern = Regex::new(&pattern).context("Failed to compile term pattern")?;

        Ok(Self {
            config,
            term_pattern,
        })
    }

    pub fn score_pair(&self, first: &str, second: &str, corpus: &ScoringCorpus) -> Evidence {
        let first = first.to_lowercase();
        let second = second.to_lowercase();
        let mut terms: BTreeMap<String, usize> = BTreeMap::new();

        for paragraph in &corpus.paragraphs {
            if !(paragraph.contains(&first) && paragraph.contains(&second)) {
                continue;
            }
            for token in paragraph.split_whitespace() {
                if let Some(term) = self.match_term(token) {
                    *terms.entry(term).or_insert(0) += 1;
                }
            }
        }

        self.aggregate(terms)
    }

    /// Score every member pair of a family
    pub fn score_family(
        &self,
        family: &Family,
        corpus: &ScoringCorpus,
        cache: &dyn EvidenceCache,
    ) -> Vec<RelationCandidate> {
        generate_pairs(family)
            .into_iter()
            .map(|(first, second)| {
                let evidence = match cache.lookup(&first, &second) {
                    Some(evidence) => evidence,
                    None => {
                        let evidence = self.score_pair(&first, &second, corpus);
                        cache.store(&first, &second, &evidence);
                        evidence
                    }
                };
                RelationCandidate::new(first, second, evidence)
            })
            .collect()
    }

    /// The vocabulary term a whitespace token stands for, lowercased
    fn match_term(&self, token: &str) -> Option<String> {
        let trimmed = token
            .trim_start_matches(|c: char| !c.is_alphanumeric())
            .trim_end_matches(|c: char| !c.is_alphanumeric() && c != '\'' && c != '’');

        self.term_pattern
            .captures(trimmed)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_lowercase())
    }

    fn aggregate(&self, terms: BTreeMap<String, usize>) -> Evidence {
        let sum_of = |list: &[String]| -> usize {
            list.iter()
                .map(|t| terms.get(&t.to_lowercase()).copied().unwrap_or(0))
                .sum()
        };

        let parent_child = sum_of(&self.config.parent_child_terms);
        let sibling = sum_of(&self.config.sibling_terms);

        Evidence {
            parent_child,
            sibling,
            terms,
        }
    }
}
