use ingest::TaggedToken;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Entity tag marking person mentions
    pub person_tag: String,
    /// Honorifics that never start or continue a name
    pub titles: HashSet<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        let titles = [
            "king", "queen", "prince", "princess", "ser", "khal", "khaleesi", "maester", "lord",
            "lady",
        ];

        Self {
            person_tag: "PERSON".to_string(),
            titles: titles.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Merges runs of person-tagged tokens into full names.
pub struct EntityExtractor {
    config: ExtractorConfig,
}

impl EntityExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Collect multi-word person names from a token stream
    pub fn extract_names(&self, tokens: &[TaggedToken]) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_names(tokens, &mut names);
        names
    }

    /// Same as `extract_names` but over several documents
    pub fn extract_from_documents<'a, I>(&self, token_streams: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a [TaggedToken]>,
    {
        let mut names = BTreeSet::new();
        for tokens in token_streams {
            self.collect_names(tokens, &mut names);
        }
        names
    }

    fn collect_names(&self, tokens: &[TaggedToken], names: &mut BTreeSet<String>) {
        let mut buffer: Vec<&str> = Vec::new();

        for token in tokens {
            if self.continues_name(token) {
                buffer.push(&token.word);
            } else {
                flush(&mut buffer, names);
            }
        }

        // A name may run up to the end of the stream
        flush(&mut buffer, names);
    }

    fn continues_name(&self, token: &TaggedToken) -> bool {
        token.has_tag(&self.config.person_tag)
            && token.word.chars().next().is_some_and(char::is_uppercase)
            && !self.config.titles.contains(&token.word.to_lowercase())
    }
}

fn flush(buffer: &mut Vec<&str>, names: &mut BTreeSet<String>) {
    // Single-word mentions are too ambiguous to keep
    if buffer.len() > 1 {
        names.insert(buffer.join(" "));
    }
    buffer.clear();
}
