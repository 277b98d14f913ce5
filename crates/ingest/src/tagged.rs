use serde::{Deserialize, Serialize};

/// Tag assigned to tokens that carry no `/TAG` suffix
pub const OUTSIDE_TAG: &str = "O";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedToken {
    pub word: String,
    pub tag: String,
}

impl TaggedToken {
    pub fn new(word: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            tag: tag.into(),
        }
    }

    /// Parse a raw `word/TAG` token. The split happens on the last slash so
    /// words such as `and/or` keep their inner slash.
    pub fn parse(raw: &str) -> Self {
        match raw.rsplit_once('/') {
            Some((word, tag)) if !word.is_empty() && !tag.is_empty() => Self::new(word, tag),
            _ => Self::new(raw, OUTSIDE_TAG),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag == tag
    }
}

/// One NER-tagged file, tokenized
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggedDocument {
    pub source: String,
    pub tokens: Vec<TaggedToken>,
}

impl TaggedDocument {
    pub fn from_text(source: &str, text: &str) -> Self {
        Self {
            source: source.to_string(),
            tokens: tokenize_tagged(text),
        }
    }
}

/// Tokenize NER-tagged text. Newlines are replaced with spaces first so a
/// token never spans a removed line break.
pub fn tokenize_tagged(text: &str) -> Vec<TaggedToken> {
    text.replace(['\r', '\n'], " ")
        .split_whitespace()
        .map(TaggedToken::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token() {
        assert_eq!(TaggedToken::parse("Ned/PERSON"), TaggedToken::new("Ned", "PERSON"));
        assert_eq!(TaggedToken::parse("and/or/O"), TaggedToken::new("and/or", "O"));
        assert_eq!(TaggedToken::parse("plain"), TaggedToken::new("plain", OUTSIDE_TAG));
        assert_eq!(TaggedToken::parse("/PERSON"), TaggedToken::new("/PERSON", OUTSIDE_TAG));
    }

    #[test]
    fn test_newlines_do_not_join_tokens() {
        let tokens = tokenize_tagged("Ned/PERSON\nStark/PERSON is/O");

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1], TaggedToken::new("Stark", "PERSON"));
    }
}
