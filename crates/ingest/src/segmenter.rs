use serde::{Deserialize, Serialize};

use crate::paragraph::Paragraph;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SegmentMode {
    #[default]
    Paragraphs, // Blank-line separated blocks
    Lines,      // One paragraph per non-empty line
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    #[serde(default)]
    pub mode: SegmentMode,
}

/// Splits an already-segmented chapter file into paragraphs.
pub struct Segmenter {
    config: SegmenterConfig,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self { config }
    }

    pub fn segment(&self, doc_id: &str, content: &str, source: &str) -> Vec<Paragraph> {
        // Chapters persisted upstream as a JSON list of paragraphs
        let blocks = match serde_json::from_str::<Vec<String>>(content) {
            Ok(paragraphs) => paragraphs,
            Err(_) => match self.config.mode {
                SegmentMode::Paragraphs => self.split_by_paragraphs(content),
                SegmentMode::Lines => self.split_by_lines(content),
            },
        };

        blocks
            .into_iter()
            .map(|block| fold_newlines(&block))
            .filter(|block| !block.is_empty())
            .enumerate()
            .map(|(index, text)| {
                Paragraph::new(doc_id.to_string(), index, text, source.to_string())
            })
            .collect()
    }

    fn split_by_paragraphs(&self, text: &str) -> Vec<String> {
        let mut paragraphs = Vec::new();
        let mut current = String::new();

        for line in text.lines() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    paragraphs.push(std::mem::take(&mut current));
                }
                continue;
            }
            current.push_str(line);
            current.push('\n');
        }

        if !current.is_empty() {
            paragraphs.push(current);
        }

        paragraphs
    }

    fn split_by_lines(&self, text: &str) -> Vec<String> {
        text.lines()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn fold_newlines(block: &str) -> String {
    block.split_whitespace().collect::<Vec<_>>().join(" ")
}
