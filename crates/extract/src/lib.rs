pub mod entities;
pub mod grouper;
pub mod schema;

pub use entities::{EntityExtractor, ExtractorConfig};
pub use grouper::{FamilyGrouper, GrouperConfig, collapse_nicknames};
pub use schema::{ExtractionResult, Families, Family};

use ingest::TaggedDocument;

pub struct Extractor {
    entities: EntityExtractor,
    grouper: FamilyGrouper,
}

impl Extractor {
    pub fn new(extractor_config: ExtractorConfig, grouper_config: GrouperConfig) -> Self {
        Self {
            entities: EntityExtractor::new(extractor_config),
            grouper: FamilyGrouper::new(grouper_config),
        }
    }

    /// Extract people from tagged documents and cluster them into families
    pub fn extract(&self, documents: &[TaggedDocument]) -> ExtractionResult {
        let people = self
            .entities
            .extract_from_documents(documents.iter().map(|d| d.tokens.as_slice()));

        tracing::info!(people = people.len(), "Extracted multi-word person names");

        let families = self.grouper.group(&people);

        ExtractionResult { people, families }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default(), GrouperConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_families_from_documents() {
        let documents = vec![
            TaggedDocument::from_text(
                "chapter_0",
                "Ned/PERSON Stark/PERSON watched/O Robb/PERSON Stark/PERSON\nand/O Jon/PERSON Snow/PERSON",
            ),
            TaggedDocument::from_text("chapter_1", "Sansa/PERSON Stark/PERSON smiled/O ./O"),
        ];

        let result = Extractor::default().extract(&documents);

        assert_eq!(result.people.len(), 4);
        assert_eq!(result.families.len(), 1);
        assert_eq!(result.families["Stark"].len(), 3);
    }
}
