use anyhow::Result;
use extract::{Extractor, ExtractorConfig, Families, GrouperConfig};
use ingest::{Paragraph, SegmenterConfig, TaggedDocument};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::resolver::{ConstraintResolver, ResolverConfig};
use crate::schema::RelationMap;
use crate::scorer::{CooccurrenceScorer, EvidenceCache, NoCache, ScorerConfig, ScoringCorpus};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub grouper: GrouperConfig,
    #[serde(default)]
    pub segmenter: SegmenterConfig,
    #[serde(default)]
    pub scorer: ScorerConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Derived per-family structure, kept alongside the relation map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FamilyStructure {
    pub sibling_group: BTreeSet<String>,
    pub parents: Vec<(String, usize)>,
    pub demoted: usize,
    pub forced: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub people: BTreeSet<String>,
    pub families: Families,
    pub relations: RelationMap,
    pub structures: BTreeMap<String, FamilyStructure>,
}

impl PipelineOutput {
    pub fn candidate_count(&self) -> usize {
        self.relations.values().map(Vec::len).sum()
    }
}

pub struct FamilyRelationPipeline {
    config: PipelineConfig,
    extractor: Extractor,
    scorer: CooccurrenceScorer,
    resolver: ConstraintResolver,
}

impl FamilyRelationPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let extractor = Extractor::new(config.extractor.clone(), config.grouper.clone());
        let scorer = CooccurrenceScorer::new(config.scorer.clone())?;
        let resolver = ConstraintResolver::new(config.resolver.clone());

        Ok(Self {
            config,
            extractor,
            scorer,
            resolver,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn infer(&self, documents: &[TaggedDocument], paragraphs: &[Paragraph]) -> PipelineOutput {
        self.infer_with_cache(documents, paragraphs, &NoCache)
    }

    /// Full pipeline: extract, group, score, resolve
    pub fn infer_with_cache(
        &self,
        documents: &[TaggedDocument],
        paragraphs: &[Paragraph],
        cache: &dyn EvidenceCache,
    ) -> PipelineOutput {
        let extraction = self.extractor.extract(documents);
        let corpus = ScoringCorpus::from_paragraphs(paragraphs);

        let mut relations = RelationMap::new();
        let mut structures = BTreeMap::new();

        // Families share nothing, so each is scored and resolved on its own
        for (surname, family) in &extraction.families {
            let scored = self.scorer.score_family(family, &corpus, cache);
            let resolution = self.resolver.resolve(&scored);

            tracing::info!(
                family = %surname,
                members = family.len(),
                candidates = resolution.candidates.len(),
                siblings = resolution.sibling_group.len(),
                parents = resolution.parents.len(),
                "Resolved family"
            );

            structures.insert(
                surname.clone(),
                FamilyStructure {
                    sibling_group: resolution.sibling_group,
                    parents: resolution.parents,
                    demoted: resolution.demoted,
                    forced: resolution.forced,
                },
            );
            relations.insert(surname.clone(), resolution.candidates);
        }

        PipelineOutput {
            people: extraction.people,
            families: extraction.families,
            relations,
            structures,
        }
    }

    /// Read the NER-tagged and chapter directories once, then infer
    pub async fn run_from_dirs(&self, ner_dir: &Path, chapters_dir: &Path) -> Result<PipelineOutput> {
        let documents = ingest::ingest_tagged_directory(ner_dir).await?;
        let paragraphs =
            ingest::ingest_chapter_directory(chapters_dir, self.config.segmenter.clone()).await?;

        Ok(self.infer(&documents, &paragraphs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RelationCategory;

    fn documents() -> Vec<TaggedDocument> {
        vec![TaggedDocument::from_text(
            "chapter_0",
            "Ned/PERSON Stark/PERSON and/O Robb/PERSON Stark/PERSON and/O Sansa/PERSON Stark/PERSON \
             met/O Jaime/PERSON Lannister/PERSON",
        )]
    }

    fn paragraphs(texts: &[&str]) -> Vec<Paragraph> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Paragraph::new("doc".into(), i, t.to_string(), "chapter_0".into()))
            .collect()
    }

    #[test]
    fn test_infer_end_to_end() {
        let pipeline = FamilyRelationPipeline::new(PipelineConfig::default()).unwrap();
        let paragraphs = paragraphs(&[
            "Ned is Robb's father.",
            "Robb and Sansa are siblings.",
            "Sansa told Robb her brother would return; her brother Robb smiled at his sister.",
            "Robb, Sansa's brother, rode out.",
        ]);

        let output = pipeline.infer(&documents(), &paragraphs);

        assert_eq!(output.families.len(), 1);
        let stark = &output.relations["Stark"];
        assert_eq!(stark.len(), 3);

        let ned_robb = stark.iter().find(|c| c.same_pair("Ned", "Robb")).unwrap();
        assert_eq!(ned_robb.top_category(), RelationCategory::ParentChild);

        let structure = &output.structures["Stark"];
        let expected: BTreeSet<String> = ["Robb", "Sansa"].iter().map(|s| s.to_string()).collect();
        assert_eq!(structure.sibling_group, expected);
        assert_eq!(structure.parents, vec![("Ned".to_string(), 1)]);

        let ned_sansa = stark.iter().find(|c| c.same_pair("Ned", "Sansa")).unwrap();
        assert_eq!(ned_sansa.top(), (RelationCategory::ParentChild, 1));
    }

    #[tokio::test]
    async fn test_run_from_dirs() {
        let ner = tempfile::tempdir().unwrap();
        std::fs::write(
            ner.path().join("chapter_0.ner"),
            "Ned/PERSON Stark/PERSON saw/O Robb/PERSON Stark/PERSON",
        )
        .unwrap();
        let chapters = tempfile::tempdir().unwrap();
        std::fs::write(chapters.path().join("chapter_0.txt"), "Ned is Robb's father.\n").unwrap();

        let pipeline = FamilyRelationPipeline::new(PipelineConfig::default()).unwrap();
        let output = pipeline.run_from_dirs(ner.path(), chapters.path()).await.unwrap();

        assert_eq!(output.candidate_count(), 1);
        assert_eq!(
            output.relations["Stark"][0].scores,
            vec![(RelationCategory::ParentChild, 1), (RelationCategory::Sibling, 0)]
        );
    }
}
