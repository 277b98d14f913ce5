pub mod candidates;
pub mod pipeline;
pub mod resolver;
pub mod schema;
pub mod scorer;

pub use candidates::generate_pairs;
pub use pipeline::{FamilyRelationPipeline, FamilyStructure, PipelineConfig, PipelineOutput};
pub use resolver::{ConstraintResolver, Resolution, ResolverConfig, is_equivalence_class};
pub use schema::{
    Evidence, ParseCategoryError, RankedScores, RelationCandidate, RelationCategory, RelationMap,
};
pub use scorer::{CooccurrenceScorer, EvidenceCache, NoCache, ScorerConfig, ScoringCorpus};
