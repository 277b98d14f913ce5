pub mod paragraph;
pub mod reader;
pub mod segmenter;
pub mod tagged;

pub use paragraph::Paragraph;
pub use reader::FileReader;
pub use segmenter::{SegmentMode, Segmenter, SegmenterConfig};
pub use tagged::{TaggedDocument, TaggedToken, tokenize_tagged};

use anyhow::Result;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Generate a stable document ID from file path
pub fn generate_doc_id(path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..16])
}

/// Read every NER-tagged file below `dir`
pub async fn ingest_tagged_directory(dir: &Path) -> Result<Vec<TaggedDocument>> {
    let files = FileReader::read_directory(dir).await?;

    let documents: Vec<TaggedDocument> = files
        .iter()
        .map(|(path, content)| TaggedDocument::from_text(path, content))
        .collect();

    tracing::info!(
        dir = %dir.display(),
        documents = documents.len(),
        tokens = documents.iter().map(|d| d.tokens.len()).sum::<usize>(),
        "Loaded NER-tagged documents"
    );

    Ok(documents)
}

/// Read every chapter file below `dir` as paragraphs
pub async fn ingest_chapter_directory(
    dir: &Path,
    config: SegmenterConfig,
) -> Result<Vec<Paragraph>> {
    let files = FileReader::read_directory(dir).await?;
    let segmenter = Segmenter::new(config);

    let mut all_paragraphs = Vec::new();

    for (path, content) in files {
        let doc_id = generate_doc_id(&path);
        let paragraphs = segmenter.segment(&doc_id, &content, &path);
        all_paragraphs.extend(paragraphs);
    }

    tracing::info!(
        dir = %dir.display(),
        paragraphs = all_paragraphs.len(),
        "Loaded chapter paragraphs"
    );

    Ok(all_paragraphs)
}
