use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paragraph {
    pub doc_id: String,
    pub paragraph_id: String,
    pub index: usize, // position within the chapter
    pub text: String,
    pub source: String,
}

impl Paragraph {
    pub fn new(doc_id: String, index: usize, text: String, source: String) -> Self {
        // Generate stable paragraph_id from content
        let paragraph_id = Self::generate_paragraph_id(&doc_id, index, &text);

        Self {
            doc_id,
            paragraph_id,
            index,
            text,
            source,
        }
    }

    fn generate_paragraph_id(doc_id: &str, index: usize, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(doc_id.as_bytes());
        hasher.update(index.to_string().as_bytes());
        hasher.update(text.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16]) // Use first 16 bytes (32 hex chars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_id_is_stable() {
        let a = Paragraph::new("doc".into(), 0, "Ned is Robb's father.".into(), "c1".into());
        let b = Paragraph::new("doc".into(), 0, "Ned is Robb's father.".into(), "c1".into());
        let c = Paragraph::new("doc".into(), 1, "Ned is Robb's father.".into(), "c1".into());

        assert_eq!(a.paragraph_id, b.paragraph_id);
        assert_ne!(a.paragraph_id, c.paragraph_id);
        assert_eq!(a.paragraph_id.len(), 32);
    }
}
