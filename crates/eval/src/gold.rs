use anyhow::{Context, Result};
use relations::RelationCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One labelled pair, stored on disk as `["name1", "name2", "label"]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String, RelationCategory)", into = "(String, String, RelationCategory)")]
pub struct GoldPair {
    pub first: String,
    pub second: String,
    pub label: RelationCategory,
}

impl GoldPair {
    pub fn new(first: &str, second: &str, label: RelationCategory) -> Self {
        Self {
            first: first.to_string(),
            second: second.to_string(),
            label,
        }
    }
}

impl From<(String, String, RelationCategory)> for GoldPair {
    fn from((first, second, label): (String, String, RelationCategory)) -> Self {
        Self {
            first,
            second,
            label,
        }
    }
}

impl From<GoldPair> for (String, String, RelationCategory) {
    fn from(pair: GoldPair) -> Self {
        (pair.first, pair.second, pair.label)
    }
}

/// Surname -> labelled pairs, ordered to line up with the resolver output
pub type GoldStandard = BTreeMap<String, Vec<GoldPair>>;

pub fn parse_gold(json: &str) -> Result<GoldStandard> {
    serde_json::from_str(json).context("Failed to parse gold standard")
}

pub async fn load_gold(path: &Path) -> Result<GoldStandard> {
    let content = tokio::fs::read_to_string(path)
        .await
        .context(format!("Failed to read gold standard: {:?}", path))?;
    let gold = parse_gold(&content)?;

    tracing::info!(
        families = gold.len(),
        pairs = gold.values().map(Vec::len).sum::<usize>(),
        "Loaded gold standard"
    );

    Ok(gold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_triples() {
        let gold = parse_gold(
            r#"{"Stark": [["Ned", "Robb", "parent_child"], ["Robb", "Sansa", "sibling"]]}"#,
        )
        .unwrap();

        assert_eq!(gold["Stark"].len(), 2);
        assert_eq!(
            gold["Stark"][0],
            GoldPair::new("Ned", "Robb", RelationCategory::ParentChild)
        );
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        assert!(parse_gold(r#"{"Stark": [["Ned", "Robb", "cousin"]]}"#).is_err());
    }

    #[tokio::test]
    async fn test_load_gold_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gold.json");
        std::fs::write(&path, r#"{"Tully": [["Catelyn", "Edmure", "sibling"]]}"#).unwrap();

        let gold = load_gold(&path).await.unwrap();
        assert_eq!(gold["Tully"][0].label, RelationCategory::Sibling);
    }
}
