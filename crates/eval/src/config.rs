use anyhow::{Context, Result};
use relations::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "KINSHIP_CONFIG";

/// Where the corpus, gold standard and outputs live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub ner_dir: PathBuf,
    pub chapters_dir: PathBuf,
    pub gold_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            ner_dir: PathBuf::from("data/ner"),
            chapters_dir: PathBuf::from("data/chapters"),
            gold_path: PathBuf::from("data/gold.json"),
            output_dir: PathBuf::from("results"),
        }
    }
}

impl DataConfig {
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("KINSHIP_NER_DIR") {
            self.ner_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("KINSHIP_CHAPTERS_DIR") {
            self.chapters_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("KINSHIP_GOLD_PATH") {
            self.gold_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("KINSHIP_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
    }
}

/// Settings for an offline evaluation run. Reads the same file as the API
/// service; keys it does not know are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub data: DataConfig,
}

impl EvaluationConfig {
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let mut config = Self::from_file(path.as_deref())?;
        config.data.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config: {:?}", path))?;
        serde_json::from_str(&content).context(format!("Failed to parse config: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_settings_come_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kinship.json");
        std::fs::write(
            &path,
            r#"{
                "server": {"bind_addr": "127.0.0.1:8080"},
                "pipeline": {"resolver": {"sibling_floor": 1}, "grouper": {"title_threshold": 9}},
                "data": {"gold_path": "/corpus/gold.json"}
            }"#,
        )
        .unwrap();

        let config = EvaluationConfig::from_file(Some(&path)).unwrap();
        assert_eq!(config.pipeline.resolver.sibling_floor, 1);
        assert_eq!(config.pipeline.resolver.max_parents, 2);
        assert_eq!(config.pipeline.grouper.title_threshold, 9);
        assert_eq!(config.data.gold_path, PathBuf::from("/corpus/gold.json"));
        assert_eq!(config.data.ner_dir, PathBuf::from("data/ner"));
    }

    #[test]
    fn test_overrides_include_output_dir() {
        let mut data = DataConfig::default();
        data.apply_overrides(|key| match key {
            "KINSHIP_OUTPUT_DIR" => Some("/tmp/kinship".to_string()),
            _ => None,
        });

        assert_eq!(data.output_dir, PathBuf::from("/tmp/kinship"));
        assert_eq!(data.chapters_dir, PathBuf::from("data/chapters"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EvaluationConfig::from_file(Some(&dir.path().join("absent.json"))).is_err());
    }
}
