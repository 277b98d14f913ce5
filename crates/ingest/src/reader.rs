use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

pub struct FileReader;

impl FileReader {
    pub async fn read_file(path: &Path) -> Result<String> {
        let content = fs::read_to_string(path)
            .await
            .context(format!("Failed to read file: {:?}", path))?;
        Ok(content)
    }

    /// List regular, non-hidden files below `dir`, sorted by path
    pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            anyhow::bail!("Not a directory: {:?}", dir);
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(dir).into_iter().filter_entry(|e| !is_hidden(e.path(), dir)) {
            let entry = entry.context(format!("Failed to walk directory: {:?}", dir))?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }

    pub async fn read_directory(dir: &Path) -> Result<Vec<(String, String)>> {
        let mut files = Vec::new();

        for path in Self::list_files(dir)? {
            let content = Self::read_file(&path).await?;
            let path_str = path.to_string_lossy().to_string();
            files.push((path_str, content));
        }

        Ok(files)
    }
}

fn is_hidden(path: &Path, root: &Path) -> bool {
    path != root
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
}
