use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem storage. Relative paths resolve against `base_path`; absolute
/// paths are used as given.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new(".")
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = fs::read(self.resolve(path))?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }

    async fn list_documents(&self, path: &str, extension: &str) -> Result<Vec<String>> {
        let full_path = self.resolve(path);

        // 不存在的路徑回傳 NotFound
        if !fs::metadata(&full_path)?.is_dir() {
            return Ok(vec![path.to_string()]);
        }

        let mut documents = Vec::new();
        for entry in fs::read_dir(&full_path)? {
            let entry_path = entry?.path();
            if entry_path.is_file() && has_extension(&entry_path, extension) {
                if let Some(name) = entry_path.file_name().and_then(|name| name.to_str()) {
                    documents.push(Path::new(path).join(name).to_string_lossy().into_owned());
                }
            }
        }
        documents.sort();
        Ok(documents)
    }
}
