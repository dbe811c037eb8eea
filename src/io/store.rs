//! Per-product model artifacts on disk.
//!
//! A fitted model is written to `<dir>/prophet_<product lowercased>.json`.
//! Saving again overwrites the previous artifact; there is no versioning and no
//! integrity check beyond JSON decoding.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::warn;

use crate::domain::ForecastModel;
use crate::error::AppError;

const ARTIFACT_PREFIX: &str = "prophet_";
const ARTIFACT_EXT: &str = "json";

/// Filesystem-backed model store.
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Artifact path for `product` (case-folded).
    pub fn path_for(&self, product: &str) -> Result<PathBuf, AppError> {
        Ok(self.dir.join(artifact_file_name(product)?))
    }

    pub fn exists(&self, product: &str) -> bool {
        self.path_for(product).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Persist `model` under its product key, replacing any previous artifact.
    pub fn save(&self, model: &ForecastModel) -> Result<PathBuf, AppError> {
        let path = self.path_for(&model.product)?;
        fs::create_dir_all(&self.dir).map_err(|e| {
            AppError::io(format!("Failed to create model dir '{}': {e}", self.dir.display()))
        })?;

        let file = File::create(&path)
            .map_err(|e| AppError::io(format!("Failed to create model file '{}': {e}", path.display())))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, model)
            .map_err(|e| AppError::io(format!("Failed to write model file '{}': {e}", path.display())))?;
        writer
            .flush()
            .map_err(|e| AppError::io(format!("Failed to flush model file '{}': {e}", path.display())))?;

        Ok(path)
    }

    /// Load the model for `product`.
    pub fn load(&self, product: &str) -> Result<ForecastModel, AppError> {
        let path = self.path_for(product)?;
        let file = File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!(
                    "No trained model for '{product}' (expected {}). Run `sf train` first.",
                    path.display()
                ))
            } else {
                AppError::data(format!("Failed to open model file '{}': {e}", path.display()))
            }
        })?;

        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| AppError::data(format!("Invalid model file '{}': {e}", path.display())))
    }

    /// Last modification time of the artifact for `product`.
    pub fn modified(&self, product: &str) -> Result<SystemTime, AppError> {
        let path = self.path_for(product)?;
        let meta = fs::metadata(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("No trained model for '{product}' ({}).", path.display()))
            } else {
                AppError::data(format!("Failed to stat model file '{}': {e}", path.display()))
            }
        })?;
        meta.modified()
            .map_err(|e| AppError::data(format!("No modification time for '{}': {e}", path.display())))
    }

    /// Product keys (lowercased) of every artifact in the store, sorted.
    pub fn list(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|_| path.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXT))
                .and_then(|s| s.strip_prefix(ARTIFACT_PREFIX));
            match key {
                Some(key) if !key.is_empty() => out.push(key.to_string()),
                _ => warn!(path = %path.display(), "skipping non-model file in model dir"),
            }
        }
        out.sort();
        out
    }
}

/// File name for a product's artifact: `prophet_<lowercase>.json`.
pub fn artifact_file_name(product: &str) -> Result<String, AppError> {
    Ok(format!("{ARTIFACT_PREFIX}{}.{ARTIFACT_EXT}", product_key(product)?))
}

/// Case-folded key used for every per-product file name.
pub fn product_key(product: &str) -> Result<String, AppError> {
    let trimmed = product.trim();
    if trimmed.is_empty() {
        return Err(AppError::data("Product identifier is empty."));
    }
    if trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
        return Err(AppError::data(format!(
            "Product identifier '{product}' cannot be used as a file name."
        )));
    }
    Ok(trimmed.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_is_case_folded() {
        let store = ModelStore::new("models");
        let a = store.path_for("Paracetamol").unwrap();
        let b = store.path_for("PARACETAMOL").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, PathBuf::from("models/prophet_paracetamol.json"));
    }

    #[test]
    fn rejects_path_like_identifiers() {
        assert!(matches!(product_key(""), Err(AppError::Data(_))));
        assert!(matches!(product_key("../etc"), Err(AppError::Data(_))));
        assert!(matches!(product_key("a\\b"), Err(AppError::Data(_))));
    }

    #[test]
    fn missing_artifact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        assert!(matches!(store.load("Nothing"), Err(AppError::NotFound(_))));
        assert!(matches!(store.modified("Nothing"), Err(AppError::NotFound(_))));
        assert!(!store.exists("Nothing"));
    }

    #[test]
    fn corrupt_artifact_is_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        fs::write(store.path_for("Bad").unwrap(), b"{not json").unwrap();
        assert!(matches!(store.load("Bad"), Err(AppError::Data(_))));
    }

    #[test]
    fn list_returns_sorted_keys() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("prophet_b.json"), b"{}").unwrap();
        fs::write(dir.path().join("prophet_a.json"), b"{}").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        let store = ModelStore::new(dir.path());
        assert_eq!(store.list(), vec!["a".to_string(), "b".to_string()]);
    }
}
