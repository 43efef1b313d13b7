//! Template Repository
//!
//! Loads template descriptors from a directory (one JSON file per template,
//! named `<template_id>.json`) and caches them for the process lifetime.
//!
//! The cache is an explicit component instance owned by the pipeline, never a
//! module-level global. It is process-local and read-mostly; multi-worker
//! deployments must front it with their own synchronization.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::TemplateDescriptor;
use crate::types::{DeckError, Result};

/// Cached, directory-backed template store.
pub struct TemplateRepository {
    base_dir: PathBuf,
    cache: DashMap<String, Arc<TemplateDescriptor>>,
}

impl TemplateRepository {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            cache: DashMap::new(),
        }
    }

    fn descriptor_path(&self, template_id: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", template_id))
    }

    /// Get a descriptor by id, loading and caching it on first use.
    pub fn get(&self, template_id: &str) -> Result<Arc<TemplateDescriptor>> {
        if let Some(cached) = self.cache.get(template_id) {
            return Ok(cached.clone());
        }
        self.reload(template_id)
    }

    /// Load a descriptor from disk, replacing any cached copy.
    pub fn reload(&self, template_id: &str) -> Result<Arc<TemplateDescriptor>> {
        let path = self.descriptor_path(template_id);
        if !path.exists() {
            return Err(DeckError::TemplateNotFound(template_id.to_string()));
        }

        let descriptor = Arc::new(TemplateDescriptor::load_from_file(&path)?);
        if descriptor.template_id != template_id {
            return Err(DeckError::TemplateParse {
                path: path.display().to_string(),
                message: format!(
                    "template_id '{}' does not match file name '{}'",
                    descriptor.template_id, template_id
                ),
            });
        }

        debug!(template_id, slides = descriptor.slides.len(), "template loaded");
        self.cache.insert(template_id.to_string(), descriptor.clone());
        Ok(descriptor)
    }

    /// Drop every cached descriptor.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Template ids present on disk (sorted).
    pub fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DESCRIPTOR: &str = r#"{
        "template_id": "mss_exec",
        "audience": "management",
        "slides": [
            {
                "slide_no": 1,
                "slide_key": "cover",
                "title": "Cover",
                "placeholders": [
                    {"token": "CUSTOMER_NAME", "type": "text", "source": "tenant.name"}
                ]
            }
        ]
    }"#;

    fn repo_with_descriptor() -> (TempDir, TemplateRepository) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("mss_exec.json"), DESCRIPTOR).unwrap();
        let repo = TemplateRepository::new(dir.path());
        (dir, repo)
    }

    #[test]
    fn test_get_and_cache() {
        let (_dir, repo) = repo_with_descriptor();
        let first = repo.get("mss_exec").unwrap();
        let second = repo.get("mss_exec").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_missing_template() {
        let (_dir, repo) = repo_with_descriptor();
        assert!(matches!(
            repo.get("nope"),
            Err(DeckError::TemplateNotFound(_))
        ));
    }

    #[test]
    fn test_reload_after_clear() {
        let (dir, repo) = repo_with_descriptor();
        let first = repo.get("mss_exec").unwrap();
        repo.clear();
        fs::write(dir.path().join("mss_exec.json"), DESCRIPTOR).unwrap();
        let second = repo.get("mss_exec").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_id_mismatch_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("other_name.json"), DESCRIPTOR).unwrap();
        let repo = TemplateRepository::new(dir.path());
        assert!(matches!(
            repo.get("other_name"),
            Err(DeckError::TemplateParse { .. })
        ));
    }

    #[test]
    fn test_list() {
        let (_dir, repo) = repo_with_descriptor();
        assert_eq!(repo.list().unwrap(), vec!["mss_exec".to_string()]);
    }
}
