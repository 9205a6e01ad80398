// src/gesture/store.rs
//! Persisted gesture template collection
//!
//! Insertion order is creation order and the classifier scans top to bottom,
//! so order is part of the matching semantics (first match wins). The file
//! is rewritten wholesale on every append; the collection is small and the
//! write is atomic enough for a single-user tool.

use crate::gesture::template::{GestureTemplate, TemplateError};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Template store errors
#[derive(Debug)]
pub enum StoreError {
    Io(String),
    Parse(String),
    Template(TemplateError),
    DuplicateName(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(msg) => write!(f, "template store IO error: {}", msg),
            StoreError::Parse(msg) => write!(f, "template store parse error: {}", msg),
            StoreError::Template(e) => write!(f, "invalid template: {}", e),
            StoreError::DuplicateName(name) => {
                write!(f, "a template named {:?} already exists", name)
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Template(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<TemplateError> for StoreError {
    fn from(err: TemplateError) -> Self {
        StoreError::Template(err)
    }
}

/// Ordered, JSON-persisted collection of gesture templates.
pub struct TemplateStore {
    templates: Vec<GestureTemplate>,
    path: PathBuf,
}

impl TemplateStore {
    /// Load the store from `path`. A missing or empty file yields an empty
    /// store; malformed JSON is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no template file, starting empty");
            return Ok(Self {
                templates: Vec::new(),
                path,
            });
        }

        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Self {
                templates: Vec::new(),
                path,
            });
        }

        let templates: Vec<GestureTemplate> =
            serde_json::from_str(&content).map_err(|e| StoreError::Parse(e.to_string()))?;

        tracing::info!(count = templates.len(), path = %path.display(), "templates loaded");
        Ok(Self { templates, path })
    }

    /// Create an empty store that will persist to `path`.
    pub fn empty<P: AsRef<Path>>(path: P) -> Self {
        Self {
            templates: Vec::new(),
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Validate, append, and re-persist the whole collection.
    pub fn append(&mut self, template: GestureTemplate) -> Result<(), StoreError> {
        template.validate()?;

        if self.templates.iter().any(|t| t.name == template.name) {
            return Err(StoreError::DuplicateName(template.name));
        }

        self.templates.push(template);
        self.save()?;
        Ok(())
    }

    /// Rewrite the backing file from the in-memory collection.
    pub fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.templates)
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        fs::write(&self.path, json)?;
        tracing::info!(count = self.templates.len(), path = %self.path.display(), "templates saved");
        Ok(())
    }

    pub fn templates(&self) -> &[GestureTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
