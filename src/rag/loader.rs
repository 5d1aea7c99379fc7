//! Corpus loading: plain-text and markdown files under one directory.

use std::fs;
use std::path::Path;

use crate::errors::SessionError;

/// Extensions picked up by the walk. Everything else is skipped.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// One corpus file, read whole.
#[derive(Debug, Clone)]
pub struct CorpusFile {
    /// Path relative to the corpus root.
    pub source: String,
    pub text: String,
}

/// Recursively read every text file under `root`, sorted by source
/// path so ingestion order is stable.
pub fn load_corpus(root: &Path) -> Result<Vec<CorpusFile>, SessionError> {
    if !root.is_dir() {
        return Err(SessionError::Config(format!(
            "corpus path {} is not a readable directory",
            root.display()
        )));
    }

    let mut files = Vec::new();
    walk(root, root, &mut files)?;
    files.sort_by(|a, b| a.source.cmp(&b.source));
    Ok(files)
}

fn walk(root: &Path, dir: &Path, out: &mut Vec<CorpusFile>) -> Result<(), SessionError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        SessionError::Config(format!("cannot read corpus directory {}: {}", dir.display(), e))
    })?;

    for entry in entries {
        let entry = entry.map_err(SessionError::config)?;
        let path = entry.path();

        // file_type() does not follow symlinks, so a link cycle inside
        // the corpus is never recursed into.
        let file_type = entry.file_type().map_err(SessionError::config)?;
        if file_type.is_dir() {
            walk(root, &path, out)?;
            continue;
        }
        if !has_text_extension(&path) {
            continue;
        }

        let text = fs::read_to_string(&path).map_err(|e| {
            SessionError::Config(format!("cannot read corpus file {}: {}", path.display(), e))
        })?;
        if text.trim().is_empty() {
            continue;
        }

        let source = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .into_owned();
        out.push(CorpusFile { source, text });
    }

    Ok(())
}

fn has_text_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TEXT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
