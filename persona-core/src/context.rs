//! Few-shot context assembled from auxiliary example documents.

use std::path::{Path, PathBuf};

const DOCUMENT_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FewShotContext {
    pub text: String,
    pub loaded: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

impl FewShotContext {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Read every configured document and join their text.
///
/// Directories contribute their text files in name order. Documents that
/// cannot be read are skipped with a warning. The result is capped at
/// `max_chars` characters.
pub fn load_context(paths: &[String], max_chars: usize) -> FewShotContext {
    let mut ctx = FewShotContext::default();
    let mut parts: Vec<String> = Vec::new();

    for raw in paths {
        let expanded = match shellexpand::full(raw) {
            Ok(p) => PathBuf::from(p.as_ref()),
            Err(e) => {
                tracing::warn!(path = %raw, error = %e, "Could not expand document path, skipping");
                ctx.skipped.push(PathBuf::from(raw));
                continue;
            }
        };

        for file in document_files(&expanded, &mut ctx.skipped) {
            match std::fs::read_to_string(&file) {
                Ok(text) if !text.trim().is_empty() => {
                    parts.push(text.trim().to_string());
                    ctx.loaded.push(file);
                }
                Ok(_) => {
                    tracing::debug!(path = %file.display(), "Empty document ignored");
                }
                Err(e) => {
                    tracing::warn!(path = %file.display(), error = %e, "Failed to read document, skipping");
                    ctx.skipped.push(file);
                }
            }
        }
    }

    let joined = parts.join("\n\n");
    ctx.text = if joined.chars().count() > max_chars {
        joined.chars().take(max_chars).collect()
    } else {
        joined
    };

    tracing::info!(
        loaded = ctx.loaded.len(),
        skipped = ctx.skipped.len(),
        chars = ctx.text.chars().count(),
        "Few-shot context loaded"
    );

    ctx
}

fn document_files(path: &Path, skipped: &mut Vec<PathBuf>) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    let entries = match std::fs::read_dir(path) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Document path unreadable, skipping");
            skipped.push(path.to_path_buf());
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && has_document_extension(p))
        .collect();
    files.sort();
    files
}

fn has_document_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| DOCUMENT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
