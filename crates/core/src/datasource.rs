//! Data-source folder discovery and sample classification.
//!
//! A data source is a sub-folder of the configured root. Scanning it yields
//! one sample per image file and one per complete hyperspectral group (a
//! `.spe` + `.hdr` pair sharing a directory and stem, plus optional
//! calibration files).
//!
//! The classification itself ([`classify_files`], [`estimate_samples`]) is
//! pure; only [`DataSourceRoot`] touches the filesystem.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::CoreError;
use crate::sample::SampleType;
use crate::types::DbId;

// ── Constants ────────────────────────────────────────────────────────

/// Maximum folder nesting depth before the walker stops recursing.
pub const MAX_FOLDER_DEPTH: usize = 10;

/// Extensions imported as single-file image samples.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Extensions belonging to a hyperspectral capture group.
pub const HYPERSPECTRAL_EXTENSIONS: &[&str] = &["spe", "hdr", "figspecblack", "figspecwhite"];

// ── Types ────────────────────────────────────────────────────────────

/// A sample discovered in a data-source folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannedSample {
    pub sample_type: SampleType,
    /// Paths relative to the data-source root, prefixed with the folder name.
    pub files: Vec<String>,
}

/// Summary of one data-source folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSourceInfo {
    pub name: String,
    pub total_files: usize,
    pub total_samples: usize,
}

// ── Pure helpers ─────────────────────────────────────────────────────

/// Whether a file or directory name should be skipped while walking.
pub fn is_hidden_or_system(name: &str) -> bool {
    name.starts_with('.') || name == "Thumbs.db" || name == "desktop.ini"
}

/// Split a `/`-separated relative path into (parent dir, stem, lowercase extension).
fn split_path(relative: &str) -> (&str, &str, String) {
    let (parent, file_name) = match relative.rfind('/') {
        Some(idx) => (&relative[..idx], &relative[idx + 1..]),
        None => ("", relative),
    };
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => (
            parent,
            &file_name[..idx],
            file_name[idx + 1..].to_ascii_lowercase(),
        ),
        _ => (parent, file_name, String::new()),
    }
}

/// Turn the relative file paths of a folder into samples.
///
/// Images come first in path order, followed by hyperspectral groups ordered
/// by (directory, stem). Groups missing either the `.spe` or the `.hdr` file
/// are dropped. Every stored path is prefixed with `base`.
pub fn classify_files(base: &str, relative_paths: &[String]) -> Vec<ScannedSample> {
    let mut sorted: Vec<&String> = relative_paths.iter().collect();
    sorted.sort();

    let mut samples = Vec::new();
    let mut groups: BTreeMap<(&str, &str), Vec<(&str, String)>> = BTreeMap::new();

    for rel in sorted {
        let (parent, stem, ext) = split_path(rel);
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            samples.push(ScannedSample {
                sample_type: SampleType::Image,
                files: vec![format!("{base}/{rel}")],
            });
        } else if HYPERSPECTRAL_EXTENSIONS.contains(&ext.as_str()) {
            groups
                .entry((parent, stem))
                .or_default()
                .push((rel.as_str(), ext));
        }
    }

    for files in groups.into_values() {
        let has_spe = files.iter().any(|(_, ext)| ext == "spe");
        let has_hdr = files.iter().any(|(_, ext)| ext == "hdr");
        if !(has_spe && has_hdr) {
            continue;
        }
        samples.push(ScannedSample {
            sample_type: SampleType::Hyperspectral,
            files: files
                .into_iter()
                .map(|(rel, _)| format!("{base}/{rel}"))
                .collect(),
        });
    }

    samples
}

/// Quick sample estimate for listings: images plus distinct hyperspectral
/// groups, without checking that groups are complete.
pub fn estimate_samples(relative_paths: &[String]) -> usize {
    let mut images = 0;
    let mut groups = std::collections::BTreeSet::new();
    for rel in relative_paths {
        let (parent, stem, ext) = split_path(rel);
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            images += 1;
        } else if HYPERSPECTRAL_EXTENSIONS.contains(&ext.as_str()) {
            groups.insert((parent, stem));
        }
    }
    images + groups.len()
}

/// Validate a data-source folder name (a single path component).
pub fn validate_folder_name(name: &str) -> Result<&str, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "data source folder name must not be empty".to_string(),
        ));
    }
    if trimmed.contains('/') || trimmed.contains('\\') || trimmed == "." || trimmed == ".." {
        return Err(CoreError::Validation(format!(
            "invalid data source folder name '{trimmed}'"
        )));
    }
    Ok(trimmed)
}

// ── Filesystem access ────────────────────────────────────────────────

/// The directory holding all data-source folders.
#[derive(Debug, Clone)]
pub struct DataSourceRoot {
    root: PathBuf,
}

impl DataSourceRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory if it does not exist yet.
    pub async fn ensure_exists(&self) -> Result<(), CoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to create data source root: {e}")))
    }

    /// List data-source folders with file and estimated sample counts, sorted by name.
    pub async fn list(&self) -> Result<Vec<DataSourceInfo>, CoreError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to read directory: {e}")))?;

        let mut sources = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to read entry: {e}")))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_hidden_or_system(&name) || !entry_kind(&entry).await?.is_dir() {
                continue;
            }
            let files = collect_files(&entry.path()).await?;
            sources.push(DataSourceInfo {
                total_files: files.len(),
                total_samples: estimate_samples(&files),
                name,
            });
        }

        sources.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sources)
    }

    /// Resolve a folder name to an existing directory inside the root.
    pub async fn validate_folder(&self, name: &str) -> Result<PathBuf, CoreError> {
        let name = validate_folder_name(name)?;
        let folder = self.root.join(name);

        let is_dir = tokio::fs::metadata(&folder)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(CoreError::Validation(format!(
                "data source '{name}' does not exist"
            )));
        }

        self.ensure_within_root(&folder).await?;
        Ok(folder)
    }

    /// Walk a validated folder and classify its files into samples.
    pub async fn scan(&self, folder: &Path) -> Result<Vec<ScannedSample>, CoreError> {
        let base = folder
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| CoreError::Validation("data source folder has no name".to_string()))?;
        let files = collect_files(folder).await?;
        Ok(classify_files(&base, &files))
    }

    /// Resolve one of a sample's source files to an absolute path.
    ///
    /// The path must be listed in `source_files`, exist on disk, and resolve
    /// inside the root.
    pub async fn resolve_asset(
        &self,
        sample_id: DbId,
        relative: &str,
        source_files: &[String],
    ) -> Result<PathBuf, CoreError> {
        let not_found = || CoreError::NotFound {
            entity: "SampleFile",
            id: sample_id,
        };

        if !source_files.iter().any(|f| f == relative) {
            return Err(not_found());
        }
        let path = self.root.join(relative);
        if tokio::fs::metadata(&path).await.is_err() {
            return Err(not_found());
        }
        self.ensure_within_root(&path).await?;
        Ok(path)
    }

    async fn ensure_within_root(&self, path: &Path) -> Result<(), CoreError> {
        let real_root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|e| CoreError::Internal(format!("Failed to resolve data source root: {e}")))?;
        let real_path = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| CoreError::Validation(format!("Failed to resolve path: {e}")))?;
        if !real_path.starts_with(&real_root) {
            return Err(CoreError::Validation(
                "path escapes the data source root".to_string(),
            ));
        }
        Ok(())
    }
}

/// File type of a directory entry. Symlinks are reported as such and never
/// followed, so a walk cannot leave the folder it started in.
async fn entry_kind(entry: &tokio::fs::DirEntry) -> Result<std::fs::FileType, CoreError> {
    entry
        .file_type()
        .await
        .map_err(|e| CoreError::Internal(format!("Failed to read entry type: {e}")))
}

/// Collect every regular file under `root` as a `/`-separated relative path.
async fn collect_files(root: &Path) -> Result<Vec<String>, CoreError> {
    let mut files = Vec::new();
    walk(root, root, &mut files, 0).await?;
    files.sort();
    Ok(files)
}

async fn walk(
    root: &Path,
    current: &Path,
    files: &mut Vec<String>,
    depth: usize,
) -> Result<(), CoreError> {
    if depth > MAX_FOLDER_DEPTH {
        return Ok(());
    }

    let mut entries = tokio::fs::read_dir(current)
        .await
        .map_err(|e| CoreError::Internal(format!("Failed to read directory: {e}")))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| CoreError::Internal(format!("Failed to read entry: {e}")))?
    {
        let name = entry.file_name().to_string_lossy().to_string();
        if is_hidden_or_system(&name) {
            continue;
        }

        let path = entry.path();
        let kind = entry_kind(&entry).await?;
        if kind.is_dir() {
            Box::pin(walk(root, &path, files, depth + 1)).await?;
        } else if kind.is_file() {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect();
            files.push(parts.join("/"));
        }
    }

    Ok(())
}
