use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

use crate::media::mime::classify;

/// A local file chosen for upload, described the way the server will see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    /// Where the bytes are read from at upload time.
    pub path: PathBuf,
    /// File name sent in the multipart part (no directory components).
    pub name: String,
    /// Size in bytes at selection time.
    pub size: u64,
    /// MIME type derived from the extension; `None` when unrecognised.
    pub mime: Option<&'static str>,
}

impl FileCandidate {
    /// Build a candidate from a single file on disk.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let size = std::fs::metadata(path)?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            path: path.to_owned(),
            name,
            size,
            mime: classify(path),
        })
    }
}

/// Expand the given paths into upload candidates.
///
/// Plain files are taken as-is (validation happens later, so non-images are
/// still returned and rejected with a reason). Directories are walked
/// recursively with symlinks followed; inside directories only recognised
/// images are picked up. Missing or unreadable entries log warn and continue.
pub fn scan(paths: &[PathBuf]) -> Vec<FileCandidate> {
    let start = Instant::now();
    let mut candidates = Vec::new();

    for root in paths {
        if !root.exists() {
            tracing::warn!("Path does not exist, skipping: {}", root.display());
            continue;
        }
        if root.is_file() {
            push_candidate(root, &mut candidates);
            continue;
        }
        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            match entry {
                Err(e) => {
                    tracing::warn!("Cannot access entry: {}", e);
                }
                Ok(entry) if entry.file_type().is_file() => {
                    if classify(entry.path()).is_none() {
                        tracing::debug!("Not an image, skipping: {}", entry.path().display());
                        continue;
                    }
                    push_candidate(entry.path(), &mut candidates);
                }
                Ok(_) => {}
            }
        }
    }

    tracing::debug!(
        "Collected {} candidate files in {:.1}s",
        candidates.len(),
        start.elapsed().as_secs_f64()
    );

    candidates
}

fn push_candidate(path: &Path, candidates: &mut Vec<FileCandidate>) {
    match FileCandidate::from_path(path) {
        Ok(candidate) => {
            tracing::debug!("candidate {} ({} bytes)", candidate.name, candidate.size);
            candidates.push(candidate);
        }
        Err(e) => tracing::warn!("Cannot stat {}: {}", path.display(), e),
    }
}
