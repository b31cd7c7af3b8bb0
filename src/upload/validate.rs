use std::path::Path;

use crate::media::mime::{classify, dotted_extension, ALLOWED_MIMES, DEFAULT_ALLOWED_EXTENSIONS};
use crate::media::scanner::FileCandidate;

/// 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Client-side acceptance rules applied before a file enters the pending set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_file_size: u64,
    /// Dotted lowercase extensions, e.g. `".png"`.
    pub allowed_extensions: Vec<String>,
    /// MIME types accepted; derived from `allowed_extensions`.
    pub allowed_mimes: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            allowed_mimes: ALLOWED_MIMES.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl UploadLimits {
    /// Normalise user-supplied extensions (`"PNG"`, `".png"`) to `".png"` and
    /// narrow the accepted MIME types to the ones those extensions map to.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .map(|e| format!(".{e}"))
            .collect();
        self.allowed_mimes = mimes_for(&self.allowed_extensions);
        self
    }

    pub fn allows_mime(&self, mime: &str) -> bool {
        self.allowed_mimes.iter().any(|m| m == mime)
    }
}

fn mimes_for(extensions: &[String]) -> Vec<String> {
    let mut mimes: Vec<String> = Vec::new();
    for ext in extensions {
        let Some(mime) = classify(Path::new(&format!("file{ext}"))) else {
            continue;
        };
        if !mimes.iter().any(|m| m == mime) {
            mimes.push(mime.to_string());
        }
        // Some clients report the unregistered `image/jpg`.
        if mime == "image/jpeg" && !mimes.iter().any(|m| m == "image/jpg") {
            mimes.push("image/jpg".to_string());
        }
    }
    mimes
}

/// A file refused by validation. `reasons` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{name}: {}", .reasons.join(", "))]
pub struct ValidationError {
    pub name: String,
    pub reasons: Vec<String>,
}

/// Check one candidate against the type allow-list and the size limit.
///
/// The type check passes when either the MIME type or the extension is
/// allowed. Both checks run so every reason is reported at once.
pub fn validate(candidate: &FileCandidate, limits: &UploadLimits) -> Result<(), ValidationError> {
    let mut reasons = Vec::new();

    let mime_ok = candidate.mime.is_some_and(|m| limits.allows_mime(m));
    if !mime_ok {
        let ext = dotted_extension(&candidate.name);
        if ext.is_empty() || !limits.allowed_extensions.iter().any(|a| *a == ext) {
            reasons.push(format!(
                "Invalid file type: {}",
                candidate.mime.unwrap_or("unknown")
            ));
        }
    }

    if candidate.size > limits.max_file_size {
        reasons.push(format!(
            "File too large: {} (max: {})",
            format_file_size(candidate.size),
            format_file_size(limits.max_file_size)
        ));
    }

    if reasons.is_empty() {
        Ok(())
    } else {
        Err(ValidationError {
            name: candidate.name.clone(),
            reasons,
        })
    }
}

/// Human-readable size with base 1024, e.g. `1536` -> `"1.5 KB"`.
/// At most two decimals, trailing zeros dropped.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut scaled = bytes as f64;
    while scaled >= 1024.0 && unit < UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", scaled);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}
