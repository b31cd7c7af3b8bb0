use crate::media::scanner::FileCandidate;

/// Files chosen but not yet uploaded, in selection order.
/// No two entries share the same `(name, size)`.
#[derive(Debug, Clone, Default)]
pub struct PendingSet {
    files: Vec<FileCandidate>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str, size: u64) -> bool {
        self.files.iter().any(|f| f.name == name && f.size == size)
    }

    /// Append `file` unless an entry with the same name and size exists.
    /// Returns whether it was added.
    pub fn insert(&mut self, file: FileCandidate) -> bool {
        if self.contains(&file.name, file.size) {
            return false;
        }
        self.files.push(file);
        true
    }

    pub fn remove(&mut self, index: usize) -> Option<FileCandidate> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileCandidate> {
        self.files.iter()
    }

    pub fn as_slice(&self) -> &[FileCandidate] {
        &self.files
    }
}
