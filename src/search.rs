//! Client-side filtering and ordering over the flattened picture list.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::api::types::Picture;
use crate::media::mime::extension_of;

/// Pictures strictly larger than this count as "large".
pub const LARGE_FILE_THRESHOLD: u64 = 1_048_576;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NameAsc,
    NameDesc,
    SizeAsc,
    SizeDesc,
    FolderAsc,
    /// Keep listing order.
    Unsorted,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown sort order '{0}' (expected name, name-desc, size, size-desc, folder, none)")]
pub struct ParseSortOrderError(String);

impl FromStr for SortOrder {
    type Err = ParseSortOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" | "name-asc" => Ok(SortOrder::NameAsc),
            "name-desc" => Ok(SortOrder::NameDesc),
            "size" | "size-asc" => Ok(SortOrder::SizeAsc),
            "size-desc" => Ok(SortOrder::SizeDesc),
            "folder" => Ok(SortOrder::FolderAsc),
            "none" | "" => Ok(SortOrder::Unsorted),
            other => Err(ParseSortOrderError(other.to_string())),
        }
    }
}

/// All three predicates must hold. An empty predicate matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Case-insensitive substring of filename or folder name.
    pub text: String,
    /// Extensions without the dot, matched exactly after lowercasing.
    pub extensions: Vec<String>,
    /// Exact folder name.
    pub folder: Option<String>,
    pub sort: SortOrder,
}

impl SearchQuery {
    /// Parse a comma-separated extension list such as `"png, JPG,.gif"`.
    pub fn parse_extensions(list: &str) -> Vec<String> {
        list.split(',')
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }

    pub fn matches_text(&self, picture: &Picture) -> bool {
        let needle = self.text.trim().to_lowercase();
        needle.is_empty()
            || picture.filename.to_lowercase().contains(&needle)
            || picture.folder.to_lowercase().contains(&needle)
    }

    pub fn matches_extension(&self, picture: &Picture) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let ext = extension_of(&picture.filename);
        self.extensions.iter().any(|e| e.to_lowercase() == ext)
    }

    pub fn matches_folder(&self, picture: &Picture) -> bool {
        match self.folder.as_deref() {
            None | Some("") => true,
            Some(folder) => picture.folder == folder,
        }
    }

    pub fn matches(&self, picture: &Picture) -> bool {
        self.matches_text(picture) && self.matches_extension(picture) && self.matches_folder(picture)
    }
}

/// Pictures satisfying every predicate of `query`, in input order.
pub fn filter(pictures: &[Picture], query: &SearchQuery) -> Vec<Picture> {
    pictures.iter().filter(|p| query.matches(p)).cloned().collect()
}

fn compare(a: &Picture, b: &Picture, order: SortOrder) -> Ordering {
    match order {
        SortOrder::NameAsc => a.filename.cmp(&b.filename),
        SortOrder::NameDesc => b.filename.cmp(&a.filename),
        SortOrder::SizeAsc => a.size.cmp(&b.size),
        SortOrder::SizeDesc => b.size.cmp(&a.size),
        SortOrder::FolderAsc => a.folder.cmp(&b.folder),
        SortOrder::Unsorted => Ordering::Equal,
    }
}

/// Stable sort in place.
pub fn sort(pictures: &mut [Picture], order: SortOrder) {
    if order == SortOrder::Unsorted {
        return;
    }
    pictures.sort_by(|a, b| compare(a, b, order));
}

/// Filter then sort.
pub fn search(pictures: &[Picture], query: &SearchQuery) -> Vec<Picture> {
    let mut results = filter(pictures, query);
    sort(&mut results, query.sort);
    results
}

/// Pictures larger than [`LARGE_FILE_THRESHOLD`]; the threshold itself is excluded.
pub fn large_files(pictures: &[Picture]) -> Vec<Picture> {
    pictures
        .iter()
        .filter(|p| p.size > LARGE_FILE_THRESHOLD)
        .cloned()
        .collect()
}
