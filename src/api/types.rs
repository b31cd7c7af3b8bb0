use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One stored image. Identity is `(folder, filename)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    pub filename: String,
    /// Server-side path, relative to the upload root.
    #[serde(default)]
    pub path: String,
    pub size: u64,
    #[serde(default)]
    pub folder: String,
}

/// A named collection of pictures as returned by `GET /folders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    #[serde(default)]
    pub pictures: Vec<Picture>,
    #[serde(default)]
    pub count: u64,
}

/// Body of `GET /folders`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FolderListing {
    #[serde(default)]
    pub folders: BTreeMap<String, Folder>,
}

impl FolderListing {
    /// Flatten every folder into one list, tagging each picture with the
    /// folder it was listed under.
    pub fn into_pictures(self) -> Vec<Picture> {
        self.folders
            .into_values()
            .flat_map(|folder| {
                let name = folder.name;
                folder.pictures.into_iter().map(move |mut picture| {
                    picture.folder = name.clone();
                    picture
                })
            })
            .collect()
    }
}

/// Body of `GET /folders/{name}/info`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FolderInfo {
    pub name: String,
    #[serde(default)]
    pub pictures: Vec<Picture>,
    #[serde(default)]
    pub count: u64,
    pub created_at: Option<String>,
    pub modified_at: Option<String>,
    pub total_size: Option<u64>,
}

/// Body of `GET /pictures/{folder}/{filename}/info`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PictureInfo {
    pub filename: String,
    pub size: u64,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub folder: String,
    pub created_at: Option<String>,
    pub modified_at: Option<String>,
    pub mime_type: Option<String>,
}

/// One stored file in an upload response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    /// Name the server stored the file under.
    pub filename: String,
    /// Name the client sent. Differs from `filename` when renamed.
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub renamed: bool,
}

/// Body of `POST /pictures`.
///
/// Accepts both the detailed `uploaded` form and the older `files` form, which
/// only lists stored names and never reports renames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub uploaded: Vec<UploadedFile>,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default, alias = "folder_name")]
    pub folder: String,
    #[serde(default)]
    pub total_files: u64,
    /// Per-file failures inside an otherwise successful response.
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A rename-on-collision pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub original_name: String,
    pub filename: String,
}

impl UploadResponse {
    /// Files the server stored under a different name than the one sent.
    pub fn renamed(&self) -> Vec<Rename> {
        self.uploaded
            .iter()
            .filter(|f| f.renamed)
            .map(|f| Rename {
                original_name: f.original_name.clone().unwrap_or_default(),
                filename: f.filename.clone(),
            })
            .collect()
    }

    /// Names the server stored, whichever response form it used.
    pub fn stored_names(&self) -> Vec<&str> {
        if self.uploaded.is_empty() {
            self.files.iter().map(String::as_str).collect()
        } else {
            self.uploaded.iter().map(|f| f.filename.as_str()).collect()
        }
    }
}

/// Body of `DELETE /folders/{name}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteFolderResponse {
    #[serde(default)]
    pub files_deleted: u64,
    pub folder_name: Option<String>,
    pub message: Option<String>,
}

/// Body of `POST /folders`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateFolderResponse {
    pub folder_name: String,
    pub message: Option<String>,
}

/// Generic `{message, ...}` body returned by replace, delete, rename and
/// duplicate calls. Extra keys are kept for display.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// FastAPI-style error body: `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: serde_json::Value,
}
