//! HTTP client for the picture server's REST surface.

pub mod error;
pub mod progress;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;

pub use crate::api::error::ApiError;
pub use crate::api::progress::{UploadEvent, UploadProgress};
use crate::api::progress::{ProgressReader, ProgressTracker};
use crate::api::types::{
    CreateFolderResponse, DeleteFolderResponse, Folder, FolderInfo, FolderListing, MessageResponse,
    Picture, PictureInfo, UploadResponse,
};
use crate::media::scanner::FileCandidate;

/// Multipart field carrying each uploaded file.
pub const UPLOAD_FILES_FIELD: &str = "files";
/// Multipart field carrying the optional target folder.
pub const UPLOAD_FOLDER_FIELD: &str = "folder_name";

/// Client for one picture server. Cloning is cheap and shares the connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|e| ApiError::Url(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Url(format!("{base_url}: not a base URL")));
        }
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build().map_err(ApiError::Request)?,
            base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Base URL with each segment appended and percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Url(format!("{}: not a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Turn a non-2xx response into `ApiError::Http`.
    async fn checked(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        tracing::debug!("{} -> {} {}", url, status.as_u16(), body);
        Err(ApiError::from_response(status.as_u16(), &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::checked(request.send().await?).await?;
        let body = response.text().await?;
        // An empty 2xx body decodes as an empty object.
        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
        Ok(serde_json::from_str(body)?)
    }

    /// `GET /`: liveness probe.
    pub async fn check_health(&self) -> Result<serde_json::Value, ApiError> {
        self.send_json(self.http.get(self.base.clone())).await
    }

    /// `GET /folders`
    pub async fn list_folders(&self) -> Result<FolderListing, ApiError> {
        let url = self.endpoint(&["folders"])?;
        self.send_json(self.http.get(url)).await
    }

    /// `GET /folders/{name}`
    pub async fn folder_contents(&self, name: &str) -> Result<Folder, ApiError> {
        let url = self.endpoint(&["folders", name])?;
        self.send_json(self.http.get(url)).await
    }

    /// `GET /folders/{name}/info`
    pub async fn folder_info(&self, name: &str) -> Result<FolderInfo, ApiError> {
        let url = self.endpoint(&["folders", name, "info"])?;
        self.send_json(self.http.get(url)).await
    }

    /// `POST /folders` with form field `folder_name`.
    pub async fn create_folder(&self, name: &str) -> Result<CreateFolderResponse, ApiError> {
        let url = self.endpoint(&["folders"])?;
        let form = Form::new().text(UPLOAD_FOLDER_FIELD, name.to_owned());
        self.send_json(self.http.post(url).multipart(form)).await
    }

    /// `PUT /folders/{name}/rename`
    pub async fn rename_folder(&self, name: &str, new_name: &str) -> Result<MessageResponse, ApiError> {
        let url = self.endpoint(&["folders", name, "rename"])?;
        let body = serde_json::json!({ "new_name": new_name });
        self.send_json(self.http.put(url).json(&body)).await
    }

    /// `POST /folders/{name}/duplicate`. The server picks a name when `new_name` is `None`.
    pub async fn duplicate_folder(
        &self,
        name: &str,
        new_name: Option<&str>,
    ) -> Result<MessageResponse, ApiError> {
        let url = self.endpoint(&["folders", name, "duplicate"])?;
        let body = serde_json::json!({ "new_name": new_name });
        self.send_json(self.http.post(url).json(&body)).await
    }

    /// `DELETE /folders/{name}`: removes the folder and every picture in it.
    pub async fn delete_folder(&self, name: &str) -> Result<DeleteFolderResponse, ApiError> {
        let url = self.endpoint(&["folders", name])?;
        tracing::debug!("DELETE {}", url);
        self.send_json(self.http.delete(url)).await
    }

    /// URL a picture can be fetched from.
    pub fn picture_url(&self, folder: &str, filename: &str) -> Result<Url, ApiError> {
        self.endpoint(&["pictures", folder, filename])
    }

    /// `GET /pictures/{folder}/{filename}`: raw image bytes.
    pub async fn picture(&self, folder: &str, filename: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.picture_url(folder, filename)?;
        let response = Self::checked(self.http.get(url).send().await?).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// `GET /pictures/{folder}/{filename}/info`
    pub async fn picture_info(&self, folder: &str, filename: &str) -> Result<PictureInfo, ApiError> {
        let url = self.endpoint(&["pictures", folder, filename, "info"])?;
        self.send_json(self.http.get(url)).await
    }

    /// `PUT /pictures/{folder}/{filename}`: replace content, keep identity.
    pub async fn replace_picture(
        &self,
        folder: &str,
        filename: &str,
        file: &FileCandidate,
    ) -> Result<MessageResponse, ApiError> {
        let url = self.picture_url(folder, filename)?;
        let bytes = tokio::fs::read(&file.path).await?;
        let mut part = Part::bytes(bytes).file_name(file.name.clone());
        if let Some(mime) = file.mime {
            part = part.mime_str(mime).map_err(ApiError::Request)?;
        }
        let form = Form::new().part("file", part);
        self.send_json(self.http.put(url).multipart(form)).await
    }

    /// `DELETE /pictures/{folder}/{filename}`
    pub async fn delete_picture(&self, folder: &str, filename: &str) -> Result<MessageResponse, ApiError> {
        let url = self.picture_url(folder, filename)?;
        self.send_json(self.http.delete(url)).await
    }

    /// Every picture on the server, flattened across folders.
    pub async fn all_pictures(&self) -> Result<Vec<Picture>, ApiError> {
        Ok(self.list_folders().await?.into_pictures())
    }

    /// `POST /pictures`: upload all `files` in one multipart request.
    ///
    /// The request runs on a spawned task, so this must be called from within a
    /// tokio runtime. The returned sequence yields progress fractions as file
    /// content is streamed, then the parsed response or error.
    pub fn upload(&self, files: &[FileCandidate], folder: Option<&str>) -> UploadProgress {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.clone();
        let files = files.to_vec();
        let folder = folder
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_owned);

        tokio::spawn(async move {
            let total = files.iter().map(|f| f.size).sum();
            let tracker = ProgressTracker::new(total, tx);
            let result = client.send_upload(&files, folder.as_deref(), &tracker).await;
            match &result {
                Ok(response) => {
                    tracker.complete();
                    tracing::debug!("upload stored {} file(s) in {:?}", response.total_files, response.folder);
                }
                Err(e) => tracing::debug!("upload failed: {}", e),
            }
            tracker.finish(result);
        });

        UploadProgress::new(rx)
    }

    async fn send_upload(
        &self,
        files: &[FileCandidate],
        folder: Option<&str>,
        tracker: &Arc<ProgressTracker>,
    ) -> Result<UploadResponse, ApiError> {
        let url = self.endpoint(&["pictures"])?;
        let mut form = Form::new();
        for file in files {
            let handle = tokio::fs::File::open(&file.path).await?;
            let length = handle.metadata().await?.len();
            let reader = ProgressReader::new(handle, Arc::clone(tracker));
            let body = reqwest::Body::wrap_stream(ReaderStream::new(reader));
            let mut part = Part::stream_with_length(body, length).file_name(file.name.clone());
            if let Some(mime) = file.mime {
                part = part.mime_str(mime).map_err(ApiError::Request)?;
            }
            form = form.part(UPLOAD_FILES_FIELD, part);
        }
        if let Some(folder) = folder {
            form = form.text(UPLOAD_FOLDER_FIELD, folder.to_owned());
        }
        self.send_json(self.http.post(url).multipart(form)).await
    }
}
