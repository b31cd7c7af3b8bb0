use std::collections::BTreeMap;

use crate::api::types::{
    CreateFolderResponse, DeleteFolderResponse, Folder, FolderListing, MessageResponse, Picture,
};
use crate::api::{ApiClient, ApiError};
use crate::events::{AppEvent, EventBus};
use crate::media::scanner::FileCandidate;
use crate::search::{self, SearchQuery};

/// Client-side mirror of the server's folders and pictures.
///
/// Only ever a cache: every refresh replaces it wholesale, and every mutating
/// call is followed by a full refresh rather than local patching. A mutation
/// returns `Err` only when the server refused it.
pub struct PictureLibrary {
    api: ApiClient,
    events: EventBus,
    folders: BTreeMap<String, Folder>,
    pictures: Vec<Picture>,
    loaded: bool,
}

impl PictureLibrary {
    pub fn new(api: ApiClient, events: EventBus) -> Self {
        Self {
            api,
            events,
            folders: BTreeMap::new(),
            pictures: Vec::new(),
            loaded: false,
        }
    }

    /// Re-fetch the full listing. On failure the previous mirror is kept.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        let listing = match self.api.list_folders().await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!("Folder refresh failed, keeping cached listing: {}", e);
                return Err(e);
            }
        };
        self.replace(listing);
        self.events.emit(AppEvent::LibraryRefreshed {
            folders: self.folders.len(),
            pictures: self.pictures.len(),
        });
        Ok(())
    }

    fn replace(&mut self, listing: FolderListing) {
        self.pictures = listing.clone().into_pictures();
        self.folders = listing.folders;
        self.loaded = true;
        tracing::debug!(
            "Library holds {} folders, {} pictures",
            self.folders.len(),
            self.pictures.len()
        );
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn folders(&self) -> &BTreeMap<String, Folder> {
        &self.folders
    }

    pub fn folder(&self, name: &str) -> Option<&Folder> {
        self.folders.get(name)
    }

    /// Every cached picture, flattened across folders.
    pub fn pictures(&self) -> &[Picture] {
        &self.pictures
    }

    pub fn search(&self, query: &SearchQuery) -> Vec<Picture> {
        search::search(&self.pictures, query)
    }

    pub fn large_files(&self) -> Vec<Picture> {
        search::large_files(&self.pictures)
    }

    /// React to bus events. Upload completion triggers a reload.
    pub async fn handle_event(&mut self, event: &AppEvent) -> Result<(), ApiError> {
        match event {
            AppEvent::UploadComplete { folder, file_count } => {
                tracing::debug!("{} file(s) landed in {}, reloading", file_count, folder);
                self.refresh().await
            }
            _ => Ok(()),
        }
    }

    /// Refresh after a write the server already applied. A failed reload
    /// leaves the previous mirror and is only logged: the write stands.
    async fn reload_after_write(&mut self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!("Change saved, but the folder view could not be reloaded: {}", e.user_message());
        }
    }

    pub async fn create_folder(&mut self, name: &str) -> Result<CreateFolderResponse, ApiError> {
        let response = self.api.create_folder(name).await?;
        self.reload_after_write().await;
        Ok(response)
    }

    pub async fn rename_folder(&mut self, name: &str, new_name: &str) -> Result<MessageResponse, ApiError> {
        let response = self.api.rename_folder(name, new_name).await?;
        self.reload_after_write().await;
        Ok(response)
    }

    pub async fn duplicate_folder(
        &mut self,
        name: &str,
        new_name: Option<&str>,
    ) -> Result<MessageResponse, ApiError> {
        let response = self.api.duplicate_folder(name, new_name).await?;
        self.reload_after_write().await;
        Ok(response)
    }

    pub async fn delete_folder(&mut self, name: &str) -> Result<DeleteFolderResponse, ApiError> {
        let response = self.api.delete_folder(name).await?;
        tracing::info!("Deleted folder {} ({} files)", name, response.files_deleted);
        self.events.emit(AppEvent::FolderDeleted {
            folder: name.to_string(),
            files_deleted: response.files_deleted,
        });
        self.reload_after_write().await;
        Ok(response)
    }

    pub async fn replace_picture(
        &mut self,
        folder: &str,
        filename: &str,
        file: &FileCandidate,
    ) -> Result<MessageResponse, ApiError> {
        let response = self.api.replace_picture(folder, filename, file).await?;
        self.reload_after_write().await;
        Ok(response)
    }

    pub async fn delete_picture(&mut self, folder: &str, filename: &str) -> Result<MessageResponse, ApiError> {
        let response = self.api.delete_picture(folder, filename).await?;
        self.reload_after_write().await;
        Ok(response)
    }
}
