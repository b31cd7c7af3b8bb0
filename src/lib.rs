//! Client for a picture server: upload, browse, search and prune images.

pub mod api;
pub mod cli;
pub mod config;
pub mod events;
pub mod library;
pub mod media;
pub mod retry;
pub mod search;
pub mod upload;
