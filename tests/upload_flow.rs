mod common;

use common::{write_file, MockServer, LOCKED_FOLDER};
use picman::events::{AppEvent, EventBus};
use picman::media::scanner::{scan, FileCandidate};
use picman::upload::validate::UploadLimits;
use picman::upload::{UploadError, UploadManager, UploadState};

async fn setup(server: &MockServer) -> (UploadManager, EventBus) {
    let events = EventBus::new();
    let manager = UploadManager::new(server.client().await, events.clone(), UploadLimits::default());
    (manager, events)
}

#[tokio::test]
async fn upload_with_nothing_selected_is_refused() {
    let server = MockServer::new();
    let (mut manager, _) = setup(&server).await;
    let err = manager.upload(Some("pics"), |_| {}).await.unwrap_err();
    assert!(matches!(err, UploadError::NothingSelected));
}

#[tokio::test]
async fn successful_upload_clears_pending_and_notifies() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::new();
    let (mut manager, events) = setup(&server).await;
    let mut rx = events.subscribe();

    write_file(dir.path(), "a.png", 2000);
    write_file(dir.path(), "b.jpg", 3000);
    let report = manager.select(scan(&[dir.path().to_path_buf()]));
    assert_eq!(report.added.len(), 2);

    let mut percents = Vec::new();
    let outcome = manager.upload(Some("pics"), |p| percents.push(p)).await.unwrap();

    assert_eq!(outcome.file_count, 2);
    assert!(outcome.renames.is_empty());
    assert_eq!(manager.state(), UploadState::Idle);
    assert!(manager.pending().is_empty());
    assert_eq!(*percents.last().unwrap(), 100.0);
    assert!(percents.iter().all(|p| (0.0..=100.0).contains(p)));

    let event = rx.try_recv().unwrap();
    assert_eq!(
        event,
        AppEvent::UploadComplete { folder: "pics".to_string(), file_count: 2 }
    );
    assert_eq!(server.file_names("pics"), vec!["a.png", "b.jpg"]);
}

#[tokio::test]
async fn collisions_surface_as_warnings_not_errors() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::new();
    server.seed("pics", "a.png", 100);
    let (mut manager, _) = setup(&server).await;

    std::fs::create_dir(dir.path().join("x")).unwrap();
    std::fs::create_dir(dir.path().join("y")).unwrap();
    let first = FileCandidate::from_path(&write_file(&dir.path().join("x"), "a.png", 2000)).unwrap();
    let second = FileCandidate::from_path(&write_file(&dir.path().join("y"), "a.png", 3000)).unwrap();
    let report = manager.select(vec![first, second]);
    assert_eq!(report.added.len(), 2, "same name with different size is not a duplicate");

    let outcome = manager.upload(Some("pics"), |_| {}).await.unwrap();
    assert!(!outcome.renames.is_empty());
    for rename in &outcome.renames {
        assert_eq!(rename.original_name, "a.png");
        assert_ne!(rename.filename, "a.png");
    }
    assert!(outcome.errors.is_empty());
    assert_eq!(server.file_names("pics").len(), 3);
}

#[tokio::test]
async fn failed_upload_keeps_pending_for_retry() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::new();
    let (mut manager, events) = setup(&server).await;
    let mut rx = events.subscribe();

    manager.select(vec![FileCandidate::from_path(&write_file(dir.path(), "a.png", 10)).unwrap()]);
    let err = manager.upload(Some(LOCKED_FOLDER), |_| {}).await.unwrap_err();

    assert_eq!(err.user_message(), "Folder is locked");
    assert_eq!(manager.state(), UploadState::FilesSelected);
    assert_eq!(manager.pending().len(), 1);
    assert!(rx.try_recv().is_err(), "no completion event on failure");

    let outcome = manager.upload(Some("pics"), |_| {}).await.unwrap();
    assert_eq!(outcome.file_count, 1);
    assert_eq!(server.file_names("pics"), vec!["a.png"]);
}

#[tokio::test]
async fn network_failure_keeps_pending() {
    let dir = tempfile::tempdir().unwrap();
    let api = picman::api::ApiClient::new("http://127.0.0.1:1", None).unwrap();
    let mut manager = UploadManager::new(api, EventBus::new(), UploadLimits::default());
    manager.select(vec![FileCandidate::from_path(&write_file(dir.path(), "a.png", 10)).unwrap()]);

    let err = manager.upload(None, |_| {}).await.unwrap_err();
    assert!(matches!(err, UploadError::Api(picman::api::ApiError::Network(_))));
    assert_eq!(manager.pending().len(), 1);
}

#[tokio::test]
async fn abandoned_upload_does_not_block_the_next_one() {
    let dir = tempfile::tempdir().unwrap();
    let server = MockServer::new();
    let (mut manager, _) = setup(&server).await;
    manager.select(vec![FileCandidate::from_path(&write_file(dir.path(), "a.png", 10)).unwrap()]);

    let abandoned = tokio::time::timeout(std::time::Duration::ZERO, manager.upload(Some("first"), |_| {})).await;
    assert!(abandoned.is_err(), "upload should still be waiting on the server");
    assert_eq!(manager.state(), UploadState::FilesSelected);
    assert_eq!(manager.pending().len(), 1);

    let outcome = manager.upload(Some("second"), |_| {}).await.unwrap();
    assert_eq!(outcome.file_count, 1);
    assert_eq!(server.file_names("second"), vec!["a.png"]);
}
