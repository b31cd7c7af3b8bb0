use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;

use picman::api::{ApiClient, ApiError};
use picman::cli::{self, Command};
use picman::config::{self, Config};
use picman::events::EventBus;
use picman::library::PictureLibrary;
use picman::media::scanner::{scan, FileCandidate};
use picman::retry::retry_with_backoff;
use picman::search::{self, SearchQuery, SortOrder};
use picman::upload::validate::{format_file_size, validate, ValidationError};
use picman::upload::{UploadError, UploadManager};

/// Set once the first Ctrl+C arrives during an upload. A second one abandons it.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

const HEALTH_RETRIES: u32 = 2;
const HEALTH_BASE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),
    #[error("{}", .0.user_message())]
    Upload(#[from] UploadError),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Usage(String),
}

/// Runs for the lifetime of an upload. The first Ctrl+C only warns: the request
/// cannot be cancelled once issued, so stopping means abandoning it.
async fn guard_interrupts() {
    loop {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        if INTERRUPTED.swap(true, Ordering::SeqCst) {
            eprintln!("\npicman: upload abandoned");
            std::process::exit(130);
        }
        eprintln!("\nUpload in progress. Press Ctrl+C again to abandon it.");
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();

    let file_config = config::find_config_file(args.config.as_deref())
        .and_then(|path| {
            match config::load_config(&path) {
                Ok(cfg) => {
                    tracing::debug!("Loaded config from {}", path.display());
                    Some(cfg)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}", e);
                    None
                }
            }
        });

    let config = Config::resolve(file_config, &args);

    let api = ApiClient::new(&config.server, Some(config.timeout)).unwrap_or_else(|e| {
        eprintln!("error: {}", e);
        std::process::exit(1);
    });

    // The only fatal failure: nothing else works without a reachable server.
    let health = retry_with_backoff(HEALTH_RETRIES, HEALTH_BASE_DELAY, || api.check_health()).await;
    if let Err(e) = health {
        eprintln!("error: picture server at {} is not reachable: {}", api.base_url(), e.user_message());
        std::process::exit(1);
    }
    tracing::debug!("Connected to {}", api.base_url());

    if let Err(e) = run(args.command, api, &config).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Command, api: ApiClient, config: &Config) -> Result<(), AppError> {
    let events = EventBus::new();
    let mut library = PictureLibrary::new(api.clone(), events.clone());

    match command {
        Command::Health => {
            let status = api.check_health().await?;
            println!("healthy: {}", status);
        }
        Command::Folders => {
            library.refresh().await?;
            if library.folders().is_empty() {
                println!("No folders.");
            }
            for folder in library.folders().values() {
                let size: u64 = folder.pictures.iter().map(|p| p.size).sum();
                println!("{:<32} {:>5} file(s)  {}", folder.name, folder.count, format_file_size(size));
            }
        }
        Command::Show { folder } => {
            let folder = api.folder_contents(&folder).await?;
            println!("{} ({} files)", folder.name, folder.count);
            for picture in &folder.pictures {
                println!("  {:<40} {:>10}", picture.filename, format_file_size(picture.size));
            }
        }
        Command::Info { folder, filename: None } => {
            let info = api.folder_info(&folder).await?;
            println!("name:      {}", info.name);
            println!("pictures:  {}", info.count);
            if let Some(size) = info.total_size {
                println!("size:      {}", format_file_size(size));
            }
            if let Some(created) = info.created_at {
                println!("created:   {}", created);
            }
            if let Some(modified) = info.modified_at {
                println!("modified:  {}", modified);
            }
        }
        Command::Info { folder, filename: Some(filename) } => {
            let info = api.picture_info(&folder, &filename).await?;
            println!("name:      {}", info.filename);
            println!("folder:    {}", info.folder);
            println!("size:      {}", format_file_size(info.size));
            println!("type:      {}", info.mime_type.as_deref().unwrap_or("unknown"));
            println!("url:       {}", api.picture_url(&folder, &filename)?);
            if let Some(modified) = info.modified_at {
                println!("modified:  {}", modified);
            }
        }
        Command::Upload { paths, folder } => {
            upload(&paths, folder.as_deref(), api, events, &mut library, config).await?;
        }
        Command::Download { folder, filename, output } => {
            let bytes = api.picture(&folder, &filename).await?;
            let output = output.unwrap_or_else(|| PathBuf::from(&filename));
            tokio::fs::write(&output, &bytes).await?;
            println!("Saved {} ({}) to {}", filename, format_file_size(bytes.len() as u64), output.display());
        }
        Command::Replace { folder, filename, path } => {
            let candidate = FileCandidate::from_path(&path)?;
            validate(&candidate, &config.limits)?;
            library.replace_picture(&folder, &filename, &candidate).await?;
            println!("Replaced {}/{}", folder, filename);
        }
        Command::Delete { folder, filename } => {
            library.delete_picture(&folder, &filename).await?;
            println!("Deleted {}/{}", folder, filename);
        }
        Command::CreateFolder { name } => {
            let created = library.create_folder(&name).await?;
            println!("Folder \"{}\" created", created.folder_name);
        }
        Command::RenameFolder { name, new_name } => {
            library.rename_folder(&name, &new_name).await?;
            println!("Folder \"{}\" renamed to \"{}\"", name, new_name);
        }
        Command::DuplicateFolder { name, new_name } => {
            let response = library.duplicate_folder(&name, new_name.as_deref()).await?;
            let copy = response
                .extra
                .get("new_folder")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .or(new_name)
                .unwrap_or_else(|| "a new folder".to_string());
            println!("Folder \"{}\" copied to {}", name, copy);
        }
        Command::DeleteFolder { name } => {
            let response = library.delete_folder(&name).await?;
            println!("Folder \"{}\" and {} file(s) deleted", name, response.files_deleted);
        }
        Command::Search { query, ext, folder, sort, large } => {
            let sort: SortOrder = sort.parse().map_err(|e: search::ParseSortOrderError| AppError::Usage(e.to_string()))?;
            let query = SearchQuery {
                text: query,
                extensions: ext.as_deref().map(SearchQuery::parse_extensions).unwrap_or_default(),
                folder,
                sort,
            };
            library.refresh().await?;
            let results = if large {
                search::search(&library.large_files(), &query)
            } else {
                library.search(&query)
            };
            for picture in &results {
                println!("{:<24} {:<40} {:>10}", picture.folder, picture.filename, format_file_size(picture.size));
            }
            println!("{} of {} picture(s) match", results.len(), library.pictures().len());
        }
    }

    Ok(())
}

async fn upload(
    paths: &[PathBuf],
    folder: Option<&str>,
    api: ApiClient,
    events: EventBus,
    library: &mut PictureLibrary,
    config: &Config,
) -> Result<(), AppError> {
    let mut manager = UploadManager::new(api, events.clone(), config.limits.clone());
    let report = manager.select(scan(paths));

    for rejected in &report.rejected {
        eprintln!("skipped {}", rejected);
    }
    for duplicate in &report.duplicates {
        tracing::info!("Skipping duplicate file: {}", duplicate);
    }
    if manager.pending().is_empty() {
        return Err(AppError::Usage("no valid image files to upload".to_string()));
    }

    println!(
        "Uploading {} file(s), {}",
        manager.pending().len(),
        format_file_size(manager.pending().total_size())
    );

    let mut subscription = events.subscribe();
    let guard = tokio::spawn(guard_interrupts());
    let mut shown = -1i64;
    let result = manager
        .upload(folder, |percent| {
            let rounded = percent.round() as i64;
            if rounded != shown {
                shown = rounded;
                eprint!("\rUploading... {}%", rounded);
            }
        })
        .await;
    guard.abort();
    eprintln!();

    let outcome = result?;
    println!(
        "Uploaded {} file(s) to folder \"{}\"",
        outcome.response.stored_names().len(),
        outcome.response.folder
    );
    for rename in &outcome.renames {
        println!("warning: {} already existed, stored as {}", rename.original_name, rename.filename);
    }
    for error in &outcome.errors {
        println!("warning: {}", error);
    }

    // The upload guard has consumed the default SIGINT action, so the reload
    // listens for Ctrl+C itself.
    let reload = async {
        while let Ok(event) = subscription.try_recv() {
            if let Err(e) = library.handle_event(&event).await {
                tracing::warn!("Could not reload folders after upload: {}", e.user_message());
            }
        }
    };
    tokio::select! {
        _ = reload => {}
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\npicman: interrupted");
            std::process::exit(130);
        }
    }
    if let Some(folder) = library.folder(&outcome.response.folder) {
        println!("Folder \"{}\" now holds {} picture(s)", folder.name, folder.count);
    }

    Ok(())
}
