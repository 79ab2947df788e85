//! Ordered provider chains for reading and writing lessons.
//!
//! A read walks `[Api, Static]` (or `[Local]`) and a write walks
//! `[Api, Download]` (or `[Local]`). A provider that cannot be reached hands
//! the request to the next one; data errors stop the walk.

use crate::api::ApiClient;
use lexicard_core::models::WordEntry;
use lexicard_core::session::FileBatch;
use lexicard_core::{AppError, FileStore};
use std::path::{Path, PathBuf};

/// Directory that receives lesson copies when no store accepts the write.
#[derive(Debug, Clone)]
pub struct DownloadSink {
    dir: PathBuf,
}

impl DownloadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `<dir>/<name>.json` in the lesson file format.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, name: &str, entries: &[WordEntry]) -> Result<PathBuf, AppError> {
        let store = FileStore::open(&self.dir)?;
        store.write_file(name, entries)?;
        Ok(self.dir.join(format!("{}.json", name)))
    }
}

/// One place lessons can be read from.
#[derive(Debug, Clone)]
pub enum ReadProvider {
    /// `GET /api/files` and `GET /api/data/{name}`.
    Api(ApiClient),
    /// `GET /data/{name}.json`; cannot list lessons.
    Static(ApiClient),
    /// A lesson directory on this machine.
    Local(FileStore),
}

impl ReadProvider {
    pub fn label(&self) -> &'static str {
        match self {
            ReadProvider::Api(_) => "api",
            ReadProvider::Static(_) => "static",
            ReadProvider::Local(_) => "local",
        }
    }

    pub async fn list_files(&self) -> Result<Vec<String>, AppError> {
        match self {
            ReadProvider::Api(client) => client.list_files().await,
            ReadProvider::Static(_) => Err(AppError::StorageUnavailable(
                "static copy has no lesson listing".to_string(),
            )),
            ReadProvider::Local(store) => store.list_files(),
        }
    }

    pub async fn read_file(&self, name: &str) -> Result<Vec<WordEntry>, AppError> {
        match self {
            ReadProvider::Api(client) => client.read_file(name).await,
            ReadProvider::Static(client) => client.read_static(name).await,
            ReadProvider::Local(store) => store.read_file(name),
        }
    }
}

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Saved {
    /// The lesson store accepted the write.
    Stored { provider: &'static str },
    /// No store was reachable; a copy was written here instead.
    Downloaded(PathBuf),
}

/// One place lessons can be written to.
#[derive(Debug, Clone)]
pub enum WriteProvider {
    Api(ApiClient),
    Download(DownloadSink),
    Local(FileStore),
}

impl WriteProvider {
    pub fn label(&self) -> &'static str {
        match self {
            WriteProvider::Api(_) => "api",
            WriteProvider::Download(_) => "download",
            WriteProvider::Local(_) => "local",
        }
    }

    pub async fn save(&self, name: &str, entries: &[WordEntry]) -> Result<Saved, AppError> {
        match self {
            WriteProvider::Api(client) => {
                client.save_file(name, entries).await?;
                Ok(Saved::Stored { provider: "api" })
            }
            WriteProvider::Download(sink) => sink.save(name, entries).map(Saved::Downloaded),
            WriteProvider::Local(store) => {
                store.write_file(name, entries)?;
                Ok(Saved::Stored { provider: "local" })
            }
        }
    }
}

fn no_providers() -> AppError {
    AppError::StorageUnavailable("no lesson providers configured".to_string())
}

/// A read may continue with the next provider after these errors. A lesson
/// missing from the API is still tried on the static copy.
fn read_falls_through(err: &AppError) -> bool {
    err.is_reachability() || matches!(err, AppError::NotFound(_))
}

/// Ordered read providers.
#[derive(Debug, Clone)]
pub struct ReadChain {
    providers: Vec<ReadProvider>,
}

impl ReadChain {
    pub fn new(providers: Vec<ReadProvider>) -> Self {
        Self { providers }
    }

    /// `[Api, Static]` against one server.
    pub fn remote(client: ApiClient) -> Self {
        Self::new(vec![
            ReadProvider::Api(client.clone()),
            ReadProvider::Static(client),
        ])
    }

    pub fn local(store: FileStore) -> Self {
        Self::new(vec![ReadProvider::Local(store)])
    }

    pub fn providers(&self) -> &[ReadProvider] {
        &self.providers
    }

    /// List lessons from the first provider able to.
    ///
    /// # Errors
    /// The last provider's error when none succeeds.
    pub async fn list_files(&self) -> Result<Vec<String>, AppError> {
        let mut last = no_providers();
        for provider in &self.providers {
            match provider.list_files().await {
                Ok(names) => return Ok(names),
                Err(err) if err.is_reachability() => {
                    tracing::debug!("{} listing unavailable: {}", provider.label(), err);
                    last = err;
                }
                Err(err) => return Err(err),
            }
        }
        Err(last)
    }

    /// Read one lesson from the first provider that has it.
    ///
    /// # Errors
    /// Invalid names and corrupt content stop the chain; otherwise the last
    /// provider's error when none succeeds.
    pub async fn read_file(&self, name: &str) -> Result<Vec<WordEntry>, AppError> {
        let mut last = no_providers();
        for provider in &self.providers {
            match provider.read_file(name).await {
                Ok(entries) => {
                    tracing::debug!("Read {} via {}", name, provider.label());
                    return Ok(entries);
                }
                Err(err) if read_falls_through(&err) => {
                    tracing::warn!(
                        "{} could not provide {}: {}; trying next provider",
                        provider.label(),
                        name,
                        err
                    );
                    last = err;
                }
                Err(err) => return Err(err),
            }
        }
        Err(last)
    }

    /// Read every named lesson in order, keeping per-lesson failures.
    pub async fn fetch(&self, names: &[String]) -> Vec<FileBatch> {
        let mut batches = Vec::with_capacity(names.len());
        for name in names {
            let batch = match self.read_file(name).await {
                Ok(entries) => FileBatch::loaded(name.as_str(), entries),
                Err(err) => FileBatch::failed(name.as_str(), err),
            };
            batches.push(batch);
        }
        batches
    }
}

/// Ordered write providers.
#[derive(Debug, Clone)]
pub struct WriteChain {
    providers: Vec<WriteProvider>,
}

impl WriteChain {
    pub fn new(providers: Vec<WriteProvider>) -> Self {
        Self { providers }
    }

    /// `[Api, Download]`: the server, then a local copy.
    pub fn remote(client: ApiClient, sink: DownloadSink) -> Self {
        Self::new(vec![WriteProvider::Api(client), WriteProvider::Download(sink)])
    }

    pub fn local(store: FileStore) -> Self {
        Self::new(vec![WriteProvider::Local(store)])
    }

    pub fn providers(&self) -> &[WriteProvider] {
        &self.providers
    }

    /// Write a complete lesson through the first reachable provider.
    ///
    /// # Errors
    /// The first non-reachability error, or the last error when every
    /// provider is unreachable.
    pub async fn save(&self, name: &str, entries: &[WordEntry]) -> Result<Saved, AppError> {
        let mut last = no_providers();
        for provider in &self.providers {
            match provider.save(name, entries).await {
                Ok(saved) => return Ok(saved),
                Err(err) if err.is_reachability() => {
                    tracing::warn!(
                        "{} could not save {}: {}; trying next provider",
                        provider.label(),
                        name,
                        err
                    );
                    last = err;
                }
                Err(err) => return Err(err),
            }
        }
        Err(last)
    }
}
