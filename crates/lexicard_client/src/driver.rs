//! Runs a [`Session`] against provider chains: performs loads and executes
//! the persist effects its mutations return.

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::provider::{DownloadSink, ReadChain, Saved, WriteChain};
use lexicard_core::constants::FALLBACK_LESSON_NAMES;
use lexicard_core::session::{
    Effect, LoadOutcome, LoadReport, LoadRequest, LoadedScope, Severity, SessionAction,
};
use lexicard_core::{AppError, FileStore, Session, SessionError};

/// Result of executing one persist effect.
#[derive(Debug)]
pub struct PersistReport {
    pub file: String,
    pub result: Result<Saved, AppError>,
}

/// Session plus the I/O needed to feed and persist it.
#[derive(Debug)]
pub struct SessionDriver {
    session: Session,
    reads: ReadChain,
    writes: WriteChain,
}

impl SessionDriver {
    pub fn new(session: Session, reads: ReadChain, writes: WriteChain) -> Self {
        Self {
            session,
            reads,
            writes,
        }
    }

    /// Build the chains described by `config`: a local directory when
    /// `data_dir` is set, otherwise the server with its static copy and a
    /// download sink.
    ///
    /// # Errors
    /// Returns an error for an unusable server URL or data directory.
    pub fn from_config(config: &ClientConfig) -> Result<Self, AppError> {
        let session = Session::new(config.persist_policy);
        if let Some(dir) = &config.data_dir {
            let store = FileStore::open(dir)?;
            return Ok(Self::new(
                session,
                ReadChain::local(store.clone()),
                WriteChain::local(store),
            ));
        }
        let client = ApiClient::new(&config.server, config.timeout)?;
        Ok(Self::new(
            session,
            ReadChain::remote(client.clone()),
            WriteChain::remote(client, DownloadSink::new(&config.download_dir)),
        ))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn reads(&self) -> &ReadChain {
        &self.reads
    }

    /// Lesson names from the read chain, or the built-in list when no
    /// provider can list them.
    pub async fn list_files(&mut self) -> Vec<String> {
        match self.reads.list_files().await {
            Ok(names) => names,
            Err(err) => {
                tracing::warn!("Lesson listing failed ({}); using built-in list", err);
                self.session.notify(
                    Severity::Warn,
                    "Using default lessons",
                    format!("Could not list lessons: {}", err),
                );
                FALLBACK_LESSON_NAMES
                    .iter()
                    .map(|name| name.to_string())
                    .collect()
            }
        }
    }

    /// Perform a load request (as produced by file selection).
    pub async fn load(&mut self, request: LoadRequest) -> LoadOutcome {
        match request {
            LoadRequest::Single(name) => self.load_single(&name).await,
            LoadRequest::Multiple(names) => self.load_multiple(&names).await,
            LoadRequest::All => self.load_all().await,
            LoadRequest::Clear => {
                self.session.clear();
                LoadOutcome::Applied(LoadReport::default())
            }
        }
    }

    pub async fn load_single(&mut self, name: &str) -> LoadOutcome {
        let ticket = self
            .session
            .begin_load(LoadedScope::SingleFile(name.to_string()));
        let batches = self.reads.fetch(&[name.to_string()]).await;
        self.session.finish_load(ticket, batches)
    }

    pub async fn load_multiple(&mut self, names: &[String]) -> LoadOutcome {
        let ticket = self
            .session
            .begin_load(LoadedScope::MultiFile(names.to_vec()));
        let batches = self.reads.fetch(names).await;
        self.session.finish_load(ticket, batches)
    }

    pub async fn load_all(&mut self) -> LoadOutcome {
        let ticket = self.session.begin_load(LoadedScope::AllFiles);
        let names = self.list_files().await;
        let batches = self.reads.fetch(&names).await;
        self.session.finish_load(ticket, batches)
    }

    /// Click a lesson in the picker; `extend` toggles it in the multi-selection.
    pub async fn select(&mut self, name: &str, extend: bool) -> LoadOutcome {
        let request = self.session.select_file(name, extend);
        self.load(request).await
    }

    /// Apply an action and execute the writes it requires.
    ///
    /// # Errors
    /// The session's rejection; nothing is written in that case.
    pub async fn run(&mut self, action: SessionAction) -> Result<Vec<PersistReport>, SessionError> {
        let effects = self.session.apply(action)?;
        Ok(self.execute(effects).await)
    }

    /// Write one lesson's current records on request.
    ///
    /// # Errors
    /// [`SessionError::Validation`] if the lesson is not loaded.
    pub async fn save_file(&mut self, file: &str) -> Result<PersistReport, SessionError> {
        let effect = self.session.persist_file(file)?;
        let mut reports = self.execute(vec![effect]).await;
        reports.pop().ok_or_else(|| {
            SessionError::Validation(format!("Nothing to save for '{}'", file))
        })
    }

    /// Execute persist effects in order, reporting each outcome as a notice.
    pub async fn execute(&mut self, effects: Vec<Effect>) -> Vec<PersistReport> {
        let mut reports = Vec::with_capacity(effects.len());
        for effect in effects {
            let Effect::Persist(batch) = effect;
            let (file, entries) = batch.into_parts();
            let result = self.writes.save(&file, &entries).await;
            match &result {
                Ok(Saved::Stored { provider }) => {
                    tracing::info!("Saved {} via {}", file, provider);
                    self.session
                        .notify(Severity::Success, "Saved", format!("{}.json updated", file));
                }
                Ok(Saved::Downloaded(path)) => {
                    tracing::warn!("Server unreachable; wrote {} to {}", file, path.display());
                    self.session.notify(
                        Severity::Warn,
                        "Server unreachable",
                        format!("Saved a copy of {} to {}", file, path.display()),
                    );
                }
                Err(err) => {
                    tracing::error!("Failed to save {}: {}", file, err);
                    self.session.mark_unsaved(&file);
                    self.session.notify(
                        Severity::Error,
                        "Save failed",
                        format!("{}: {}", file, err),
                    );
                }
            }
            reports.push(PersistReport { file, result });
        }
        reports
    }
}
