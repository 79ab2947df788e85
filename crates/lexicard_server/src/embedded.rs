//! Embedded server helper for running the lesson API inside another process.

use crate::{resolve_bind_address, serve_router, AppError, AppState};
use std::{
    net::SocketAddr,
    sync::mpsc,
    thread::{self, JoinHandle},
};
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Handle to an embedded API server running on a background thread.
pub struct EmbeddedServer {
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
    addr: SocketAddr,
    used_fallback: bool,
}

impl EmbeddedServer {
    /// Start the API server on a background thread.
    ///
    /// The server binds to `BIND` or `127.0.0.1:PORT` from `Config`. If the
    /// requested address is in use, it will fall back to an auto-assigned port.
    /// A configured port of `0` always picks a free port.
    ///
    /// # Arguments
    /// - `state`: Shared application state (config, store).
    /// - `allow_public`: Whether to allow cross-origin requests from any origin.
    ///
    /// # Returns
    /// A running [`EmbeddedServer`] with the bound address.
    ///
    /// # Errors
    /// Returns an error if the runtime or server socket cannot be created.
    pub fn start(state: AppState, allow_public: bool) -> Result<Self, AppError> {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread = thread::Builder::new()
            .name("lexicard-embedded-server".into())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_multi_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(err) => {
                        let _ = ready_tx.send(Err(format!("failed to start runtime: {}", err)));
                        return;
                    }
                };

                let bind_addr = resolve_bind_address(&state.config, allow_public);
                let mut used_fallback = false;
                let listener = match rt.block_on(tokio::net::TcpListener::bind(bind_addr)) {
                    Ok(listener) => listener,
                    Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                        warn!(
                            "API bind address {} is in use; falling back to an auto port",
                            bind_addr
                        );
                        used_fallback = true;
                        let fallback_addr = SocketAddr::new(bind_addr.ip(), 0);
                        match rt.block_on(tokio::net::TcpListener::bind(fallback_addr)) {
                            Ok(listener) => listener,
                            Err(fallback_err) => {
                                let _ = ready_tx.send(Err(format!(
                                    "failed to bind server socket: {}",
                                    fallback_err
                                )));
                                return;
                            }
                        }
                    }
                    Err(err) => {
                        let _ =
                            ready_tx.send(Err(format!("failed to bind server socket: {}", err)));
                        return;
                    }
                };

                let actual_addr = listener.local_addr().unwrap_or(bind_addr);
                if used_fallback {
                    warn!(
                        "API listening on http://{} (auto port; {} was in use)",
                        actual_addr, bind_addr
                    );
                } else {
                    info!("API listening on http://{}", actual_addr);
                }
                let _ = ready_tx.send(Ok((actual_addr, used_fallback)));

                let shutdown = async {
                    let _ = shutdown_rx.await;
                };

                if let Err(err) = rt.block_on(serve_router(listener, state, allow_public, shutdown))
                {
                    warn!("server error: {}", err);
                }
            })
            .map_err(|err| {
                AppError::StorageUnavailable(format!("failed to spawn server: {}", err))
            })?;

        let mut thread_handle = Some(thread);

        let failure = match ready_rx.recv() {
            Ok(Ok((addr, used_fallback))) => {
                if !addr.ip().is_loopback() {
                    warn!("binding to non-localhost address {}", addr);
                }
                return Ok(Self {
                    shutdown: Some(shutdown_tx),
                    thread: thread_handle.take(),
                    addr,
                    used_fallback,
                });
            }
            Ok(Err(message)) => message,
            Err(_) => "server thread exited before binding".to_string(),
        };

        let _ = shutdown_tx.send(());
        if let Some(handle) = thread_handle.take() {
            let _ = handle.join();
        }
        Err(AppError::StorageUnavailable(failure))
    }

    /// Address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL for clients, e.g. `http://127.0.0.1:40123`.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Whether the server had to fall back to an auto-assigned port.
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }
}

impl Drop for EmbeddedServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
