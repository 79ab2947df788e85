//! Root crate facade for the Lexicard lesson server, client and session.

pub use lexicard_client::{
    api, driver, provider, ApiClient, ClientConfig, PersistReport, SessionDriver,
};
pub use lexicard_core::{
    constants, models, naming, session, store, AppError, Session, SessionError,
};
pub use lexicard_server::{
    create_app, error, handlers, serve_router, AppState, Config, EmbeddedServer, FileStore,
};
