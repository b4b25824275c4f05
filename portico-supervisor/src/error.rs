use std::path::PathBuf;

use thiserror::Error;

/// An external command could not be started or did not succeed.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}", describe_exit(.code))]
    Exit { command: String, code: Option<i32> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Nothing accepted connections on `host:port` within the allowed attempts.
#[derive(Debug, Error)]
#[error("port {host}:{port} not reachable after {attempts} attempts")]
pub struct TimeoutError {
    pub host: String,
    pub port: u16,
    pub attempts: u32,
}

/// Error surface for orchestration and the supervised runtime.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Store(#[from] portico_core::StoreError),

    #[error(transparent)]
    Render(#[from] portico_renderer::RenderError),

    #[error(transparent)]
    Sync(#[from] portico_sync::SyncError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{task} task join failure: {reason}")]
    Join { task: &'static str, reason: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SupervisorError {
    SupervisorError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn join_err(task: &'static str, err: tokio::task::JoinError) -> SupervisorError {
    SupervisorError::Join {
        task,
        reason: err.to_string(),
    }
}
