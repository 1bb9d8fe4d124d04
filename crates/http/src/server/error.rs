use std::io;

use thiserror::Error;
use tokio::task::JoinError;

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("address must be set")]
    MissingAddress,

    #[error("invalid address: {source}")]
    InvalidAddress {
        #[from]
        source: io::Error,
    },

    #[error("initial buffer size must be greater than zero")]
    InvalidBufferSize,
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("build server error: {source}")]
    Build {
        #[from]
        source: ServerBuildError,
    },

    #[error("bind server error: {source}")]
    Bind { source: io::Error },

    #[error("accept error: {source}")]
    Accept { source: io::Error },

    #[error("accept loop panicked or was aborted: {source}")]
    Join {
        #[from]
        source: JoinError,
    },
}

impl ServerError {
    pub fn bind<E: Into<io::Error>>(e: E) -> Self {
        Self::Bind { source: e.into() }
    }

    pub fn accept<E: Into<io::Error>>(e: E) -> Self {
        Self::Accept { source: e.into() }
    }
}
