use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Input validation errors
    #[error("Invalid scan UID: {0}")]
    InvalidScanUid(String),

    #[error("Invalid member id: {0}")]
    InvalidMemberId(String),

    // Remote collaborator errors
    #[error("Directory lookup failed: {0}")]
    Directory(String),

    #[error("Settings fetch failed: {0}")]
    Settings(String),

    // Lifecycle errors
    #[error("Component already shut down: {0}")]
    ShutDown(String),

    // IO errors, for directory/settings implementors backed by sockets or files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
