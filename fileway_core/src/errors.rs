use thiserror::Error;

/// Errors raised by the conduit subsystem.
///
/// These are returned as values, never panicked on; the server crate maps
/// each variant to an HTTP status code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConduitError {
    #[error("no conduit with id '{0}'")]
    NotFound(String),

    #[error("secret mismatch")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("id '{0}' already in use")]
    Conflict(String),

    #[error("conduit already downloading or downloaded")]
    Gone,

    #[error("upload timed out, conduit seems stuck")]
    UploadTimeout,
}
