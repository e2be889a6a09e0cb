// doom_error.rs — engine error taxonomy

use thiserror::Error;

/// Errors surfaced by the engine core.
///
/// Everything except `DemoVersion` is a controlled abort: the run loop stops
/// and the process exits after the message has been printed.
#[derive(Debug, Error)]
pub enum DoomError {
    #[error("{0}")]
    Fatal(String),

    #[error("couldn't read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("W_GetNumForName: {0} not found!")]
    LumpNotFound(String),

    #[error("Demo is from a different game version! (expected {expected}, found {found})")]
    DemoVersion { expected: u8, found: u8 },
}

impl DoomError {
    /// True for errors that must terminate the run loop.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DoomError::DemoVersion { .. })
    }
}

pub type DoomResult<T> = Result<T, DoomError>;
