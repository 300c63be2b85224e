use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    /// A named input, config or output file could not be opened, read or
    /// created.
    File { path: PathBuf, source: io::Error },
    InvalidArgs(String),
    EmptySample,
}

impl Error {
    pub fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::File {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::File { path, source } => write!(f, "{}: {}", path.display(), source),
            Error::InvalidArgs(msg) => write!(f, "invalid arguments: {}", msg),
            Error::EmptySample => write!(f, "sample buffer must hold at least one word"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) | Error::File { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
