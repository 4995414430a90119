use std::fmt;

pub type StatsApiResult<T> = Result<T, StatsApiError>;

/// Errors that can stop the stats API server itself.
#[derive(Debug)]
pub enum StatsApiError {
    /// I/O-related error.
    Io(std::io::Error),
    /// `start` was called while the server is already running.
    AlreadyRunning,
    /// Configuration error.
    Configuration(String),
}

impl fmt::Display for StatsApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use StatsApiError::*;
        match self {
            Io(e) => write!(f, "I/O error: `{e:?}`"),
            AlreadyRunning => write!(f, "Stats API server already running"),
            Configuration(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl From<std::io::Error> for StatsApiError {
    fn from(e: std::io::Error) -> StatsApiError {
        StatsApiError::Io(e)
    }
}

/// Errors raised while assembling a single statistics response.
///
/// None of these abort the server; the HTTP layer converts each into a
/// JSON error body.
#[derive(Debug)]
pub enum StatsError {
    /// No user file matches the requested address.
    UserNotFound { address: String },
    /// The user file exceeds the per-file size limit.
    UserFileTooLarge { address: String, size: u64 },
    /// The assembled body would exceed the response size cap.
    ResponseTooLarge,
    /// I/O-related error.
    Io(std::io::Error),
}

impl fmt::Display for StatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use StatsError::*;
        match self {
            UserNotFound { address } => write!(f, "User not found: {address}"),
            UserFileTooLarge { address, size } => {
                write!(f, "User file too large for {address}: {size} bytes")
            }
            ResponseTooLarge => write!(f, "Response exceeds the maximum size"),
            Io(e) => write!(f, "I/O error: `{e:?}`"),
        }
    }
}

impl From<std::io::Error> for StatsError {
    fn from(e: std::io::Error) -> StatsError {
        StatsError::Io(e)
    }
}
