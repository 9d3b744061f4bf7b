pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("count {requested} exceeds buffer length {available}")]
    OutOfRange { requested: usize, available: usize },

    #[error("invalid term range {start}..={end}: need 1 <= start <= end")]
    InvalidTermRange { start: u64, end: u64 },

    #[error("series sum overflowed u64")]
    Overflow,

    #[error("executor error: {0}")]
    Executor(String),

    #[error("worker panic: {0}")]
    WorkerPanic(String),

    #[error("collective error: {0}")]
    Collective(String),

    #[error("{what} mismatch: expected {expected}, got {actual}")]
    Validation {
        what: &'static str,
        expected: u64,
        actual: u64,
    },
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }

    pub fn collective<S: Into<String>>(msg: S) -> Self {
        Error::Collective(msg.into())
    }
}
