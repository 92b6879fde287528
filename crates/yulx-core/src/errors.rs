use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{file}:{line}:{column}: {message}\n{snippet}")]
    Parse {
        file: String,
        line: usize,
        column: usize,
        message: String,
        /// Offending source line plus a caret line pointing at the column.
        snippet: String,
    },

    #[error("version error: {0}")]
    Version(String),

    #[error("resolution error: {0}")]
    Resolution(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("static abort: {0}")]
    StaticAbort(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stamp a resolution/type message with the `file:line` a parser-originated
    /// node carries. No-op when the node had no stamp.
    pub fn at(self, file: &str, line: u32) -> Self {
        if file.is_empty() {
            return self;
        }
        match self {
            Error::Resolution(m) => Error::Resolution(format!("{}:{}: {}", file, line, m)),
            Error::Type(m) => Error::Type(format!("{}:{}: {}", file, line, m)),
            Error::StaticAbort(m) => Error::StaticAbort(format!("{}:{}: {}", file, line, m)),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
