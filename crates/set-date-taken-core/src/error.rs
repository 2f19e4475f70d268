use thiserror::Error;

/// Problems with the invocation itself, found before any file is touched.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// Wrong number of parameters or unparsable values
    #[error("{0}")]
    Usage(String),

    /// Neither `.` nor an existing folder
    #[error("Invalid pathname:\n\t{0}")]
    InvalidPath(String),

    #[error("Invalid date parameter(s) Year: {year}, Month: {month}, Day: {day}")]
    InvalidDate { year: i32, month: i32, day: i32 },
}

impl InvocationError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            InvocationError::Usage(_) => 3,
            InvocationError::InvalidPath(_) => 4,
            InvocationError::InvalidDate { .. } => 5,
        }
    }
}
