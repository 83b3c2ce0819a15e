//! Process-level error type.
//!
//! Exit codes:
//! - 2: configuration or input problems (bad flags, malformed CSV schema)
//! - 3: insufficient data (empty pools, no usable trials)
//! - 4: computation failures (degenerate distributions, mismatched bins)

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    /// Prefix the message with call-site context, keeping the exit code.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self {
            exit_code: self.exit_code,
            message: format!("{}: {}", context.into(), self.message),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
