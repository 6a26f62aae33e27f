/// User-facing failures that map to a distinct exit status.
///
/// Anything not covered here travels as a plain [`color_eyre::Report`] and
/// exits with status 1.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("profile '{name}' not found")]
    NotFound { name: String },
    #[error("profile '{name}' already exists")]
    AlreadyExists { name: String },
    #[error("{0}")]
    Validation(String),
    #[error("template '{name}' not found (available: {available})")]
    UnknownTemplate { name: String, available: String },
    #[error("{program} exited with status {code}")]
    ChildExited { program: String, code: i32 },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::NotFound { .. }
            | AppError::AlreadyExists { .. }
            | AppError::Validation(_)
            | AppError::UnknownTemplate { .. } => 2,
            AppError::ChildExited { code, .. } => *code,
        }
    }
}
