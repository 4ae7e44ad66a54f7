/// Broad failure category. Each kind maps to a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An input file does not exist or cannot be opened.
    FileNotFound,
    /// A required column is missing or ambiguous.
    Schema,
    /// A date or value could not be parsed.
    Parse,
    /// Detected interval starts/ends do not strictly alternate.
    Invariant,
    /// Writing the workbook, CSV tables or chart failed.
    Export,
    /// FRED download failed.
    Fetch,
    /// Terminal setup or drawing failed.
    Terminal,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::FileNotFound | ErrorKind::Schema | ErrorKind::Parse => 2,
            ErrorKind::Invariant => 3,
            ErrorKind::Export | ErrorKind::Fetch | ErrorKind::Terminal => 4,
        }
    }
}

#[derive(Clone, thiserror::Error)]
#[error("{message}")]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}
