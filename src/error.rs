use thiserror::Error;

#[derive(Error, Debug)]
pub enum EntryError {
    #[error(transparent)]
    Common(#[from] pavement_entry_common::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("audit log error: {0}")]
    AuditLog(String),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("timed out after {seconds:.1}s waiting for {what}")]
    Timeout { what: String, seconds: f64 },

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("{action} failed after {attempts} attempt(s): {source}")]
    ActionFailed {
        action: String,
        attempts: u32,
        #[source]
        source: Box<EntryError>,
    },

    #[error("rejected by the application: {0}")]
    ValidationRejected(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CLI error: {0}")]
    CliExecution(String),
}

impl EntryError {
    /// Errors that end the whole run rather than the current row
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EntryError::Session(_)
                | EntryError::Config(_)
                | EntryError::FileNotFound(_)
                | EntryError::Spreadsheet(_)
                | EntryError::CliExecution(_)
        )
    }

    /// Wraps a setup failure as [`EntryError::Session`], keeping the message
    pub fn into_session(self, step: &str) -> EntryError {
        match self {
            EntryError::Session(_) => self,
            other => EntryError::Session(format!("{}: {}", step, other)),
        }
    }

    /// `true` for a fuzzy match with nothing to choose from
    pub fn is_no_candidates(&self) -> bool {
        match self {
            EntryError::Common(pavement_entry_common::Error::NoCandidates { .. }) => true,
            EntryError::ActionFailed { source, .. } => source.is_no_candidates(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, EntryError>;
