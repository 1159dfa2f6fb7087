use thiserror::Error;

#[derive(Debug, Error)]
pub enum AxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("end of stream")]
    EndOfStream,

    #[error("Failed to parse envelope: {source}\n  line: {line}")]
    Malformed {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("payload of role '{role}' cannot be read as '{requested}'")]
    RoleMismatch {
        role: String,
        requested: &'static str,
    },

    #[error("Failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),
}

impl AxError {
    pub(crate) fn malformed(bytes: &[u8], source: serde_json::Error) -> Self {
        AxError::Malformed {
            line: String::from_utf8_lossy(bytes).into_owned(),
            source,
        }
    }

    /// `true` for a clean close of the input with no pending record.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, AxError::EndOfStream)
    }
}
