use axmsg::AxError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("expects value for env MODE")]
    MissingMode,

    #[error("expects env MODE to be one of tick, produce, collect, consume or check, but got '{0}'")]
    UnknownMode(String),

    #[error("expects env SPEED, if MODE is tick")]
    MissingSpeed,

    #[error("expects env SPEED to be either untethered, fast, moderate or slow, but got '{0}'")]
    UnknownSpeed(String),

    #[error("expects env EXPECT to list processor names, if MODE is check")]
    MissingExpectations,

    #[error("expects exactly 1 {kind}, but got {count}")]
    StreamCount { kind: &'static str, count: usize },
}

/// Everything that ends a run with a fatal diagnostic.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Unexpected EOL listening for input")]
    UnexpectedEol { correlation_id: Option<u64> },

    #[error("Unexpected error on stream")]
    Stream {
        correlation_id: Option<u64>,
        #[source]
        source: AxError,
    },

    #[error(
        "Check failed, {discovered} processor(s) discovered, missing: {}",
        .missing.join(", ")
    )]
    Validation {
        request_id: u64,
        discovered: usize,
        missing: Vec<String>,
    },

    #[error("Check expected a reply with role 'check', but got '{role}'")]
    UnexpectedReply { request_id: u64, role: String },

    #[error("simulated date ran past the end of the calendar")]
    Calendar { correlation_id: u64 },
}

impl ProbeError {
    /// Classify a stream error: a clean close becomes [`ProbeError::UnexpectedEol`].
    pub fn from_stream(correlation_id: Option<u64>, source: AxError) -> Self {
        if source.is_end_of_stream() {
            ProbeError::UnexpectedEol { correlation_id }
        } else {
            ProbeError::Stream {
                correlation_id,
                source,
            }
        }
    }

    /// The id of the action this error concerns, if any.
    pub fn correlation_id(&self) -> Option<u64> {
        match self {
            ProbeError::Config(_) => None,
            ProbeError::UnexpectedEol { correlation_id }
            | ProbeError::Stream { correlation_id, .. } => *correlation_id,
            ProbeError::Validation { request_id, .. }
            | ProbeError::UnexpectedReply { request_id, .. } => Some(*request_id),
            ProbeError::Calendar { correlation_id } => Some(*correlation_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_missing_processors() {
        let err = ProbeError::Validation {
            request_id: 1,
            discovered: 1,
            missing: vec!["b".into(), "c".into()],
        };
        assert_eq!(
            err.to_string(),
            "Check failed, 1 processor(s) discovered, missing: b, c"
        );
        assert_eq!(err.correlation_id(), Some(1));
    }

    #[test]
    fn clean_close_is_unexpected_eol() {
        let err = ProbeError::from_stream(Some(4), AxError::EndOfStream);
        assert!(matches!(
            err,
            ProbeError::UnexpectedEol {
                correlation_id: Some(4)
            }
        ));
    }

    #[test]
    fn io_failure_stays_a_stream_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err = ProbeError::from_stream(None, AxError::Io(io));
        assert!(matches!(err, ProbeError::Stream { .. }));
        assert_eq!(err.correlation_id(), None);
    }
}
