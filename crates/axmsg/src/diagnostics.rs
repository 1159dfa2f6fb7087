use std::fmt;

/// Exit status used by [`Diagnostics::fatal`].
pub const FATAL_EXIT_CODE: i32 = 1;

/// One log message as it appears on stderr: `source[#id]: message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic<'a> {
    pub source: &'a str,
    pub correlation_id: Option<u64>,
    pub message: String,
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.correlation_id {
            Some(id) => write!(f, "{}[#{}]: {}", self.source, id, self.message),
            None => write!(f, "{}: {}", self.source, self.message),
        }
    }
}

/// Structured log sink for a pipeline node.
///
/// Events go through `tracing` with `source` and `correlation_id` fields, so
/// the installed subscriber decides format and destination. Nodes must install
/// one writing to stderr: stdout is usually a data pipe.
#[derive(Debug, Clone, Copy)]
pub struct Diagnostics {
    source: &'static str,
}

impl Diagnostics {
    pub const fn new(source: &'static str) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    pub fn diagnostic(
        &self,
        correlation_id: Option<u64>,
        message: impl fmt::Display,
    ) -> Diagnostic<'static> {
        Diagnostic {
            source: self.source,
            correlation_id,
            message: message.to_string(),
        }
    }

    pub fn info(&self, correlation_id: Option<u64>, message: impl fmt::Display) {
        let diagnostic = self.diagnostic(correlation_id, message);
        tracing::info!(source = self.source, correlation_id, "{diagnostic}");
    }

    /// Report a problem the node can continue past.
    pub fn log(&self, correlation_id: Option<u64>, message: impl fmt::Display) {
        let diagnostic = self.diagnostic(correlation_id, message);
        tracing::warn!(source = self.source, correlation_id, "{diagnostic}");
    }

    /// Report an unrecoverable violation and terminate the process.
    pub fn fatal(&self, correlation_id: Option<u64>, message: impl fmt::Display) -> ! {
        let diagnostic = self.diagnostic(correlation_id, message);
        tracing::error!(source = self.source, correlation_id, "{diagnostic}");
        std::process::exit(FATAL_EXIT_CODE)
    }
}
