//! Error taxonomy for the translator. Every variant is fatal: a
//! mistranslated program is worse than no program, so there is no
//! skip-and-continue path anywhere.

/// Errors that can abort a translation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input could not be read or the output could not be written.
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The first token of a command matched no known keyword.
    #[error("unknown command: `{0}`")]
    UnknownCommand(String),

    /// A command keyword was recognized but its operands were missing,
    /// trailing, or failed to parse.
    #[error("malformed operands in `{line}`: {detail}")]
    MalformedOperand { line: String, detail: String },

    /// A command the classifier accepts but the generator does not
    /// implement (function/call/return).
    #[error("unsupported command: `{0}`")]
    Unsupported(String),
}

impl Error {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Error::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
