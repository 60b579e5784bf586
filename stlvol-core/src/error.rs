/// Errors produced while reading a mesh or interpreting estimate options.
///
/// Running out of bytes in the middle of the facet section is deliberately
/// not represented here: the reader treats it as the end of the mesh.
#[derive(Debug, thiserror::Error)]
pub enum StlError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown {kind} '{value}'")]
    UnknownOption { kind: &'static str, value: String },
}

impl StlError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn unknown(kind: &'static str, value: &str) -> Self {
        Self::UnknownOption {
            kind,
            value: value.to_string(),
        }
    }

    /// True when the underlying cause is the stream ending early.
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}
