use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Span {
    /// Create a point span (start == end).
    pub fn point(line: usize, col: usize) -> Self {
        Span {
            line,
            col,
            end_line: line,
            end_col: col,
        }
    }

    /// Create a span from the start of `self` to an explicit end position.
    pub fn with_end(self, end_line: usize, end_col: usize) -> Span {
        Span {
            line: self.line,
            col: self.col,
            end_line,
            end_col,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum GalaxyError {
    #[error("Reader error at {span}: {message}")]
    Reader { message: String, span: Span },

    #[error("Malformed term: {0}")]
    Malformed(String),

    #[error("Type error: {operator} expected {expected}, got {got}")]
    Type {
        operator: String,
        expected: String,
        got: String,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Rewrite budget exceeded after {steps} steps")]
    BudgetExceeded { steps: usize },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{inner}")]
    WithContext {
        inner: Box<GalaxyError>,
        hint: Option<String>,
        note: Option<String>,
    },
}

impl GalaxyError {
    pub fn reader(message: impl Into<String>, span: Span) -> Self {
        GalaxyError::Reader {
            message: message.into(),
            span,
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        GalaxyError::Malformed(msg.into())
    }

    /// Build a type error, truncating long renderings of the offending term.
    pub fn type_error(
        operator: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
    ) -> Self {
        let got = got.into();
        let got = if got.chars().count() > 40 {
            let head: String = got.chars().take(39).collect();
            format!("{head}…")
        } else {
            got
        };
        GalaxyError::Type {
            operator: operator.into(),
            expected: expected.into(),
            got,
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        GalaxyError::Decode(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        GalaxyError::Transport(msg.into())
    }

    /// Attach a hint (actionable suggestion) to this error.
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        match self {
            GalaxyError::WithContext { inner, note, .. } => GalaxyError::WithContext {
                inner,
                hint: Some(hint.into()),
                note,
            },
            other => GalaxyError::WithContext {
                inner: Box::new(other),
                hint: Some(hint.into()),
                note: None,
            },
        }
    }

    /// Attach a note (extra context) to this error.
    pub fn with_note(self, note: impl Into<String>) -> Self {
        match self {
            GalaxyError::WithContext { inner, hint, .. } => GalaxyError::WithContext {
                inner,
                hint,
                note: Some(note.into()),
            },
            other => GalaxyError::WithContext {
                inner: Box::new(other),
                hint: None,
                note: Some(note.into()),
            },
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            GalaxyError::WithContext { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }

    pub fn note(&self) -> Option<&str> {
        match self {
            GalaxyError::WithContext { note, .. } => note.as_deref(),
            _ => None,
        }
    }

    pub fn inner(&self) -> &GalaxyError {
        match self {
            GalaxyError::WithContext { inner, .. } => inner.inner(),
            other => other,
        }
    }

    /// Fatal errors stop the interaction loop; a blown rewrite budget does not.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.inner(), GalaxyError::BudgetExceeded { .. })
    }
}

impl From<std::io::Error> for GalaxyError {
    fn from(e: std::io::Error) -> Self {
        GalaxyError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1. Span Display
    #[test]
    fn span_display() {
        let span = Span::point(1, 5);
        assert_eq!(span.to_string(), "1:5");
        assert_eq!(span.with_end(1, 9).end_col, 9);
    }

    // 2. Reader error carries its position
    #[test]
    fn reader_error_display() {
        let err = GalaxyError::reader("unexpected end of input", Span::point(3, 14));
        assert_eq!(
            err.to_string(),
            "Reader error at 3:14: unexpected end of input"
        );
    }

    // 3. Type error truncates long terms
    #[test]
    fn type_error_truncates() {
        let long = "ap ".repeat(30);
        let err = GalaxyError::type_error("add", "integer", long);
        match &err {
            GalaxyError::Type { got, .. } => {
                assert!(got.ends_with('…'));
                assert_eq!(got.chars().count(), 40);
            }
            other => panic!("expected Type, got {other:?}"),
        }
        assert!(err.to_string().starts_with("Type error: add expected integer"));
    }

    // 4. with_hint / with_note stack onto one context
    #[test]
    fn hint_and_note_compose() {
        let err = GalaxyError::decode("truncated bits")
            .with_hint("check the transport response")
            .with_note("while reading the peer reply");
        assert_eq!(err.hint(), Some("check the transport response"));
        assert_eq!(err.note(), Some("while reading the peer reply"));
        assert!(matches!(err.inner(), GalaxyError::Decode(_)));
        assert_eq!(err.to_string(), "Decode error: truncated bits");
    }

    // 5. Only a blown budget is non-fatal
    #[test]
    fn fatality() {
        assert!(!GalaxyError::BudgetExceeded { steps: 10 }.is_fatal());
        assert!(!GalaxyError::BudgetExceeded { steps: 10 }
            .with_note("simplify")
            .is_fatal());
        assert!(GalaxyError::malformed("x0").is_fatal());
        assert!(GalaxyError::transport("refused").is_fatal());
    }

    // 6. io::Error conversion
    #[test]
    fn from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "galaxy.txt");
        let err: GalaxyError = io.into();
        assert!(matches!(err, GalaxyError::Io(ref m) if m.contains("galaxy.txt")));
    }
}
