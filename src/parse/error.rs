use std::fmt;

/// Errors produced when parsing script input. Positions are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    line: usize,
    column: usize,
    message: String,
}

impl ParseError {
    pub(crate) fn at_offset(input: &str, offset: usize, message: impl Into<String>) -> Self {
        let offset = offset.min(input.len());
        let before = &input[..offset];
        let line = before.matches('\n').count() + 1;
        let column = offset - before.rfind('\n').map_or(0, |i| i + 1) + 1;
        Self {
            line,
            column,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parse error at line {}, column {}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_to_position() {
        let input = "query {\n  bogus\n}";
        let err = ParseError::at_offset(input, input.find("bogus").unwrap(), "unexpected");
        assert_eq!(err.line(), 2);
        assert_eq!(err.column(), 3);
    }

    #[test]
    fn offset_at_start() {
        let err = ParseError::at_offset("x", 0, "unexpected");
        assert_eq!((err.line(), err.column()), (1, 1));
    }

    #[test]
    fn error_display() {
        let err = ParseError::at_offset("ab\ncd", 4, "unexpected token");
        assert_eq!(
            err.to_string(),
            "parse error at line 2, column 2: unexpected token"
        );
    }
}
