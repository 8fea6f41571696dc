use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Syntax,
    Indentation,
    Reference,
    MergeType,
    Encoding,
    PatternEngine,
    DepthLimit,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Indentation => "indentation error",
            ErrorKind::Reference => "reference error",
            ErrorKind::MergeType => "merge type error",
            ErrorKind::Encoding => "encoding error",
            ErrorKind::PatternEngine => "pattern engine error",
            ErrorKind::DepthLimit => "depth limit error",
        };
        f.write_str(name)
    }
}

/// Every variant carries the 1-based absolute line number and the text of
/// the offending line.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("{reason} at line {line} ({snippet})")]
    Syntax {
        line: usize,
        snippet: String,
        reason: String,
    },
    #[error("indentation problem at line {line} ({snippet}): {message}")]
    Indentation {
        line: usize,
        snippet: String,
        message: String,
    },
    #[error("reference \"{name}\" does not exist at line {line} ({snippet})")]
    Reference {
        line: usize,
        snippet: String,
        name: String,
    },
    #[error("merge key used with a {found} instead of a mapping at line {line} ({snippet})")]
    MergeType {
        line: usize,
        snippet: String,
        found: &'static str,
    },
    #[error("input is not valid UTF-8 at line {line} ({snippet})")]
    Encoding { line: usize, snippet: String },
    #[error("line classification failed at line {line}: {message}")]
    PatternEngine {
        line: usize,
        snippet: String,
        message: String,
    },
    #[error("nesting exceeds {limit} levels at line {line} ({snippet})")]
    DepthLimit {
        line: usize,
        snippet: String,
        limit: usize,
    },
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Syntax { .. } => ErrorKind::Syntax,
            ParseError::Indentation { .. } => ErrorKind::Indentation,
            ParseError::Reference { .. } => ErrorKind::Reference,
            ParseError::MergeType { .. } => ErrorKind::MergeType,
            ParseError::Encoding { .. } => ErrorKind::Encoding,
            ParseError::PatternEngine { .. } => ErrorKind::PatternEngine,
            ParseError::DepthLimit { .. } => ErrorKind::DepthLimit,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            ParseError::Syntax { line, .. }
            | ParseError::Indentation { line, .. }
            | ParseError::Reference { line, .. }
            | ParseError::MergeType { line, .. }
            | ParseError::Encoding { line, .. }
            | ParseError::PatternEngine { line, .. }
            | ParseError::DepthLimit { line, .. } => *line,
        }
    }

    pub fn snippet(&self) -> &str {
        match self {
            ParseError::Syntax { snippet, .. }
            | ParseError::Indentation { snippet, .. }
            | ParseError::Reference { snippet, .. }
            | ParseError::MergeType { snippet, .. }
            | ParseError::Encoding { snippet, .. }
            | ParseError::PatternEngine { snippet, .. }
            | ParseError::DepthLimit { snippet, .. } => snippet,
        }
    }
}

/// Builds an [`ParseError::Encoding`] pointing at the line holding the first
/// invalid byte.
pub(crate) fn encoding_error(input: &[u8], err: std::str::Utf8Error) -> ParseError {
    let valid = &input[..err.valid_up_to()];
    let line = valid.iter().filter(|b| **b == b'\n').count() + 1;
    let start = valid
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |pos| pos + 1);
    let end = input[start..]
        .iter()
        .position(|b| *b == b'\n')
        .map_or(input.len(), |pos| start + pos);
    ParseError::Encoding {
        line,
        snippet: String::from_utf8_lossy(&input[start..end]).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_error_reports_line_of_bad_byte() {
        let input = b"a: 1\nb: \xff\xfe\nc: 3\n";
        let err = std::str::from_utf8(input).expect_err("input is invalid");
        let err = encoding_error(input, err);

        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert_eq!(err.line(), 2);
        assert!(err.snippet().starts_with("b: "));
    }

    #[test]
    fn display_names_line_and_text() {
        let err = ParseError::Reference {
            line: 4,
            snippet: "- *missing".to_string(),
            name: "missing".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "reference \"missing\" does not exist at line 4 (- *missing)"
        );
    }
}
