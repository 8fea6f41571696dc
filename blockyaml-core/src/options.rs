/// Limits applied to a single top-level parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Maximum number of nested blocks (child parsers) below the document.
    pub max_depth: usize,
    /// Longest line, in bytes, handed to line classification.
    pub max_line_length: usize,
    /// Compiled size limit for the line-shape patterns.
    pub pattern_size_limit: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_line_length: 64 * 1024,
            pattern_size_limit: 10 * (1 << 20),
        }
    }
}

impl ParserOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    pub fn with_pattern_size_limit(mut self, pattern_size_limit: usize) -> Self {
        self.pattern_size_limit = pattern_size_limit;
        self
    }
}
