//! Block-structure YAML parser.
//!
//! Indented sequences and mappings, folded and literal scalars, anchors,
//! aliases and `<<` merges are handled here; single-line values go to an
//! [`InlineParser`], [`FlowParser`] by default.

mod block;
mod error;
mod folded;
pub mod inline;
mod lines;
mod options;
mod refs;
mod shapes;
mod value;

use log::debug;

use crate::block::{parse_document, Session};
use crate::refs::RefTable;
use crate::shapes::LineShapes;

pub use crate::error::{ErrorKind, ParseError};
pub use crate::inline::{FlowParser, InlineError, InlineParser};
pub use crate::options::ParserOptions;
pub use crate::value::YamlValue;
pub use indexmap::IndexMap;

/// A configured parser. Each call to [`Parser::parse`] starts with an empty
/// anchor table.
pub struct Parser {
    options: ParserOptions,
    inline: Box<dyn InlineParser>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

impl Parser {
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            inline: Box::new(FlowParser),
        }
    }

    /// Replaces the single-line value parser.
    pub fn with_inline(mut self, inline: impl InlineParser + 'static) -> Self {
        self.inline = Box::new(inline);
        self
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn parse(&self, input: &str) -> Result<YamlValue, ParseError> {
        let shapes = LineShapes::compile(&self.options).map_err(|err| ParseError::PatternEngine {
            line: 1,
            snippet: input.lines().next().unwrap_or_default().to_string(),
            message: err.to_string(),
        })?;
        let session = Session {
            options: &self.options,
            shapes,
            inline: self.inline.as_ref(),
        };
        let refs = RefTable::new();

        debug!("parsing document of {} bytes", input.len());
        let value = parse_document(&session, &refs, input, 0, 0)?;
        debug!(
            "parsed {} value with {} anchors bound",
            value.type_name(),
            refs.len()
        );
        Ok(value)
    }

    /// Parses raw bytes, which must be UTF-8.
    pub fn parse_bytes(&self, input: &[u8]) -> Result<YamlValue, ParseError> {
        let text = std::str::from_utf8(input).map_err(|err| error::encoding_error(input, err))?;
        self.parse(text)
    }
}

/// Parses `input` with default options.
pub fn parse(input: &str) -> Result<YamlValue, ParseError> {
    Parser::default().parse(input)
}

pub fn parse_with(input: &str, options: ParserOptions) -> Result<YamlValue, ParseError> {
    Parser::new(options).parse(input)
}

pub fn parse_bytes(input: &[u8]) -> Result<YamlValue, ParseError> {
    Parser::default().parse_bytes(input)
}
