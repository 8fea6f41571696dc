use std::mem;

use indexmap::IndexMap;
use log::debug;
use tailcall::trampoline::{self, Next};

use crate::error::ParseError;
use crate::folded::read_block_scalar;
use crate::inline::{InlineError, InlineParser};
use crate::lines::{indentation_of, preprocess, LineCursor};
use crate::options::ParserOptions;
use crate::refs::RefTable;
use crate::shapes::{LineShape, LineShapes};
use crate::value::YamlValue;

const MERGE_KEY: &str = "<<";

/// Everything that stays fixed for one top-level parse.
pub(crate) struct Session<'s> {
    pub options: &'s ParserOptions,
    pub shapes: LineShapes,
    pub inline: &'s dyn InlineParser,
}

/// Parses `text` as one document. `offset` is the number of lines above
/// `text` in the top-level input; `depth` counts enclosing blocks.
pub(crate) fn parse_document(
    session: &Session<'_>,
    refs: &RefTable,
    text: &str,
    offset: usize,
    depth: usize,
) -> Result<YamlValue, ParseError> {
    let prepared = preprocess(text);
    let parser = BlockParser {
        session,
        refs: refs.clone(),
        cursor: LineCursor::new(&prepared.text, offset + prepared.offset),
        depth,
        block: Block::Empty,
    };
    trampoline::run(BlockParser::step, parser)
}

#[derive(Debug, Default)]
enum Block {
    #[default]
    Empty,
    Seq(Vec<YamlValue>),
    Map(IndexMap<String, YamlValue>),
}

impl Block {
    fn into_value(self) -> YamlValue {
        match self {
            Block::Empty => YamlValue::Null,
            Block::Seq(items) => YamlValue::Seq(items),
            Block::Map(map) => YamlValue::Map(map),
        }
    }
}

struct BlockParser<'s, 't> {
    session: &'s Session<'s>,
    refs: RefTable,
    cursor: LineCursor<'t>,
    depth: usize,
    block: Block,
}

impl<'s, 't> BlockParser<'s, 't> {
    fn step(mut self) -> Next<Self, Result<YamlValue, ParseError>> {
        match self.parse_line() {
            Ok(Some(value)) => Next::Finish(Ok(value)),
            Ok(None) => Next::Recurse(self),
            Err(err) => Next::Finish(Err(err)),
        }
    }

    /// Handles the next line; returns the document once input runs out.
    fn parse_line(&mut self) -> Result<Option<YamlValue>, ParseError> {
        if !self.cursor.advance() {
            return Ok(Some(mem::take(&mut self.block).into_value()));
        }
        if self.cursor.is_empty() {
            return Ok(None);
        }

        let line = self.cursor.current();
        if line.trim_start_matches(' ').starts_with('\t') {
            return Err(self.indentation_error("tabs cannot be used for indentation"));
        }
        let limit = self.session.options.max_line_length;
        if line.len() > limit {
            return Err(ParseError::PatternEngine {
                line: self.cursor.absolute_line(),
                snippet: line.chars().take(80).collect(),
                message: format!("line is {} bytes, limit is {limit}", line.len()),
            });
        }

        match self.session.shapes.classify(line) {
            LineShape::SequenceItem {
                value,
                single_space,
            } => self.parse_sequence_item(value, single_space)?,
            LineShape::MappingEntry { key, value } => self.parse_mapping_entry(key, value)?,
            LineShape::Unmatched => return self.parse_single_line_document().map(Some),
        }
        Ok(None)
    }

    fn parse_sequence_item(
        &mut self,
        value: Option<&'t str>,
        single_space: bool,
    ) -> Result<(), ParseError> {
        let (anchor, value) = self.split_anchor(value);
        let item = match value.filter(|v| !is_empty_value(v)) {
            Some(value) if single_space && self.session.shapes.is_compact_entry(value) => {
                self.parse_compact_mapping(value)?
            }
            Some(value) => self.parse_value(value)?,
            None => self.parse_embedded_block()?,
        };
        self.bind_anchor(anchor, &item);

        match mem::take(&mut self.block) {
            Block::Empty => self.block = Block::Seq(vec![item]),
            Block::Seq(mut items) => {
                items.push(item);
                self.block = Block::Seq(items);
            }
            Block::Map(_) => return Err(self.syntax_error("mixed sequence and mapping entries")),
        }
        Ok(())
    }

    fn parse_mapping_entry(&mut self, key: &'t str, value: Option<&'t str>) -> Result<(), ParseError> {
        let key = self
            .session
            .inline
            .parse_scalar(key)
            .map_err(|err| self.inline_error(err))?;

        if key == MERGE_KEY {
            let merged = self.resolve_merge(value)?;
            self.block = Block::Map(merged);
            return Ok(());
        }

        let (anchor, value) = self.split_anchor(value);
        let entry = if let Some(value) = value.filter(|v| !is_empty_value(v)) {
            self.parse_value(value)?
        } else if self.next_line_is_nested() {
            self.parse_embedded_block()?
        } else {
            YamlValue::Null
        };
        self.bind_anchor(anchor, &entry);

        let mut map = match mem::take(&mut self.block) {
            Block::Empty => IndexMap::new(),
            Block::Map(map) => map,
            Block::Seq(_) => return Err(self.syntax_error("mixed sequence and mapping entries")),
        };
        // A repeated key moves to the end with its new value.
        map.shift_remove(&key);
        map.insert(key, entry);
        self.block = Block::Map(map);
        Ok(())
    }

    /// `- key: value` opens a mapping whose further entries sit two columns
    /// right of the dash.
    fn parse_compact_mapping(&mut self, value: &str) -> Result<YamlValue, ParseError> {
        let offset = self.cursor.absolute_line() - 1;
        let start = self.cursor.position();
        let indentation = self.cursor.indentation();

        let mut block = value.to_string();
        if self.next_line_is_nested() {
            for _ in start..self.cursor.position() {
                block.push('\n');
            }
            block.push('\n');
            block.push_str(&self.next_embedded_block(Some(indentation + 2))?);
        }
        self.parse_child(&block, offset)
    }

    fn parse_embedded_block(&mut self) -> Result<YamlValue, ParseError> {
        let offset = self.cursor.absolute_line();
        let block = self.next_embedded_block(None)?;
        self.parse_child(&block, offset)
    }

    fn parse_child(&self, text: &str, offset: usize) -> Result<YamlValue, ParseError> {
        let depth = self.depth + 1;
        let limit = self.session.options.max_depth;
        if depth > limit {
            return Err(ParseError::DepthLimit {
                line: self.cursor.absolute_line(),
                snippet: self.cursor.current().to_string(),
                limit,
            });
        }
        debug!("parsing nested block at depth {depth} (line offset {offset})");
        parse_document(self.session, &self.refs, text, offset, depth)
    }

    fn parse_value(&mut self, value: &str) -> Result<YamlValue, ParseError> {
        if value.starts_with('*') {
            return self.resolve_alias(value);
        }
        if let Some(header) = self.session.shapes.block_scalar_header(value) {
            return Ok(YamlValue::Str(read_block_scalar(&mut self.cursor, &header)));
        }
        self.session
            .inline
            .load(value)
            .map_err(|err| self.inline_error(err))
    }

    /// A line that is neither a sequence item nor a mapping entry is only
    /// valid as the whole document.
    fn parse_single_line_document(&self) -> Result<YamlValue, ParseError> {
        let single_line = self.cursor.line_count() == 2 && self.cursor.line(1) == Some("");
        if !single_line {
            return Err(self.syntax_error("unable to parse"));
        }
        let value = self
            .session
            .inline
            .load(self.cursor.current())
            .map_err(|err| self.inline_error(err))?;

        // `[*a, *b]` is a sequence of aliases.
        match value {
            YamlValue::Seq(items)
                if items
                    .first()
                    .and_then(YamlValue::as_str)
                    .is_some_and(|first| first.starts_with('*')) =>
            {
                items
                    .iter()
                    .map(|item| {
                        let alias = item.as_str().unwrap_or_default();
                        self.lookup_alias(alias.strip_prefix('*').unwrap_or(alias))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(YamlValue::Seq)
            }
            other => Ok(other),
        }
    }

    /// Collects the lines of a nested block, re-indented to column 0.
    ///
    /// With `indentation` unset the baseline is taken from the next content
    /// line. Blank lines are kept as empty entries so line numbers stay
    /// aligned; the first line back at column 0 is pushed back.
    fn next_embedded_block(&mut self, indentation: Option<usize>) -> Result<String, ParseError> {
        let mut leading: Vec<&'t str> = Vec::new();
        let baseline = match indentation {
            Some(baseline) => {
                if !self.cursor.advance() {
                    return Ok(String::new());
                }
                if !self.cursor.is_empty() && self.cursor.indentation() < baseline {
                    return Err(self.indentation_error("inconsistent indentation"));
                }
                baseline
            }
            None => loop {
                if !self.cursor.advance() {
                    return Ok(vec![""; leading.len()].join("\n"));
                }
                if !self.cursor.is_empty() {
                    break self.cursor.indentation();
                }
                leading.push(self.cursor.current());
            },
        };
        if baseline == 0 {
            return Err(self.indentation_error("expected an indented block"));
        }
        let mut block: Vec<&'t str> = leading
            .into_iter()
            .map(|line| strip_baseline(line, baseline))
            .collect();
        block.push(strip_baseline(self.cursor.current(), baseline));

        while self.cursor.advance() {
            if self.cursor.is_empty() {
                block.push(strip_baseline(self.cursor.current(), baseline));
                continue;
            }
            let indent = self.cursor.indentation();
            if indent >= baseline {
                block.push(strip_baseline(self.cursor.current(), baseline));
            } else if indent == 0 {
                self.cursor.retreat();
                break;
            } else {
                return Err(self.indentation_error("inconsistent indentation"));
            }
        }
        Ok(block.join("\n"))
    }

    /// Whether the next content line is indented deeper than the current
    /// one. Leaves the cursor just before that content line.
    fn next_line_is_nested(&mut self) -> bool {
        let current = self.cursor.indentation();
        let mut available = self.cursor.advance();
        while available && self.cursor.is_empty() {
            available = self.cursor.advance();
        }
        if !available {
            return false;
        }
        let nested = self.cursor.indentation() > current;
        self.cursor.retreat();
        nested
    }

    fn resolve_merge(&mut self, value: Option<&'t str>) -> Result<IndexMap<String, YamlValue>, ParseError> {
        // A nested source moves the cursor past its block.
        let line = self.cursor.absolute_line();
        let snippet = self.cursor.current();
        let source = match value.filter(|v| !is_empty_value(v)) {
            Some(value) if value.starts_with('*') => self.resolve_alias(value)?,
            Some(value) => {
                let offset = self.cursor.absolute_line() - 1;
                self.parse_child(value, offset)?
            }
            None => self.parse_embedded_block()?,
        };

        match source {
            YamlValue::Map(map) => Ok(map),
            // Walk backwards so the first mapping in the list wins.
            YamlValue::Seq(items) => items
                .into_iter()
                .rev()
                .try_fold(IndexMap::new(), |merged, item| match item {
                    YamlValue::Map(map) => Ok(overlay(map, merged)),
                    other => Err(merge_type_error(line, snippet, &other)),
                }),
            other => Err(merge_type_error(line, snippet, &other)),
        }
    }

    fn resolve_alias(&self, value: &str) -> Result<YamlValue, ParseError> {
        let name = &value[1..];
        let name = name.find(" #").map_or(name, |pos| &name[..pos]);
        self.lookup_alias(name.trim())
    }

    fn lookup_alias(&self, name: &str) -> Result<YamlValue, ParseError> {
        self.refs.resolve(name).ok_or_else(|| ParseError::Reference {
            line: self.cursor.absolute_line(),
            snippet: self.cursor.current().to_string(),
            name: name.to_string(),
        })
    }

    fn split_anchor(&self, value: Option<&'t str>) -> (Option<&'t str>, Option<&'t str>) {
        match value.and_then(|v| self.session.shapes.split_anchor(v)) {
            Some((name, rest)) => (Some(name), Some(rest)),
            None => (None, value),
        }
    }

    fn bind_anchor(&self, anchor: Option<&str>, value: &YamlValue) {
        if let Some(name) = anchor {
            self.refs.bind(name, value.clone());
        }
    }

    fn syntax_error(&self, reason: &str) -> ParseError {
        ParseError::Syntax {
            line: self.cursor.absolute_line(),
            snippet: self.cursor.current().to_string(),
            reason: reason.to_string(),
        }
    }

    fn inline_error(&self, err: InlineError) -> ParseError {
        self.syntax_error(&err.to_string())
    }

    fn indentation_error(&self, message: &str) -> ParseError {
        ParseError::Indentation {
            line: self.cursor.absolute_line(),
            snippet: self.cursor.current().to_string(),
            message: message.to_string(),
        }
    }
}

fn merge_type_error(line: usize, snippet: &str, found: &YamlValue) -> ParseError {
    ParseError::MergeType {
        line,
        snippet: snippet.to_string(),
        found: found.type_name(),
    }
}

/// Keys of `top` win; keys only in `base` follow in their original order.
fn overlay(
    mut top: IndexMap<String, YamlValue>,
    base: IndexMap<String, YamlValue>,
) -> IndexMap<String, YamlValue> {
    for (key, value) in base {
        top.entry(key).or_insert(value);
    }
    top
}

fn strip_baseline(line: &str, baseline: usize) -> &str {
    if indentation_of(line) >= baseline {
        &line[baseline..]
    } else {
        ""
    }
}

fn is_empty_value(value: &str) -> bool {
    let value = value.trim_matches(' ');
    value.is_empty() || value.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::FlowParser;
    use pretty_assertions::assert_eq;

    fn embedded_block(text: &str, indentation: Option<usize>) -> Result<(String, Option<String>), ParseError> {
        let options = ParserOptions::default();
        let session = Session {
            options: &options,
            shapes: LineShapes::compile(&options).expect("patterns compile"),
            inline: &FlowParser,
        };
        let mut parser = BlockParser {
            session: &session,
            refs: RefTable::new(),
            cursor: LineCursor::new(text, 0),
            depth: 0,
            block: Block::Empty,
        };
        assert!(parser.cursor.advance());
        let block = parser.next_embedded_block(indentation)?;
        let next = parser
            .cursor
            .advance()
            .then(|| parser.cursor.current().to_string());
        Ok((block, next))
    }

    #[test]
    fn extracts_block_and_pushes_back_closing_line() {
        let (block, next) =
            embedded_block("a:\n  b: 1\n\n  c:\n    d: 2\ne: 3\n", None).expect("block");
        assert_eq!(block, "b: 1\n\nc:\n  d: 2");
        assert_eq!(next.as_deref(), Some("e: 3"));
    }

    #[test]
    fn leading_blank_lines_keep_line_positions() {
        let (block, _) = embedded_block("a:\n\n  # note\n  b: 1\n", None).expect("block");
        assert_eq!(block, "\n# note\nb: 1\n");
    }

    #[test]
    fn shallow_comments_become_empty_lines() {
        let (block, next) = embedded_block("a:\n  b: |\n# aside\n    text\nc: 1\n", None).expect("block");
        assert_eq!(block, "b: |\n\n  text");
        assert_eq!(next.as_deref(), Some("c: 1"));
    }

    #[test]
    fn unindented_block_is_an_error() {
        let err = embedded_block("-\nb: 1\n", None).expect_err("column 0 block");
        assert!(matches!(err, ParseError::Indentation { line: 2, .. }));
    }

    #[test]
    fn partial_dedent_is_an_error() {
        let err = embedded_block("a:\n    b: 1\n  c: 2\n", None).expect_err("dedent");
        assert!(matches!(err, ParseError::Indentation { line: 3, .. }));
    }

    #[test]
    fn explicit_indentation_keeps_deeper_lines() {
        let (block, _) = embedded_block("- a: 1\n  b:\n    c: 2\n", Some(2)).expect("block");
        assert_eq!(block, "b:\n  c: 2\n");
    }

    #[test]
    fn overlay_prefers_top_keys() {
        let mut top = IndexMap::new();
        top.insert("a".to_string(), YamlValue::Int(1));
        let mut base = IndexMap::new();
        base.insert("b".to_string(), YamlValue::Int(2));
        base.insert("a".to_string(), YamlValue::Int(3));

        let merged = overlay(top, base);
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(merged["a"], YamlValue::Int(1));
    }
}
