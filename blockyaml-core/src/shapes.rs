use log::trace;
use regex::{Regex, RegexBuilder};

use crate::folded::{BlockScalarHeader, Chomping, ScalarStyle};
use crate::inline::QUOTED_STRING;
use crate::options::ParserOptions;

/// What a content line looks like, in precedence order: sequence item before
/// mapping entry before anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineShape<'l> {
    SequenceItem {
        value: Option<&'l str>,
        /// Exactly one space separates the dash from the value.
        single_space: bool,
    },
    MappingEntry {
        key: &'l str,
        value: Option<&'l str>,
    },
    Unmatched,
}

/// Compiled line-shape patterns, shared by every parser in one parse.
#[derive(Debug)]
pub(crate) struct LineShapes {
    sequence_item: Regex,
    mapping_entry: Regex,
    compact_entry: Regex,
    anchor: Regex,
    block_scalar: Regex,
}

impl LineShapes {
    pub(crate) fn compile(options: &ParserOptions) -> Result<Self, regex::Error> {
        let build = |pattern: &str| {
            RegexBuilder::new(pattern)
                .size_limit(options.pattern_size_limit)
                .build()
        };
        Ok(Self {
            sequence_item: build(r"^-(?:(?P<lead>\s+)(?P<value>.+?))?\s*$")?,
            mapping_entry: build(&format!(
                r#"^(?P<key>{QUOTED_STRING}|[^ '"\[{{].*?) *:(?:\s+(?P<value>.+?))?\s*$"#
            ))?,
            compact_entry: build(&format!(
                r#"^(?:{QUOTED_STRING}|[^ '"{{].*?) *:(?:\s+.+?)?\s*$"#
            ))?,
            anchor: build(r"^&(?P<name>[^ ]+) *(?P<value>.*)$")?,
            block_scalar: build(
                r"^(?P<style>[|>])(?P<modifiers>[+-]|\d+|[+-]\d+|\d+[+-])?(?: +#.*)?$",
            )?,
        })
    }

    pub(crate) fn classify<'l>(&self, line: &'l str) -> LineShape<'l> {
        let shape = if let Some(caps) = self.sequence_item.captures(line) {
            LineShape::SequenceItem {
                value: caps.name("value").map(|m| m.as_str()),
                single_space: caps.name("lead").is_some_and(|m| m.as_str() == " "),
            }
        } else if let Some(caps) = self.mapping_entry.captures(line) {
            match caps.name("key") {
                Some(key) => LineShape::MappingEntry {
                    key: key.as_str(),
                    value: caps.name("value").map(|m| m.as_str()),
                },
                None => LineShape::Unmatched,
            }
        } else {
            LineShape::Unmatched
        };
        trace!("classified {line:?} as {shape:?}");
        shape
    }

    /// Whether a sequence item's value opens a compact `key: value` mapping.
    pub(crate) fn is_compact_entry(&self, value: &str) -> bool {
        self.compact_entry.is_match(value)
    }

    /// Splits a leading `&name` off a value.
    pub(crate) fn split_anchor<'l>(&self, value: &'l str) -> Option<(&'l str, &'l str)> {
        let caps = self.anchor.captures(value)?;
        let name = caps.name("name")?.as_str();
        let rest = caps.name("value").map_or("", |m| m.as_str());
        Some((name, rest))
    }

    pub(crate) fn block_scalar_header(&self, value: &str) -> Option<BlockScalarHeader> {
        let caps = self.block_scalar.captures(value)?;
        let style = match caps.name("style")?.as_str() {
            "|" => ScalarStyle::Literal,
            _ => ScalarStyle::Folded,
        };
        let modifiers = caps.name("modifiers").map_or("", |m| m.as_str());
        let chomping = if modifiers.contains('+') {
            Chomping::Keep
        } else if modifiers.contains('-') {
            Chomping::Strip
        } else {
            Chomping::Clip
        };
        let indentation = modifiers
            .trim_matches(['+', '-'])
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0);
        Some(BlockScalarHeader {
            style,
            chomping,
            indentation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shapes() -> LineShapes {
        LineShapes::compile(&ParserOptions::default()).expect("patterns compile")
    }

    #[test]
    fn tiny_size_limit_fails_to_compile() {
        let options = ParserOptions::default().with_pattern_size_limit(1);
        assert!(LineShapes::compile(&options).is_err());
    }

    #[test]
    fn sequence_items_take_precedence() {
        let shapes = shapes();
        assert_eq!(
            shapes.classify("- key: value"),
            LineShape::SequenceItem {
                value: Some("key: value"),
                single_space: true
            }
        );
        assert_eq!(
            shapes.classify("-   spaced  "),
            LineShape::SequenceItem {
                value: Some("spaced"),
                single_space: false
            }
        );
        assert_eq!(
            shapes.classify("-"),
            LineShape::SequenceItem {
                value: None,
                single_space: false
            }
        );
    }

    #[test]
    fn dash_without_space_is_not_an_item() {
        let shapes = shapes();
        assert_eq!(
            shapes.classify("-1: x"),
            LineShape::MappingEntry {
                key: "-1",
                value: Some("x")
            }
        );
        assert_eq!(shapes.classify("---x"), LineShape::Unmatched);
    }

    #[test]
    fn mapping_keys_skip_quoted_colons() {
        let shapes = shapes();
        assert_eq!(
            shapes.classify(r#""a: b" : c"#),
            LineShape::MappingEntry {
                key: r#""a: b""#,
                value: Some("c")
            }
        );
        assert_eq!(
            shapes.classify("key:"),
            LineShape::MappingEntry {
                key: "key",
                value: None
            }
        );
        assert_eq!(shapes.classify("http://example.com"), LineShape::Unmatched);
        assert_eq!(shapes.classify("  indented: 1"), LineShape::Unmatched);
        assert_eq!(shapes.classify("{a: 1}"), LineShape::Unmatched);
    }

    #[test]
    fn compact_entries_exclude_flow_mappings() {
        let shapes = shapes();
        assert!(shapes.is_compact_entry("name: x"));
        assert!(shapes.is_compact_entry("'quoted key': x"));
        assert!(!shapes.is_compact_entry("{a: 1}"));
        assert!(!shapes.is_compact_entry("'just: text'"));
    }

    #[test]
    fn anchors_split_from_values() {
        let shapes = shapes();
        assert_eq!(shapes.split_anchor("&base foo"), Some(("base", "foo")));
        assert_eq!(shapes.split_anchor("&base"), Some(("base", "")));
        assert_eq!(shapes.split_anchor("base"), None);
    }

    #[test]
    fn block_scalar_headers() {
        let shapes = shapes();
        let header = shapes.block_scalar_header("|").expect("literal header");
        assert_eq!(header.style, ScalarStyle::Literal);
        assert_eq!(header.chomping, Chomping::Clip);
        assert_eq!(header.indentation, None);

        let header = shapes.block_scalar_header(">2- # note").expect("folded header");
        assert_eq!(header.style, ScalarStyle::Folded);
        assert_eq!(header.chomping, Chomping::Strip);
        assert_eq!(header.indentation, Some(2));

        assert_eq!(
            shapes.block_scalar_header("|+").map(|h| h.chomping),
            Some(Chomping::Keep)
        );
        assert!(shapes.block_scalar_header("| text").is_none());
        assert!(shapes.block_scalar_header("|+-").is_none());
    }
}
