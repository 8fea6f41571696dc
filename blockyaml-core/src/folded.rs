use crate::lines::{indentation_of, is_blank, LineCursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarStyle {
    /// `|`: line breaks are kept.
    Literal,
    /// `>`: lines at the same indentation are joined with a space.
    Folded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Chomping {
    Clip,
    Strip,
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockScalarHeader {
    pub style: ScalarStyle,
    pub chomping: Chomping,
    pub indentation: Option<usize>,
}

impl ScalarStyle {
    fn separator(self) -> char {
        match self {
            ScalarStyle::Literal => '\n',
            ScalarStyle::Folded => ' ',
        }
    }
}

/// Consumes the lines of a block scalar that follows `header` and returns
/// its text. The first line that does not belong to the scalar is pushed
/// back onto the cursor.
pub(crate) fn read_block_scalar(cursor: &mut LineCursor<'_>, header: &BlockScalarHeader) -> String {
    let separator = header.style.separator();
    let mut text = String::new();

    let mut available = cursor.advance();
    while available && cursor.is_blank() {
        text.push('\n');
        available = cursor.advance();
    }
    if !available {
        return String::new();
    }

    let first = cursor.current();
    let text_indent = match header.indentation {
        Some(width) if indentation_of(first) >= width => width,
        Some(_) => {
            cursor.retreat();
            return String::new();
        }
        None => match indentation_of(first) {
            0 => {
                cursor.retreat();
                return String::new();
            }
            width => width,
        },
    };
    text.push_str(&first[text_indent..]);
    text.push(separator);

    let mut previous_indent = text_indent;
    while cursor.advance() {
        let line = cursor.current();
        let indent = indentation_of(line);
        if is_blank(line) {
            if header.style == ScalarStyle::Folded && text.ends_with(' ') {
                text.pop();
            }
            text.push_str(&line[line.len().min(text_indent)..]);
            text.push('\n');
        } else if indent >= text_indent {
            if header.style == ScalarStyle::Folded && indent != previous_indent {
                text.pop();
                text.push('\n');
            }
            previous_indent = indent;

            let extra = indent - text_indent;
            text.push_str(&line[text_indent..]);
            text.push(if extra > 0 { '\n' } else { separator });
        } else {
            cursor.retreat();
            break;
        }
    }

    if header.style == ScalarStyle::Folded {
        let body_len = text.trim_end_matches('\n').len();
        if text[..body_len].ends_with(' ') {
            text.replace_range(body_len - 1..body_len, "\n");
        }
    }

    match header.chomping {
        Chomping::Clip => {
            let body_len = text.trim_end_matches('\n').len();
            if body_len < text.len() {
                text.truncate(body_len + 1);
            }
        }
        Chomping::Strip => {
            let body_len = text.trim_end_matches('\n').len();
            text.truncate(body_len);
        }
        Chomping::Keep => {}
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn header(style: ScalarStyle, chomping: Chomping) -> BlockScalarHeader {
        BlockScalarHeader {
            style,
            chomping,
            indentation: None,
        }
    }

    /// Reads a scalar whose header sat on the first line of `text`.
    fn read(text: &str, header: BlockScalarHeader) -> (String, Option<String>) {
        let mut cursor = LineCursor::new(text, 0);
        assert!(cursor.advance());
        let value = read_block_scalar(&mut cursor, &header);
        let next = cursor.advance().then(|| cursor.current().to_string());
        (value, next)
    }

    #[test]
    fn literal_keeps_line_breaks() {
        let (value, next) = read(
            "text: |\n  line1\n  line2\nnext: 1\n",
            header(ScalarStyle::Literal, Chomping::Clip),
        );
        assert_eq!(value, "line1\nline2\n");
        assert_eq!(next.as_deref(), Some("next: 1"));
    }

    #[test]
    fn folded_joins_lines_with_spaces() {
        let (value, _) = read(
            "text: >\n  line1\n  line2\n",
            header(ScalarStyle::Folded, Chomping::Clip),
        );
        assert_eq!(value, "line1 line2\n");
    }

    #[test]
    fn folded_keeps_more_indented_lines() {
        let (value, _) = read(
            "t: >\n  a\n    b\n  c\n",
            header(ScalarStyle::Folded, Chomping::Clip),
        );
        assert_eq!(value, "a\n  b\nc\n");
    }

    #[test]
    fn folded_blank_line_breaks_paragraph() {
        let (value, _) = read(
            "t: >\n  one\n  two\n\n  three\n",
            header(ScalarStyle::Folded, Chomping::Clip),
        );
        assert_eq!(value, "one two\nthree\n");
    }

    #[test]
    fn chomping_indicators() {
        let text = "t: |\n  body\n\n\n";
        assert_eq!(read(text, header(ScalarStyle::Literal, Chomping::Clip)).0, "body\n");
        assert_eq!(read(text, header(ScalarStyle::Literal, Chomping::Strip)).0, "body");
        assert_eq!(
            read(text, header(ScalarStyle::Literal, Chomping::Keep)).0,
            "body\n\n\n\n"
        );
    }

    #[test]
    fn leading_blank_lines_become_newlines() {
        let (value, _) = read(
            "t: |+\n\n  body\n",
            header(ScalarStyle::Literal, Chomping::Keep),
        );
        assert_eq!(value, "\nbody\n\n");
    }

    #[test]
    fn unindented_first_line_is_an_empty_scalar() {
        let (value, next) = read(
            "t: |\nnext: 1\n",
            header(ScalarStyle::Literal, Chomping::Clip),
        );
        assert_eq!(value, "");
        assert_eq!(next.as_deref(), Some("next: 1"));
    }

    #[test]
    fn explicit_indentation_must_match() {
        let explicit = BlockScalarHeader {
            style: ScalarStyle::Literal,
            chomping: Chomping::Clip,
            indentation: Some(4),
        };
        let (value, next) = read("t: |4\n  short\n", explicit);
        assert_eq!(value, "");
        assert_eq!(next.as_deref(), Some("  short"));

        let explicit = BlockScalarHeader {
            indentation: Some(2),
            ..explicit
        };
        let (value, _) = read("t: |2\n    deep\n  flat\n", explicit);
        assert_eq!(value, "  deep\nflat\n");
    }

    #[test]
    fn end_of_input_gives_empty_scalar() {
        let (value, _) = read("t: >\n", header(ScalarStyle::Folded, Chomping::Keep));
        assert_eq!(value, "");
    }
}
