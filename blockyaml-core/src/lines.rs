/// Normalized document text plus the number of lines stripped from its head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Prepared {
    pub text: String,
    pub offset: usize,
}

/// Normalizes line endings and strips the version header, the leading comment
/// block and the document markers. Never fails: anything that does not match
/// is left in place for the block parser to reject.
pub(crate) fn preprocess(input: &str) -> Prepared {
    let mut text = input.replace("\r\n", "\n").replace('\r', "\n");
    if !text.ends_with('\n') {
        text.push('\n');
    }
    let mut offset = 0;

    if is_version_header(first_line(&text)) {
        text = drop_lines(&text, 1);
        offset += 1;
    }

    let comments = text
        .split_inclusive('\n')
        .take_while(|line| line.starts_with('#'))
        .count();
    if comments > 0 {
        text = drop_lines(&text, comments);
        offset += comments;
    }

    if first_line(&text).starts_with("---") {
        text = drop_lines(&text, 1);
        offset += 1;
        strip_document_end(&mut text);
    }

    Prepared { text, offset }
}

fn first_line(text: &str) -> &str {
    text.split('\n').next().unwrap_or("")
}

fn drop_lines(text: &str, count: usize) -> String {
    text.split_inclusive('\n').skip(count).collect()
}

fn is_version_header(line: &str) -> bool {
    let Some(rest) = line.strip_prefix("%YAML") else {
        return false;
    };
    let mut chars = rest.chars();
    matches!(chars.next(), Some(':' | ' '))
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
}

fn strip_document_end(text: &mut String) {
    let body = text.trim_end();
    if let Some(before) = body.strip_suffix("...") {
        if before.is_empty() || before.ends_with('\n') {
            let keep = before.len();
            text.truncate(keep);
        }
    }
}

/// Forward cursor over the lines of one parser instance, with a single step
/// of rollback.
#[derive(Debug)]
pub(crate) struct LineCursor<'t> {
    lines: Vec<&'t str>,
    index: Option<usize>,
    offset: usize,
}

impl<'t> LineCursor<'t> {
    pub(crate) fn new(text: &'t str, offset: usize) -> Self {
        Self {
            lines: text.split('\n').collect(),
            index: None,
            offset,
        }
    }

    pub(crate) fn advance(&mut self) -> bool {
        let next = self.index.map_or(0, |idx| idx + 1);
        if next >= self.lines.len() {
            return false;
        }
        self.index = Some(next);
        true
    }

    /// Un-consumes the current line.
    pub(crate) fn retreat(&mut self) {
        self.index = match self.index {
            Some(0) | None => None,
            Some(idx) => Some(idx - 1),
        };
    }

    pub(crate) fn current(&self) -> &'t str {
        self.index.map_or("", |idx| self.lines[idx])
    }

    /// Index of the current line, 0 before the first advance.
    pub(crate) fn position(&self) -> usize {
        self.index.unwrap_or(0)
    }

    pub(crate) fn line(&self, idx: usize) -> Option<&'t str> {
        self.lines.get(idx).copied()
    }

    pub(crate) fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// 1-based line number of the current line in the top-level document.
    pub(crate) fn absolute_line(&self) -> usize {
        self.offset + self.position() + 1
    }

    pub(crate) fn indentation(&self) -> usize {
        indentation_of(self.current())
    }

    pub(crate) fn is_blank(&self) -> bool {
        is_blank(self.current())
    }

    pub(crate) fn is_comment(&self) -> bool {
        self.current().trim_start_matches(' ').starts_with('#')
    }

    /// Blank or comment-only.
    pub(crate) fn is_empty(&self) -> bool {
        self.is_blank() || self.is_comment()
    }
}

pub(crate) fn indentation_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

pub(crate) fn is_blank(line: &str) -> bool {
    line.trim_matches(' ').is_empty()
}
