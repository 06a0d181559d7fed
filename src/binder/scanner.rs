use super::parsers::{is_block_comment_end, is_block_comment_start, is_line_comment_start};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
}

/// Walks SQL text and reports the offsets of bytes that are executable code, stepping over
/// quoted strings, quoted identifiers, line comments and (nested) block comments.
///
/// Dialect-specific quoting (backticks, dollar-quoted bodies, `E'...'` escapes) is not
/// recognized.
pub(crate) struct Scanner<'a> {
    bytes: &'a [u8],
    idx: usize,
    state: State,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(sql: &'a str) -> Self {
        Self {
            bytes: sql.as_bytes(),
            idx: 0,
            state: State::Normal,
        }
    }

    pub(crate) fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Resume scanning at `idx`; used after the caller consumed a multi-byte token.
    pub(crate) fn skip_to(&mut self, idx: usize) {
        self.idx = idx;
    }

    /// Offset of the next code byte, or `None` at end of input.
    pub(crate) fn next_code(&mut self) -> Option<usize> {
        let bytes = self.bytes;
        while self.idx < bytes.len() {
            let idx = self.idx;
            let b = bytes[idx];
            self.idx += 1;
            match self.state {
                State::Normal => match b {
                    b'\'' => self.state = State::SingleQuoted,
                    b'"' => self.state = State::DoubleQuoted,
                    _ if is_line_comment_start(bytes, idx) => {
                        self.state = State::LineComment;
                        self.idx += 1;
                    }
                    _ if is_block_comment_start(bytes, idx) => {
                        self.state = State::BlockComment(1);
                        self.idx += 1;
                    }
                    _ => return Some(idx),
                },
                State::SingleQuoted => {
                    if b == b'\'' {
                        if bytes.get(idx + 1) == Some(&b'\'') {
                            self.idx += 1; // skip escaped quote
                        } else {
                            self.state = State::Normal;
                        }
                    }
                }
                State::DoubleQuoted => {
                    if b == b'"' {
                        if bytes.get(idx + 1) == Some(&b'"') {
                            self.idx += 1; // skip escaped quote
                        } else {
                            self.state = State::Normal;
                        }
                    }
                }
                State::LineComment => {
                    if b == b'\n' {
                        self.state = State::Normal;
                    }
                }
                State::BlockComment(depth) => {
                    if is_block_comment_start(bytes, idx) {
                        self.state = State::BlockComment(depth + 1);
                        self.idx += 1;
                    } else if is_block_comment_end(bytes, idx) {
                        self.state = if depth == 1 {
                            State::Normal
                        } else {
                            State::BlockComment(depth - 1)
                        };
                        self.idx += 1;
                    }
                }
            }
        }
        None
    }
}
