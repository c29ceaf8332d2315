//! Content stream tokenizing, enough to find inline images.
//!
//! The operation parser stops at the binary data of an inline image and
//! silently drops the rest of the stream, so streams are cut around every
//! `BI ... ID ... EI` first and only the operator runs between them are parsed.

/// A piece of a content stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Ordinary operators, with the number of operator keywords counted in them.
    Operators { data: &'a [u8], operators: usize },
    /// A whole inline image, `BI` through `EI`, copied through unchanged.
    InlineImage(&'a [u8]),
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Keyword(&'a [u8]),
    /// Numbers, names, strings, array and dictionary brackets.
    Operand,
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' | b'\0')
}

fn is_delimiter(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn is_regular(b: u8) -> bool {
    !is_whitespace(b) && !is_delimiter(b)
}

struct Scanner<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    fn skip_while(&mut self, keep: impl Fn(u8) -> bool) {
        while self.peek(0).is_some_and(&keep) {
            self.pos += 1;
        }
    }

    fn skip_literal_string(&mut self) {
        let mut depth = 0usize;
        while let Some(b) = self.peek(0) {
            match b {
                b'\\' => {
                    self.pos += 2;
                    continue;
                }
                b'(' => depth += 1,
                b')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.pos += 1;
                        return;
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
        self.pos = self.data.len();
    }

    /// Next token and the offset it starts at.
    fn next_token(&mut self) -> Option<(usize, Token<'a>)> {
        loop {
            self.skip_while(is_whitespace);
            if self.peek(0)? == b'%' {
                self.skip_while(|b| b != b'\r' && b != b'\n');
                continue;
            }
            break;
        }

        let start = self.pos;
        match self.peek(0)? {
            b'(' => self.skip_literal_string(),
            b'<' if self.peek(1) == Some(b'<') => self.pos += 2,
            b'<' => {
                self.skip_while(|b| b != b'>');
                self.pos = (self.pos + 1).min(self.data.len());
            }
            b'>' if self.peek(1) == Some(b'>') => self.pos += 2,
            b'/' => {
                self.pos += 1;
                self.skip_while(is_regular);
            }
            b if is_delimiter(b) => self.pos += 1,
            _ => {
                self.skip_while(is_regular);
                let word = &self.data[start..self.pos];
                let operand = matches!(word[0], b'0'..=b'9' | b'+' | b'-' | b'.')
                    || matches!(word, b"true" | b"false" | b"null");
                if !operand {
                    return Some((start, Token::Keyword(word)));
                }
            }
        }
        Some((start, Token::Operand))
    }

    /// Skips an inline image whose `BI` was just read; returns the offset after its `EI`.
    fn skip_inline_image(&mut self) -> usize {
        loop {
            match self.next_token() {
                Some((_, Token::Keyword(word))) if word == b"ID" => break,
                Some(_) => {}
                None => return self.data.len(),
            }
        }

        // one whitespace byte separates ID from the data
        if self.peek(0).is_some_and(is_whitespace) {
            self.pos += 1;
        }
        let data_start = self.pos;
        let end = (data_start..self.data.len().saturating_sub(1)).find(|&i| {
            let preceded = i > 0 && is_whitespace(self.data[i - 1]);
            let followed = self.data.get(i + 2).map_or(true, |b| is_whitespace(*b) || is_delimiter(*b));
            preceded && followed && &self.data[i..i + 2] == b"EI"
        });

        self.pos = end.map_or(self.data.len(), |i| i + 2);
        self.pos
    }
}

fn push_run<'a>(segments: &mut Vec<Segment<'a>>, run: &'a [u8], operators: usize) {
    if run.iter().any(|b| !is_whitespace(*b)) {
        segments.push(Segment::Operators { data: run, operators });
    }
}

/// Cuts a content stream into operator runs and inline images, in order.
pub fn split_inline_images(data: &[u8]) -> Vec<Segment<'_>> {
    let mut scanner = Scanner::new(data);
    let mut segments = Vec::new();
    let mut run_start = 0;
    let mut operators = 0;

    while let Some((start, token)) = scanner.next_token() {
        match token {
            Token::Keyword(word) if word == b"BI" => {
                let end = scanner.skip_inline_image();
                push_run(&mut segments, &data[run_start..start], operators);
                segments.push(Segment::InlineImage(&data[start..end]));
                run_start = end;
                operators = 0;
            }
            Token::Keyword(_) => operators += 1,
            Token::Operand => {}
        }
    }
    push_run(&mut segments, &data[run_start..], operators);
    segments
}
